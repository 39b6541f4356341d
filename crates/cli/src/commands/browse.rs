//! `koshimart browse`
//!
//! One process is one browser tab: the session and cart live as long as the
//! command runs. Commands are read line by line from stdin:
//!
//! ```text
//! go <path>                 navigate (follows guard redirects)
//! login <email> <password>  sign in
//! logout                    sign out and start a new cart
//! add <slug> [qty]          put a product in the cart
//! session                   show the current session
//! cart                      show the cart id and badge
//! quit                      exit
//! ```

use std::io::Write;
use std::str::FromStr;

use koshimart_storefront::config::StorefrontConfig;
use koshimart_storefront::views::actions::{self, LineOptions};
use koshimart_storefront::{App, NavigationOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::CliError;

/// One line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Go(String),
    Login { email: String, password: String },
    Logout,
    Add { slug: String, qty: u32 },
    Session,
    Cart,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        match (command, args.as_slice()) {
            ("go", [path]) => Ok(Self::Go((*path).to_string())),
            ("login", [email, password]) => Ok(Self::Login {
                email: (*email).to_string(),
                password: (*password).to_string(),
            }),
            ("logout", []) => Ok(Self::Logout),
            ("add", [slug]) => Ok(Self::Add {
                slug: (*slug).to_string(),
                qty: 1,
            }),
            ("add", [slug, qty]) => {
                let qty = qty
                    .parse()
                    .map_err(|_| format!("quantity must be a number, got '{qty}'"))?;
                Ok(Self::Add {
                    slug: (*slug).to_string(),
                    qty,
                })
            }
            ("session", []) => Ok(Self::Session),
            ("cart", []) => Ok(Self::Cart),
            ("quit" | "exit", []) => Ok(Self::Quit),
            _ => Err(format!("unknown command: {line}")),
        }
    }
}

/// Run the interactive loop until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if the app cannot be built or stdin/stdout fail.
pub async fn run(config: &StorefrontConfig, country: &str) -> Result<(), CliError> {
    let app = App::new(config)?;
    tracing::info!(api = %app.api().base_url(), "Browsing");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = std::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => execute(&app, command, country, &mut out).await?,
            Err(message) => writeln!(out, "{message}")?,
        }
    }
    Ok(())
}

/// Carry out one command and describe the result.
pub async fn execute(
    app: &App,
    command: Command,
    country: &str,
    out: &mut impl Write,
) -> Result<(), CliError> {
    match command {
        Command::Go(path) => {
            match app.visit(&path).await {
                NavigationOutcome::Rendered(view) => writeln!(out, "rendered {view}")?,
                NavigationOutcome::Redirected(target) => {
                    writeln!(out, "too many redirects, stopped at {target}")?;
                }
                NavigationOutcome::Superseded => writeln!(out, "superseded")?,
            }
            writeln!(out, "{}", serde_json::to_string_pretty(&app.snapshot().await)?)?;
        }
        Command::Login { email, password } => {
            match actions::login(app.api(), app.state(), &email, &password).await {
                Ok(session) => match session.user_id() {
                    Some(user_id) => writeln!(out, "signed in as user {user_id}")?,
                    None => writeln!(out, "signed in")?,
                },
                Err(e) => writeln!(out, "login failed: {e}")?,
            }
        }
        Command::Logout => {
            actions::logout(app.state());
            writeln!(out, "signed out")?;
        }
        Command::Add { slug, qty } => {
            let Some(product) = app.api().safely_fetch_product(Some(&slug)).await else {
                writeln!(out, "no product '{slug}'")?;
                return Ok(());
            };
            let options = LineOptions {
                qty,
                country: country.to_string(),
                ..LineOptions::default()
            };
            match actions::add_to_cart(app.api(), app.state(), &product, options).await {
                Ok(count) => writeln!(out, "added {}; cart has {} line(s)", product.title, count.get())?,
                Err(e) => writeln!(out, "could not add {slug}: {e}")?,
            }
        }
        Command::Session => match app.state().session() {
            Some(session) => {
                let user = session.user_id().map_or_else(|| "-".to_string(), |id| id.to_string());
                let vendor = session.vendor_id().map_or_else(|| "-".to_string(), |id| id.to_string());
                writeln!(
                    out,
                    "user {user}, vendor {vendor}, email {}",
                    session.email().unwrap_or("-")
                )?;
            }
            None => writeln!(out, "guest")?,
        },
        Command::Cart => {
            let label = app.badge().label();
            writeln!(
                out,
                "cart {} ({})",
                app.state().cart_id(),
                if label.is_empty() { "empty" } else { &label }
            )?;
        }
        Command::Quit => {}
    }
    Ok(())
}
