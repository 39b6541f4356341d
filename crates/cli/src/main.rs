//! Koshimart CLI - inspect the route table and browse the storefront.
//!
//! # Usage
//!
//! ```bash
//! # List every route and whether it needs a session
//! koshimart routes
//!
//! # Show what a path resolves to and what the guard decides
//! koshimart resolve /admin/coupons
//! koshimart resolve /orders --signed-in
//!
//! # Interactive session against the configured backend
//! koshimart browse
//! ```
//!
//! # Commands
//!
//! - `routes` - Print the route table
//! - `resolve` - Resolve a path and run the guard
//! - `browse` - Read navigation commands from stdin (`go`, `login`, `logout`,
//!   `add`, `session`, `cart`, `quit`); the process is one browser tab

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use koshimart_storefront::config::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "koshimart")]
#[command(author, version, about = "Koshimart storefront client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the route table
    Routes,
    /// Resolve a path and show the guard decision
    Resolve {
        /// Path to resolve, e.g. `/detail/rice-cooker`
        path: String,

        /// Evaluate the guard as a signed-in user
        #[arg(long)]
        signed_in: bool,
    },
    /// Browse interactively, reading commands from stdin
    Browse {
        /// Shipping country sent with cart lines
        #[arg(long, default_value = "Japan")]
        country: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "koshimart_storefront=info,koshimart_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Routes => commands::routes::print(&mut std::io::stdout().lock())?,
        Commands::Resolve { path, signed_in } => {
            commands::resolve::print(&mut std::io::stdout().lock(), &path, signed_in)?;
        }
        Commands::Browse { country } => commands::browse::run(config, &country).await?,
    }
    Ok(())
}
