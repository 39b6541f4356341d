//! `koshimart routes`

use std::io::Write;

use koshimart_storefront::router::ROUTES;

/// Write one line per route: pattern, view, and `guarded` for routes that
/// need a session.
pub fn print(out: &mut impl Write) -> std::io::Result<()> {
    let width = ROUTES.iter().map(|r| r.pattern.len()).max().unwrap_or(0);
    for route in ROUTES {
        let guard = if route.guarded { "guarded" } else { "" };
        writeln!(out, "{:<width$}  {:<24}{guard}", route.pattern, route.view.name())?;
    }
    Ok(())
}
