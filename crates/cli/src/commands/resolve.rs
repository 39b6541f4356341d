//! `koshimart resolve <path> [--signed-in]`

use std::io::Write;

use koshimart_core::Session;
use koshimart_storefront::router::{Authorization, authorize_match, resolve};
use koshimart_storefront::state::AppState;

/// Resolve `path`, run the guard against a guest (or a placeholder session)
/// and describe the result.
pub fn print(out: &mut impl Write, path: &str, signed_in: bool) -> std::io::Result<()> {
    let state = AppState::new();
    if signed_in {
        state.set_session(Session::new("cli", None));
    }

    let route = resolve(path);
    writeln!(out, "view:    {}", route.view)?;
    writeln!(out, "pattern: {}", route.pattern)?;
    for (name, value) in route.params.iter() {
        writeln!(out, "param:   {name} = {value}")?;
    }
    match authorize_match(&route, &state) {
        Authorization::Allow => writeln!(out, "guard:   allow"),
        Authorization::Redirect(target) => writeln!(out, "guard:   redirect {target}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn run(path: &str, signed_in: bool) -> String {
        let mut out = Vec::new();
        print(&mut out, path, signed_in).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_guest_on_guarded_path() {
        let text = run("/orders", false);
        assert!(text.contains("view:    Orders"));
        assert!(text.contains("guard:   redirect /login"));
    }

    #[test]
    fn test_signed_in_with_params() {
        let text = run("/invoice/k7d2x9", true);
        assert!(text.contains("view:    Invoice"));
        assert!(text.contains("param:   oid = k7d2x9"));
        assert!(text.contains("guard:   allow"));
    }

    #[test]
    fn test_unknown_path() {
        let text = run("/debug", false);
        assert!(text.contains("view:    NotFound"));
        assert!(text.contains("pattern: *"));
    }
}
