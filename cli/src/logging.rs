//! Diagnostic logging setup.
//!
//! Events go to stderr. The filter comes from `FERRY_LOG`, then `RUST_LOG`,
//! and defaults to `warn` (`debug` with `--verbose`).

use console::Term;
use tracing_subscriber::EnvFilter;

/// Primary filter variable.
pub const LOG_ENV: &str = "FERRY_LOG";

/// Filter used when no variable is set.
#[must_use]
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Whether events may carry ANSI colors: stderr is a terminal and neither
/// `--no-color` nor `NO_COLOR` is set.
#[must_use]
pub fn use_ansi(no_color: bool) -> bool {
    !no_color && Term::stderr().is_term() && std::env::var_os("NO_COLOR").is_none()
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(verbose: bool, ansi: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_ansi(ansi)
        .with_target(false)
        .try_init();
}
