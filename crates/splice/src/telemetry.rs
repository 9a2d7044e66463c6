//! Logging setup.

use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "SPLICE_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Returns the filter directive to install.
///
/// `--verbose` wins over the environment; an unset or blank variable means
/// warnings only.
pub fn filter_directive(verbose: bool, env: Option<&str>) -> String {
    if verbose {
        return "debug".to_string();
    }
    match env.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Installs the global subscriber, writing to stderr.
///
/// An invalid filter falls back to the default. Installing twice is a no-op.
pub fn init(verbose: bool) {
    let env = std::env::var(LOG_ENV).ok();
    let directive = filter_directive(verbose, env.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
