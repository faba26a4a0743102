//! Tracing setup for the CLI.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable that overrides the log filter.
pub const LOG_ENV: &str = "PDFPRESS_LOG";

/// Filter used when [`LOG_ENV`] is unset.
pub fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    match (verbose, quiet) {
        (true, _) => "info",
        (_, true) => "error",
        _ => "warn",
    }
}

/// Install the global subscriber. Logs go to stderr so JSON reports on
/// stdout stay parseable.
pub fn init_tracing(verbose: bool, quiet: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}
