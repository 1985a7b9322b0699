//! Log initialization
//!
//! Output goes to stderr so bundles written to stdout stay clean. `-v` flags take
//! precedence over `METABUNDLE_LOG`; without either only warnings are shown.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a log filter directive
pub const LOG_ENV: &str = "METABUNDLE_LOG";

/// Filter directive for a `-v` count
pub fn verbosity_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter(verbose: u8) -> EnvFilter {
    if verbose > 0 {
        return EnvFilter::new(verbosity_directive(verbose));
    }
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(verbosity_directive(0)))
}

/// Install the global subscriber
pub fn init(verbose: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(filter(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
