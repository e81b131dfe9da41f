//! Diagnostics logging for the command line tools.
//!
//! Logs go to stderr so they never mix with report lines on stdout.
//! `RUST_LOG` wins over the verbosity flags when it is set.

use tracing_subscriber::EnvFilter;

use crate::cli::VerbosityLevel;

/// Default filter directive for a verbosity level
pub fn default_directive(verbosity: VerbosityLevel) -> &'static str {
    match verbosity {
        VerbosityLevel::Quiet => "error",
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "info",
        VerbosityLevel::Debug => "debug",
    }
}

/// Install the global subscriber. Calling it again is harmless.
pub fn init(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
