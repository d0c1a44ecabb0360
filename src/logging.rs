//! Logging configuration for td-glance.
//!
//! Logs go to stderr so query output on stdout stays machine-readable.

use tracing_subscriber::EnvFilter;

/// Returns the default filter directive for the given verbosity.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "td_glance=debug,info"
    } else {
        "info"
    }
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` overrides the default level; `verbose` raises this crate to debug.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose))),
        )
        .with_writer(std::io::stderr)
        .init();
}
