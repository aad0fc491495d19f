//! Diagnostic logging to stderr.
//!
//! Messages rendered for the user go to stdout; everything logged through
//! `tracing` goes to stderr so output can be piped.

use tracing_subscriber::EnvFilter;

/// Map `-v` occurrences and `--quiet` to a default filter directive
pub fn level_for(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialise the global subscriber
///
/// `RUST_LOG` takes precedence over the level derived from the flags. A
/// subscriber that is already installed is left in place.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity, quiet)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
