//! Diagnostic output setup shared by both binaries.
//!
//! Diagnostics go to stderr so forwarded traffic and shell integration
//! never see them; at default verbosity only warnings and errors appear
//! and a successful run prints nothing.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the stderr tracing subscriber, filtered by the `-v` count.
///
/// # Verbosity Levels
/// - 0 (default): only warnings and errors, overridable via `RUST_LOG`
/// - 1 (-v): info level
/// - 2 (-vv): debug level
/// - 3+ (-vvv): trace level
pub fn init(verbose: u8) -> Result<(), TryInitError> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_rejected() {
        // Whoever wins the race installs the global subscriber; a second
        // installation must report failure instead of panicking.
        let _ = init(0);
        assert!(init(0).is_err());
    }
}
