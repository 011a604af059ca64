//! Runtime configuration.
//!
//! The configuration is built once at startup from the parsed CLI and then
//! passed by reference into each component. No component reads ambient
//! global state; verbosity in particular is carried here rather than in a
//! process-wide flag.

use crate::cli::Cli;
use std::path::PathBuf;

/// Immutable runtime configuration for the bridge.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unix socket path to listen on.
    pub socket_path: PathBuf,
    /// Named pipe the Windows agent listens on.
    pub pipe_name: String,
    /// Optional Unix socket to forward to instead of spawning the companion.
    pub remote_socket: Option<PathBuf>,
    /// Verbosity level (0 = silent on success).
    pub verbose: u8,
}

impl Config {
    /// Build the configuration from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            socket_path: cli.socket.clone(),
            pipe_name: cli.pipe.clone(),
            remote_socket: cli.remote_socket.clone(),
            verbose: cli.verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_config_from_cli() {
        let cli = Cli::parse_from([
            "agent-pipe-bridge",
            "--socket",
            "/tmp/agent.sock",
            "--pipe",
            "\\\\.\\pipe\\custom",
            "-v",
        ]);
        let config = Config::from_cli(&cli);
        assert_eq!(config.socket_path, PathBuf::from("/tmp/agent.sock"));
        assert_eq!(config.pipe_name, "\\\\.\\pipe\\custom");
        assert!(config.remote_socket.is_none());
        assert_eq!(config.verbose, 1);
    }
}
