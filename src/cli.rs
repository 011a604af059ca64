//! Command-line interface definitions.
//!
//! Uses clap's derive API for type-safe argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Present a Unix-socket SSH agent endpoint backed by a Windows named-pipe agent.
///
/// agent-pipe-bridge listens on a Unix domain socket and forwards every
/// connection to the Windows OpenSSH agent pipe via a small companion
/// executable that runs on the Windows side.
#[derive(Parser, Debug)]
#[command(name = "agent-pipe-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Unix socket to listen on for agent clients.
    ///
    /// Defaults to the value of SSH_AUTH_SOCK when set, so the bridge can
    /// take over the conventional agent endpoint without extra flags.
    #[arg(
        long = "socket",
        value_name = "PATH",
        env = "SSH_AUTH_SOCK",
        default_value = "/run/ssh-agent.sock"
    )]
    pub socket: PathBuf,

    /// Named pipe the Windows agent listens on.
    #[arg(
        long = "pipe",
        value_name = "NAME",
        default_value = "\\\\.\\pipe\\openssh-ssh-agent"
    )]
    pub pipe: String,

    /// Read the companion executable from a file instead of the embedded copy.
    ///
    /// Required when the binary was built without the `embedded-companion`
    /// feature.
    #[arg(long = "proxy-exe", value_name = "PATH")]
    pub proxy_exe: Option<PathBuf>,

    /// Forward to a Unix socket directly instead of spawning the companion.
    ///
    /// Useful when the agent is reachable on the same machine; no companion
    /// executable is extracted in this mode and --pipe is ignored.
    #[arg(long = "remote-socket", value_name = "PATH", conflicts_with = "proxy_exe")]
    pub remote_socket: Option<PathBuf>,

    /// Increase log verbosity.
    ///
    /// Can be specified multiple times:
    /// -v    = info level
    /// -vv   = debug level
    /// -vvv  = trace level
    ///
    /// Without it the bridge is silent on success and only the exit code
    /// communicates failure.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        // Explicit socket so the ambient SSH_AUTH_SOCK cannot leak in.
        let cli = Cli::parse_from(["agent-pipe-bridge", "--socket", "/tmp/agent.sock"]);
        assert_eq!(cli.socket, PathBuf::from("/tmp/agent.sock"));
        assert_eq!(cli.pipe, "\\\\.\\pipe\\openssh-ssh-agent");
        assert!(cli.proxy_exe.is_none());
        assert!(cli.remote_socket.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_all_flags() {
        let cli = Cli::parse_from([
            "agent-pipe-bridge",
            "--socket",
            "/tmp/a.sock",
            "--pipe",
            "\\\\.\\pipe\\custom-agent",
            "--proxy-exe",
            "/opt/proxy.exe",
            "-vv",
        ]);
        assert_eq!(cli.socket, PathBuf::from("/tmp/a.sock"));
        assert_eq!(cli.pipe, "\\\\.\\pipe\\custom-agent");
        assert_eq!(cli.proxy_exe, Some(PathBuf::from("/opt/proxy.exe")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_remote_socket_conflicts_with_proxy_exe() {
        let result = Cli::try_parse_from([
            "agent-pipe-bridge",
            "--remote-socket",
            "/tmp/other.sock",
            "--proxy-exe",
            "/opt/proxy.exe",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_remote_socket() {
        let cli = Cli::parse_from(["agent-pipe-bridge", "--remote-socket", "/tmp/other.sock"]);
        assert_eq!(cli.remote_socket, Some(PathBuf::from("/tmp/other.sock")));
    }
}
