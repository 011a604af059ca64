//! agent-pipe-bridge: Unix-socket listener for a Windows named-pipe agent.
//!
//! This is the WSL/Linux-side entry point. It parses the CLI, sources the
//! companion executable payload, and runs the forwarding listener until a
//! fatal error occurs.
//!
//! # I/O Architecture
//!
//! Forwarded agent traffic never touches this process's stdio. All
//! diagnostics go to stderr through tracing and are filtered to warnings
//! by default, so at default verbosity the bridge is silent on success
//! and the exit code is the only failure signal.

#[cfg(unix)]
fn main() {
    std::process::exit(bridge_main::run());
}

#[cfg(not(unix))]
fn main() {
    eprintln!("agent-pipe-bridge listens on a Unix socket; run it inside WSL or another Unix personality");
    std::process::exit(1);
}

#[cfg(unix)]
mod bridge_main {
    use agent_pipe_bridge::{
        cli::Cli,
        config::Config,
        payload,
        relay::{self, RemoteTarget},
        trace,
    };
    use anyhow::{Context, Result};
    use clap::Parser;
    use tracing::{debug, error};

    pub fn run() -> i32 {
        let cli = Cli::parse();
        if let Err(e) = trace::init(cli.verbose) {
            eprintln!("Error: failed to initialize tracing subscriber: {e}");
            return 1;
        }

        debug!("Parsed CLI arguments: {cli:?}");
        let config = Config::from_cli(&cli);

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Could not start async runtime: {e}");
                return 1;
            }
        };

        match runtime.block_on(serve(&cli, &config)) {
            Ok(()) => 0,
            Err(e) => {
                error!("Error: {e:#}");
                1
            }
        }
    }

    /// Pick the remote target and run the listener. Only returns on a
    /// fatal error ([`relay::run`] loops forever in steady state).
    async fn serve(cli: &Cli, config: &Config) -> Result<()> {
        let target = match &config.remote_socket {
            Some(path) => RemoteTarget::Socket { path: path.clone() },
            None => RemoteTarget::Companion {
                payload: companion_payload(cli)?,
            },
        };

        relay::run(config, target).await?;
        Ok(())
    }

    /// Source the companion executable bytes from --proxy-exe or the
    /// embedded copy.
    fn companion_payload(cli: &Cli) -> Result<Vec<u8>> {
        match &cli.proxy_exe {
            Some(path) => std::fs::read(path)
                .with_context(|| format!("Could not read companion executable {}", path.display())),
            None => payload::embedded().map(<[u8]>::to_vec).context(
                "no companion executable built in; pass --proxy-exe PATH or --remote-socket PATH",
            ),
        }
    }
}
