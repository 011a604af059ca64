//! agent-pipe-proxy: the Windows-side companion.
//!
//! Spawned by agent-pipe-bridge once per forwarded connection. The bridge
//! wires the accepted socket to this process's stdin/stdout; all this
//! program does is dial the agent's named pipe and run the same byte
//! bridge between its stdio and the pipe. Diagnostics go to stderr, which
//! the bridge inherits into its own diagnostic stream.

#[cfg(windows)]
fn main() {
    std::process::exit(proxy_main::run());
}

#[cfg(not(windows))]
fn main() {
    eprintln!("agent-pipe-proxy runs on the Windows side of the bridge");
    std::process::exit(1);
}

#[cfg(windows)]
mod proxy_main {
    use agent_pipe_bridge::relay::bridge;
    use agent_pipe_bridge::remote::pipe::NamedPipeChannel;
    use agent_pipe_bridge::remote::Merged;
    use agent_pipe_bridge::trace;
    use anyhow::{Context, Result};
    use clap::Parser;
    use tracing::{debug, error, warn};

    /// Forward stdio to the Windows agent named pipe.
    #[derive(Parser, Debug)]
    #[command(name = "agent-pipe-proxy")]
    #[command(author, version, about, long_about = None)]
    struct ProxyCli {
        /// Named pipe the agent listens on.
        #[arg(
            long = "pipe",
            value_name = "NAME",
            default_value = "\\\\.\\pipe\\openssh-ssh-agent"
        )]
        pipe: String,

        /// Increase log verbosity on standard error.
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbose: u8,
    }

    pub fn run() -> i32 {
        let cli = ProxyCli::parse();
        if let Err(e) = trace::init(cli.verbose) {
            eprintln!("Error: failed to initialize tracing subscriber: {e}");
            return 1;
        }

        let runtime = match tokio::runtime::Runtime::new() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Could not start async runtime: {e}");
                return 1;
            }
        };

        match runtime.block_on(proxy(&cli.pipe)) {
            Ok(()) => 0,
            Err(e) => {
                error!("Error: {e:#}");
                1
            }
        }
    }

    async fn proxy(pipe_name: &str) -> Result<()> {
        let channel = NamedPipeChannel::dial(pipe_name)
            .with_context(|| format!("Could not open agent pipe {pipe_name}"))?;
        debug!("Agent pipe established");

        let stdio = Merged::new(tokio::io::stdin(), tokio::io::stdout());
        let outcome = bridge(stdio, Box::new(channel)).await;
        if let Some(e) = &outcome.outbound_error {
            warn!("Could not write to agent pipe: {e}");
        }
        if let Some(e) = &outcome.inbound_error {
            warn!("Error reading from agent pipe: {e}");
        }
        debug!("Agent pipe proxy terminated");
        Ok(())
    }
}
