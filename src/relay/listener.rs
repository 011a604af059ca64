//! The forwarding listener and its per-connection units.
//!
//! Startup order matters: first the endpoint guard decides whether the
//! socket path is free (a live owner is a fatal conflict, a stale file is
//! removed), then the companion artifact is extracted once, then the
//! listener binds and accepts forever. Every accepted connection gets its
//! own task that dials the remote through the injected opener and runs
//! the bridge; nothing one connection does can stop the accept loop.
//! Accept failure is fatal, and the artifact is released before the
//! fatal error propagates.

use super::bridge::{bridge, BridgeState};
use super::error::{RelayError, RelayResult};
use crate::companion::CompanionArtifact;
use crate::config::Config;
use crate::endpoint;
use crate::remote::process::CompanionOpener;
use crate::remote::socket::SocketOpener;
use crate::remote::RemoteOpener;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

/// How the remote agent endpoint is reached.
#[derive(Debug)]
pub enum RemoteTarget {
    /// Extract the payload and spawn it per connection (named-pipe side).
    Companion {
        /// The companion executable's bytes.
        payload: Vec<u8>,
    },
    /// Dial a Unix socket in-process; no companion involved.
    Socket {
        /// The socket path to dial.
        path: PathBuf,
    },
}

/// Run the forwarding listener until a fatal error occurs.
///
/// Blocks (asynchronously) forever in steady state; returning is always a
/// failure. The companion artifact, when one is extracted, is removed on
/// every exit path.
pub async fn run(config: &Config, target: RemoteTarget) -> RelayResult<()> {
    endpoint::ensure_available(&config.socket_path)?;

    let (opener, mut artifact) = build_opener(config, target)?;

    let listener = match UnixListener::bind(&config.socket_path) {
        Ok(listener) => listener,
        Err(source) => {
            release(&mut artifact);
            return Err(RelayError::Bind {
                path: config.socket_path.clone(),
                source,
            });
        }
    };
    info!("Listening on {}", config.socket_path.display());

    let result = accept_loop(&listener, &config.socket_path, opener).await;
    release(&mut artifact);
    result
}

/// Build the per-connection opener, extracting the companion artifact
/// when the target requires one.
fn build_opener(
    config: &Config,
    target: RemoteTarget,
) -> RelayResult<(Arc<dyn RemoteOpener>, Option<CompanionArtifact>)> {
    match target {
        RemoteTarget::Companion { payload } => {
            let artifact = CompanionArtifact::extract(&payload)?;
            info!("Will use companion at {}", artifact.path().display());
            let opener: Arc<dyn RemoteOpener> = Arc::new(CompanionOpener::new(
                artifact.path().to_path_buf(),
                config.pipe_name.clone(),
                config.verbose > 0,
            ));
            Ok((opener, Some(artifact)))
        }
        RemoteTarget::Socket { path } => {
            info!("Will forward to socket {}", path.display());
            let opener: Arc<dyn RemoteOpener> = Arc::new(SocketOpener::new(path));
            Ok((opener, None))
        }
    }
}

fn release(artifact: &mut Option<CompanionArtifact>) {
    if let Some(artifact) = artifact.as_mut() {
        artifact.release();
    }
}

/// Accept connections forever, spawning one forwarding unit per
/// connection. Only accept failures end the loop.
async fn accept_loop(
    listener: &UnixListener,
    socket_path: &std::path::Path,
    opener: Arc<dyn RemoteOpener>,
) -> RelayResult<()> {
    loop {
        let (connection, _addr) = listener.accept().await.map_err(|source| RelayError::Accept {
            path: socket_path.to_path_buf(),
            source,
        })?;
        debug!("Accepted agent connection");

        let opener = Arc::clone(&opener);
        tokio::spawn(async move {
            forward_connection(connection, opener).await;
        });
    }
}

/// One forwarding unit: dial the remote, bridge bytes both ways, log the
/// outcome. Failures stay here; the listener never sees them.
async fn forward_connection(connection: UnixStream, opener: Arc<dyn RemoteOpener>) {
    debug!(state = ?BridgeState::Connecting, "dialing remote endpoint");
    let remote = match opener.open().await {
        Ok(remote) => remote,
        Err(e) => {
            warn!("Could not reach remote endpoint: {e}");
            return;
        }
    };
    debug!(state = ?BridgeState::Established, "remote channel established");

    let outcome = bridge(connection, remote).await;
    if let Some(e) = &outcome.outbound_error {
        warn!("Error forwarding to remote endpoint: {e}");
    }
    if let Some(e) = &outcome.inbound_error {
        warn!("Error reading from remote endpoint: {e}");
    }
    debug!(
        outbound_bytes = outcome.outbound_bytes,
        inbound_bytes = outcome.inbound_bytes,
        clean = outcome.is_clean(),
        "connection finished"
    );
}
