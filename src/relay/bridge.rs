//! Full-duplex byte bridge between an accepted connection and a remote
//! channel.
//!
//! Two copy tasks run concurrently, one per direction, sharing nothing
//! but the channel halves. Termination is asymmetric and is the crux of
//! the design:
//!
//! - When the client side reaches end-of-stream, the remote's peer must
//!   learn that no more data will arrive from this direction without the
//!   remote-to-client copy being forced to stop. Channels that support
//!   write shutdown get a real half-close; the rest get a best-effort
//!   zero-length tidy-up write and an info-level capability notice,
//!   never an abort. The notice stays below the default diagnostic
//!   threshold: a successful connection prints nothing at verbosity 0.
//! - The remote-to-client copy runs until the remote's read side reaches
//!   end-of-stream or errors.
//! - The remote channel is fully closed only once *both* directions have
//!   finished; closing earlier would truncate in-flight data.
//!
//! Errors in either direction are recorded in the [`BridgeOutcome`] but
//! never prevent the bridge from reaching [`BridgeState::Closed`].

use crate::remote::RemoteChannel;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinError;
use tracing::{debug, info};

/// Lifecycle of one bridged connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Dialing the remote endpoint.
    Connecting,
    /// Both directions are flowing.
    Established,
    /// One direction has reached end-of-stream.
    Draining,
    /// Both directions finished and the remote channel is closed.
    Closed,
}

/// Copy direction, client-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Client to remote.
    Outbound,
    /// Remote to client.
    Inbound,
}

/// What one completed bridge moved, and how it ended.
///
/// A populated error field means that direction ended abnormally; the
/// bridge itself still ran to completion.
#[derive(Debug, Default)]
pub struct BridgeOutcome {
    /// Bytes copied from the client to the remote.
    pub outbound_bytes: u64,
    /// Bytes copied from the remote to the client.
    pub inbound_bytes: u64,
    /// Error that ended the client-to-remote direction, if any.
    pub outbound_error: Option<io::Error>,
    /// Error that ended the remote-to-client direction, if any.
    pub inbound_error: Option<io::Error>,
}

impl BridgeOutcome {
    /// Whether both directions drained without error.
    pub fn is_clean(&self) -> bool {
        self.outbound_error.is_none() && self.inbound_error.is_none()
    }

    fn record(&mut self, direction: Direction, result: Result<io::Result<u64>, JoinError>) {
        let (bytes, error) = match result {
            Ok(Ok(n)) => (n, None),
            Ok(Err(e)) => (0, Some(e)),
            Err(e) => (0, Some(io::Error::other(e))),
        };
        match direction {
            Direction::Outbound => {
                self.outbound_bytes = bytes;
                self.outbound_error = error;
            }
            Direction::Inbound => {
                self.inbound_bytes = bytes;
                self.inbound_error = error;
            }
        }
    }
}

/// Copy bytes in both directions until both are drained, then close the
/// remote channel.
///
/// Consumes and closes `remote`; `local` is also consumed, its write
/// direction shut down once the remote stops sending, and the underlying
/// handle dropped on return. Within one direction bytes are forwarded in
/// read order; the two directions are independent streams.
pub async fn bridge<L>(local: L, remote: Box<dyn RemoteChannel>) -> BridgeOutcome
where
    L: AsyncRead + AsyncWrite + Send + 'static,
{
    let half_close = remote.supports_write_shutdown();
    let (mut remote_read, mut remote_write) = remote.into_split();
    let (mut local_read, mut local_write) = tokio::io::split(local);

    let mut outbound = tokio::spawn(async move {
        let copied = tokio::io::copy(&mut local_read, &mut remote_write).await;
        // The client is done sending (or failed); tell the remote's peer
        // either way so it can finish its side of the conversation.
        if half_close {
            if let Err(e) = remote_write.shutdown().await {
                debug!("Write shutdown on remote channel failed: {e}");
            }
        } else {
            info!("Remote channel does not support write shutdown; sending tidy-up signal");
            // Best effort only: on some channels this is a no-op and on
            // others it may itself error.
            if let Err(e) = remote_write.write(&[]).await {
                debug!("Tidy-up write failed: {e}");
            }
        }
        copied
        // remote_write drops here; for independently owned halves this
        // closes the write direction for good.
    });

    let mut inbound = tokio::spawn(async move {
        let copied = tokio::io::copy(&mut remote_read, &mut local_write).await;
        if let Err(e) = local_write.shutdown().await {
            debug!("Write shutdown towards client failed: {e}");
        }
        copied
    });

    let mut outcome = BridgeOutcome::default();
    let first = tokio::select! {
        result = &mut outbound => {
            outcome.record(Direction::Outbound, result);
            Direction::Outbound
        }
        result = &mut inbound => {
            outcome.record(Direction::Inbound, result);
            Direction::Inbound
        }
    };
    debug!(state = ?BridgeState::Draining, "{first:?} direction finished first");

    match first {
        Direction::Outbound => {
            let result = inbound.await;
            outcome.record(Direction::Inbound, result);
        }
        Direction::Inbound => {
            let result = outbound.await;
            outcome.record(Direction::Outbound, result);
        }
    }

    // Both tasks have finished, so both remote halves are dropped and the
    // remote channel is closed only now.
    debug!(
        state = ?BridgeState::Closed,
        outbound_bytes = outcome.outbound_bytes,
        inbound_bytes = outcome.inbound_bytes,
        "bridge closed"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{ChannelRead, ChannelWrite};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, DuplexStream};
    use tokio::time::timeout;

    /// In-memory remote channel with a configurable half-close capability.
    struct TestChannel {
        inner: DuplexStream,
        half_close: bool,
    }

    impl RemoteChannel for TestChannel {
        fn supports_write_shutdown(&self) -> bool {
            self.half_close
        }

        fn into_split(self: Box<Self>) -> (Box<dyn ChannelRead>, Box<dyn ChannelWrite>) {
            let (read_half, write_half) = tokio::io::split(self.inner);
            (Box::new(read_half), Box::new(write_half))
        }
    }

    /// Bridge two in-memory pipes, returning the client end, the remote
    /// peer end, and the bridge task.
    fn harness(
        half_close: bool,
    ) -> (
        DuplexStream,
        DuplexStream,
        tokio::task::JoinHandle<BridgeOutcome>,
    ) {
        let (client, local_end) = tokio::io::duplex(4096);
        let (remote_end, remote_peer) = tokio::io::duplex(4096);
        let channel = Box::new(TestChannel {
            inner: remote_end,
            half_close,
        });
        let task = tokio::spawn(bridge(local_end, channel));
        (client, remote_peer, task)
    }

    #[tokio::test]
    async fn test_duplex_fidelity() {
        let (client, remote_peer, task) = harness(true);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        let (mut peer_read, mut peer_write) = tokio::io::split(remote_peer);

        let x: Vec<u8> = (0u16..2048).map(|i| (i % 251) as u8).collect();
        let y: Vec<u8> = (0u16..1536).map(|i| (i % 241) as u8).collect();

        let x_clone = x.clone();
        let send_x = tokio::spawn(async move {
            client_write.write_all(&x_clone).await.unwrap();
            client_write.shutdown().await.unwrap();
        });
        let y_clone = y.clone();
        let send_y = tokio::spawn(async move {
            peer_write.write_all(&y_clone).await.unwrap();
            peer_write.shutdown().await.unwrap();
        });

        let mut seen_at_peer = Vec::new();
        peer_read.read_to_end(&mut seen_at_peer).await.unwrap();
        let mut seen_at_client = Vec::new();
        client_read.read_to_end(&mut seen_at_client).await.unwrap();

        assert_eq!(seen_at_peer, x);
        assert_eq!(seen_at_client, y);

        send_x.await.unwrap();
        send_y.await.unwrap();
        let outcome = task.await.unwrap();
        assert!(outcome.is_clean());
        assert_eq!(outcome.outbound_bytes, x.len() as u64);
        assert_eq!(outcome.inbound_bytes, y.len() as u64);
    }

    #[tokio::test]
    async fn test_half_close_propagates_while_other_direction_flows() {
        let (client, remote_peer, task) = harness(true);
        let (mut client_read, mut client_write) = tokio::io::split(client);
        let (mut peer_read, mut peer_write) = tokio::io::split(remote_peer);

        client_write.write_all(b"request").await.unwrap();
        client_write.shutdown().await.unwrap();

        // The peer observes end-of-stream on the client-to-remote
        // direction...
        let mut request = Vec::new();
        peer_read.read_to_end(&mut request).await.unwrap();
        assert_eq!(request, b"request");

        // ...and can still answer afterwards.
        peer_write.write_all(b"late reply").await.unwrap();
        peer_write.shutdown().await.unwrap();

        let mut reply = Vec::new();
        client_read.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, b"late reply");

        let outcome = task.await.unwrap();
        assert!(outcome.is_clean());
    }

    #[tokio::test]
    async fn test_degrades_without_write_shutdown() {
        let (client, remote_peer, task) = harness(false);
        let (_client_read, mut client_write) = tokio::io::split(client);
        let (mut peer_read, mut peer_write) = tokio::io::split(remote_peer);

        client_write.write_all(b"request").await.unwrap();
        client_write.shutdown().await.unwrap();

        // No half-close reaches the peer, so it answers on its own
        // schedule and closes; the bridge must still complete.
        let mut buf = vec![0u8; 7];
        peer_read.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"request");
        peer_write.write_all(b"reply").await.unwrap();
        peer_write.shutdown().await.unwrap();
        drop(peer_write);
        drop(peer_read);

        let outcome = timeout(Duration::from_secs(5), task)
            .await
            .expect("bridge must not hang when half-close is unsupported")
            .unwrap();
        assert!(outcome.is_clean());
        assert_eq!(outcome.outbound_bytes, 7);
        assert_eq!(outcome.inbound_bytes, 5);
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLog {
        type Writer = CapturedLog;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run one full exchange over a channel without write-shutdown
    /// support, capturing everything logged at or above `level`.
    async fn degraded_exchange_logs(level: tracing::Level) -> String {
        let log = CapturedLog::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(log.clone())
            .with_max_level(level)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (client, remote_peer, task) = harness(false);
        let (_client_read, mut client_write) = tokio::io::split(client);
        let (mut peer_read, mut peer_write) = tokio::io::split(remote_peer);

        client_write.write_all(b"request").await.unwrap();
        client_write.shutdown().await.unwrap();

        let mut buf = vec![0u8; 7];
        peer_read.read_exact(&mut buf).await.unwrap();
        peer_write.write_all(b"reply").await.unwrap();
        drop(peer_write);
        drop(peer_read);

        let outcome = timeout(Duration::from_secs(5), task)
            .await
            .expect("bridge did not finish")
            .unwrap();
        assert!(outcome.is_clean());
        log.contents()
    }

    #[tokio::test]
    async fn test_capability_notice_silent_at_default_verbosity() {
        // Default diagnostics show warnings and errors only; a clean
        // exchange over a channel without half-close must print nothing.
        let logged = degraded_exchange_logs(tracing::Level::WARN).await;
        assert!(
            !logged.contains("write shutdown"),
            "capability notice leaked at default verbosity: {logged}"
        );
    }

    #[tokio::test]
    async fn test_capability_notice_visible_when_verbose() {
        let logged = degraded_exchange_logs(tracing::Level::INFO).await;
        assert!(
            logged.contains("write shutdown"),
            "capability notice missing at info level: {logged}"
        );
    }

    #[tokio::test]
    async fn test_remote_eof_shuts_down_client_write() {
        let (client, remote_peer, task) = harness(true);
        let (mut client_read, _client_write) = tokio::io::split(client);

        // Remote closes immediately without sending anything.
        drop(remote_peer);

        let mut buf = [0u8; 1];
        let n = client_read.read(&mut buf).await.unwrap();
        assert_eq!(n, 0, "client should observe end-of-stream");

        drop(_client_write);
        let outcome = task.await.unwrap();
        assert_eq!(outcome.inbound_bytes, 0);
    }
}
