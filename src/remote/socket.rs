//! In-process Unix socket opener.
//!
//! When the agent is reachable over a Unix socket on this machine there
//! is no personality boundary to cross and no companion to spawn: each
//! forwarded connection just dials the socket directly.

use super::{ChannelRead, ChannelWrite, RemoteChannel, RemoteOpener};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use tokio::net::UnixStream;
use tracing::debug;

/// Opens remote channels by connecting to a Unix socket path.
#[derive(Debug, Clone)]
pub struct SocketOpener {
    path: PathBuf,
}

impl SocketOpener {
    /// Create an opener that dials the given socket path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl RemoteOpener for SocketOpener {
    async fn open(&self) -> io::Result<Box<dyn RemoteChannel>> {
        let stream = UnixStream::connect(&self.path).await?;
        debug!("Connected to remote socket {}", self.path.display());
        Ok(Box::new(SocketChannel { stream }))
    }
}

/// A connected Unix stream as a remote channel.
#[derive(Debug)]
pub struct SocketChannel {
    stream: UnixStream,
}

impl RemoteChannel for SocketChannel {
    fn supports_write_shutdown(&self) -> bool {
        // shutdown(SHUT_WR) delivers EOF while reads keep flowing.
        true
    }

    fn into_split(self: Box<Self>) -> (Box<dyn ChannelRead>, Box<dyn ChannelWrite>) {
        let (read_half, write_half) = self.stream.into_split();
        (Box::new(read_half), Box::new(write_half))
    }
}
