//! Remote channel abstraction: how a forwarded connection reaches the agent.
//!
//! The listener side never talks to the agent directly. Each accepted
//! connection asks a [`RemoteOpener`] for a fresh [`RemoteChannel`] and
//! hands it to the bridge. Three openers exist:
//!
//! - [`process::CompanionOpener`] spawns the extracted companion
//!   executable and speaks to it over stdin/stdout (the cross-personality
//!   case: the companion dials the named pipe on the Windows side).
//! - [`socket::SocketOpener`] dials a Unix socket in-process, for setups
//!   where the agent is reachable without crossing into Windows.
//! - [`pipe`] (Windows only) dials the named pipe itself; the companion
//!   binary uses it.
//!
//! Whether a channel can shut down just its write direction is an explicit
//! capability ([`RemoteChannel::supports_write_shutdown`]) checked once
//! per channel, not probed at runtime.

use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

#[cfg(windows)]
pub mod pipe;
#[cfg(unix)]
pub mod process;
#[cfg(unix)]
pub mod socket;

/// The read half of a remote channel.
pub trait ChannelRead: AsyncRead + Send + Unpin {}
impl<T: AsyncRead + Send + Unpin> ChannelRead for T {}

/// The write half of a remote channel.
///
/// Dropping the half closes the write direction for channels that own it
/// independently (sockets, child stdin); for split channels it merely
/// releases a reference.
pub trait ChannelWrite: AsyncWrite + Send + Unpin {}
impl<T: AsyncWrite + Send + Unpin> ChannelWrite for T {}

/// A bidirectional byte channel to the remote agent endpoint.
pub trait RemoteChannel: Send {
    /// Whether closing only the write direction is supported.
    ///
    /// When true, shutting down and dropping the write half delivers
    /// end-of-stream to the peer while the read direction stays open.
    /// When false the bridge degrades to a best-effort tidy-up signal.
    fn supports_write_shutdown(&self) -> bool;

    /// Split into independently owned read and write halves.
    fn into_split(self: Box<Self>) -> (Box<dyn ChannelRead>, Box<dyn ChannelWrite>);
}

/// Opens one remote channel per forwarded connection.
#[async_trait]
pub trait RemoteOpener: Send + Sync {
    /// Establish a fresh channel to the remote endpoint.
    async fn open(&self) -> io::Result<Box<dyn RemoteChannel>>;
}

/// A duplex channel assembled from a separate reader and writer.
///
/// Used where the two directions arrive as distinct handles, like a child
/// process's stdout/stdin or this process's own stdio.
#[derive(Debug)]
pub struct Merged<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Merged<R, W> {
    /// Combine a reader and a writer into one duplex channel.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Take the halves back apart.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: AsyncRead + Unpin, W: Unpin> AsyncRead for Merged<R, W> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

impl<R: Unpin, W: AsyncWrite + Unpin> AsyncWrite for Merged<R, W> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.writer).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.writer).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.writer).poll_shutdown(cx)
    }
}
