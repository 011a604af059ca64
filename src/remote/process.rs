//! Companion subprocess opener.
//!
//! Reaching the Windows agent from WSL requires a separately compiled
//! executable running under the Windows personality. Each forwarded
//! connection spawns one instance of the extracted companion with its
//! stdin/stdout wired to the bridge; the companion dials the named pipe
//! and copies bytes on its side. Its stderr is inherited so companion
//! diagnostics land on the service's own diagnostic stream.

use super::{ChannelRead, ChannelWrite, RemoteChannel, RemoteOpener};
use async_trait::async_trait;
use std::io;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};
use tracing::debug;

/// Opens remote channels by spawning the companion executable.
#[derive(Debug, Clone)]
pub struct CompanionOpener {
    executable: PathBuf,
    pipe_name: String,
    verbose: bool,
}

impl CompanionOpener {
    /// Create an opener for the companion at `executable`.
    ///
    /// `pipe_name` and `verbose` are forwarded to the companion's own
    /// command line.
    pub fn new(executable: PathBuf, pipe_name: String, verbose: bool) -> Self {
        Self {
            executable,
            pipe_name,
            verbose,
        }
    }
}

#[async_trait]
impl RemoteOpener for CompanionOpener {
    async fn open(&self) -> io::Result<Box<dyn RemoteChannel>> {
        let mut command = Command::new(&self.executable);
        command
            .arg("--pipe")
            .arg(&self.pipe_name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        if self.verbose {
            command.arg("--verbose");
        }

        let mut child = command.spawn()?;
        debug!(
            "Spawned companion {} (pid {:?})",
            self.executable.display(),
            child.id()
        );

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("companion stdin was not captured"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("companion stdout was not captured"))?;

        Ok(Box::new(ChildChannel {
            child,
            stdin,
            stdout,
        }))
    }
}

/// A running companion process as a remote channel.
///
/// Writes go to the child's stdin, reads come from its stdout. Dropping
/// the write half closes the child's stdin, which is how end-of-stream
/// reaches the far side of the pipe.
#[derive(Debug)]
pub struct ChildChannel {
    child: Child,
    stdin: tokio::process::ChildStdin,
    stdout: ChildStdout,
}

impl RemoteChannel for ChildChannel {
    fn supports_write_shutdown(&self) -> bool {
        // Closing stdin half-closes the conversation; stdout stays open
        // until the child is done responding.
        true
    }

    fn into_split(self: Box<Self>) -> (Box<dyn ChannelRead>, Box<dyn ChannelWrite>) {
        let read_half = ChildReadHalf {
            stdout: self.stdout,
            // Held so the child is only dropped (and reaped by the
            // runtime) once the read direction is finished with it.
            _child: self.child,
        };
        (Box::new(read_half), Box::new(self.stdin))
    }
}

/// Read half of a [`ChildChannel`]: the child's stdout plus ownership of
/// the process handle.
#[derive(Debug)]
struct ChildReadHalf {
    stdout: ChildStdout,
    _child: Child,
}

impl AsyncRead for ChildReadHalf {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}
