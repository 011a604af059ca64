//! Windows named-pipe channel.
//!
//! The agent on the Windows side listens on a named pipe (the OpenSSH
//! agent uses `\\.\pipe\openssh-ssh-agent`). This channel is what the
//! companion binary bridges against its own stdio.

use super::{ChannelRead, ChannelWrite, RemoteChannel};
use std::io;
use tokio::net::windows::named_pipe::{ClientOptions, NamedPipeClient};
use tracing::debug;

/// A dialed named-pipe connection to the agent.
#[derive(Debug)]
pub struct NamedPipeChannel {
    pipe: NamedPipeClient,
}

impl NamedPipeChannel {
    /// Dial the named pipe at `pipe_name`.
    ///
    /// Fails immediately when the pipe is absent or busy; the agent is
    /// expected to be running already.
    pub fn dial(pipe_name: &str) -> io::Result<Self> {
        let pipe = ClientOptions::new().open(pipe_name)?;
        debug!("Connected to named pipe {pipe_name}");
        Ok(Self { pipe })
    }
}

impl RemoteChannel for NamedPipeChannel {
    fn supports_write_shutdown(&self) -> bool {
        // A byte-mode named pipe has no half-close; the bridge falls back
        // to its tidy-up signal.
        false
    }

    fn into_split(self: Box<Self>) -> (Box<dyn ChannelRead>, Box<dyn ChannelWrite>) {
        let (read_half, write_half) = tokio::io::split(self.pipe);
        (Box::new(read_half), Box::new(write_half))
    }
}
