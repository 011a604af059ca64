//! agent-pipe-bridge: present a Unix-socket agent endpoint backed by a
//! Windows named-pipe agent.
//!
//! SSH clients inside WSL expect an agent on a Unix domain socket
//! (`SSH_AUTH_SOCK`), while the Windows OpenSSH agent listens on a named
//! pipe. This crate bridges the two: it listens on the socket and, for
//! every accepted connection, forwards opaque bytes in both directions to
//! the pipe. The forwarding engine never inspects the agent protocol.
//!
//! # Architecture
//!
//! ```text
//! WSL / Linux                                      Windows
//! ───────────                                      ───────
//! ssh client ──► /run/ssh-agent.sock
//!                  │ accept
//!                  ▼
//!          ForwardingListener ──► agent-pipe-proxy.exe ──► \\.\pipe\openssh-ssh-agent
//!               (relay)             (companion, stdio)          (agent)
//! ```
//!
//! - [`endpoint`] decides whether the socket path is free before binding,
//!   removing stale leftovers from crashed sessions.
//! - [`companion`] extracts the companion executable to a temporary file
//!   and guarantees its removal.
//! - [`remote`] abstracts "how do we reach the agent" behind an opener
//!   capability: a companion subprocess, an in-process Unix socket dial,
//!   or (on Windows) the named pipe itself.
//! - [`relay`] owns the accept loop and the full-duplex byte bridge with
//!   its asymmetric half-close handling.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod cli;
#[cfg(unix)]
pub mod companion;
pub mod config;
#[cfg(unix)]
pub mod endpoint;
pub mod payload;
pub mod relay;
pub mod remote;
pub mod trace;
