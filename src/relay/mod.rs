//! Connection forwarding: the byte bridge and the accept loop around it.
//!
//! [`bridge`] is the protocol-agnostic full-duplex copy engine; it is
//! portable and is shared with the Windows-side companion binary. The
//! listener half ([`run`]) binds the Unix socket and only exists on Unix.

pub mod bridge;
#[cfg(unix)]
mod error;
#[cfg(unix)]
mod listener;

pub use bridge::{bridge, BridgeOutcome, BridgeState};
#[cfg(unix)]
pub use error::{RelayError, RelayResult};
#[cfg(unix)]
pub use listener::{run, RemoteTarget};
