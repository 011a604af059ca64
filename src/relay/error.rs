//! Fatal error taxonomy for the forwarding listener.
//!
//! Everything here aborts the whole bridge: endpoint conflicts, artifact
//! failures, bind and accept failures. Per-connection errors never appear
//! in this enum; they are logged inside the forwarding unit and isolated
//! there.

use crate::companion::ArtifactError;
use crate::endpoint::EndpointError;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors from the forwarding listener.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The local endpoint is unavailable or its liveness could not be
    /// determined.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    /// The companion executable could not be extracted.
    #[error("Error extracting companion executable: {0}")]
    Artifact(#[from] ArtifactError),

    /// Binding the listening socket failed.
    #[error("Could not listen on {path}: {source}")]
    Bind {
        /// The socket path we tried to bind.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Accepting a connection failed; the accept loop cannot continue.
    #[error("Could not accept on {path}: {source}")]
    Accept {
        /// The socket path being listened on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
