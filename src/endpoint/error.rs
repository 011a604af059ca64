//! Error types for endpoint availability checks.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from the endpoint availability check.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// Failed to read the active-socket table.
    #[error("Failed to read {path}: {source}")]
    TableRead {
        /// Path of the table that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The active-socket table did not have the expected format.
    #[error("Unrecognized socket table format at line {line_num}: {message}")]
    TableParse {
        /// Line number where parsing failed (1-based).
        line_num: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// Another listener currently owns the socket path.
    #[error("Socket {0} is busy")]
    Busy(PathBuf),

    /// Failed to remove a stale socket file.
    #[error("Could not remove stale socket {path}: {source}")]
    Remove {
        /// The socket path we tried to remove.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for endpoint operations.
pub type EndpointResult<T> = Result<T, EndpointError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_error_names_path() {
        let err = EndpointError::Busy(PathBuf::from("/run/ssh-agent.sock"));
        assert!(err.to_string().contains("/run/ssh-agent.sock"));
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn test_parse_error_names_line() {
        let err = EndpointError::TableParse {
            line_num: 1,
            message: "missing header".to_string(),
        };
        assert!(err.to_string().contains("line 1"));
        assert!(err.to_string().contains("missing header"));
    }
}
