//! Parsed active-socket table from /proc/net/unix.
//!
//! The kernel exposes every open Unix domain socket as one line of a
//! textual table. Only the trailing `Path` column matters here: a socket
//! with a filesystem path shows up with that path as its last field, while
//! abstract and unnamed sockets have no path field at all and their lines
//! are correspondingly shorter.

use super::error::{EndpointError, EndpointResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the kernel's Unix socket table.
pub const SOCKET_TABLE_PATH: &str = "/proc/net/unix";

/// A point-in-time snapshot of the pathname sockets currently open.
#[derive(Debug)]
pub struct SocketTable {
    paths: Vec<PathBuf>,
}

impl SocketTable {
    /// Load and parse the kernel's socket table.
    pub fn load() -> EndpointResult<Self> {
        let content =
            fs::read_to_string(SOCKET_TABLE_PATH).map_err(|source| EndpointError::TableRead {
                path: PathBuf::from(SOCKET_TABLE_PATH),
                source,
            })?;
        Self::parse(&content)
    }

    /// Parse a socket table from a string.
    ///
    /// The first line must be a header whose last column is labeled
    /// `Path`; anything else is a fatal parse error since liveness cannot
    /// be determined from an unrecognized format. Data lines are split
    /// into at most as many fields as the header has columns, so a path
    /// containing spaces stays in one piece; lines with fewer fields
    /// belong to sockets without a path and are skipped.
    pub fn parse(content: &str) -> EndpointResult<Self> {
        let mut lines = content.lines();

        let header = lines.next().ok_or_else(|| EndpointError::TableParse {
            line_num: 1,
            message: "table is empty".to_string(),
        })?;
        let columns: Vec<&str> = header.split_whitespace().collect();
        if columns.last() != Some(&"Path") {
            return Err(EndpointError::TableParse {
                line_num: 1,
                message: format!("last header column is not 'Path': {header:?}"),
            });
        }
        let width = columns.len();

        let mut paths = Vec::new();
        for line in lines {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.splitn(width, ' ').collect();
            if fields.len() < width {
                // No path associated with this socket.
                continue;
            }
            paths.push(PathBuf::from(fields[width - 1]));
        }

        Ok(Self { paths })
    }

    /// Whether any open socket is bound to the given filesystem path.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Number of pathname sockets in the snapshot.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the snapshot holds no pathname sockets.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
