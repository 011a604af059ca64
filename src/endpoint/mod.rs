//! Endpoint availability: decide whether the listening socket path is free.
//!
//! A previous bridge that died without cleanup leaves its socket file
//! behind, and binding over it fails with `AddrInUse`. Before binding we
//! consult the kernel's active-socket table: if some process still holds
//! the path the endpoint is genuinely busy; otherwise the file on disk is
//! a stale leftover and is removed.
//!
//! # Known limitation
//!
//! The check-then-delete sequence is inherently racy against a listener
//! starting concurrently on the same path. The socket table is a
//! read-only, point-in-time snapshot, so this is a best-effort liveness
//! probe, not a lock. Two bridges racing for the same path can still
//! collide; the loser fails at bind time.

mod error;
mod table;

pub use error::{EndpointError, EndpointResult};
pub use table::{SocketTable, SOCKET_TABLE_PATH};

use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

/// Ensure the socket path is available for binding.
///
/// Loads the kernel's socket table and defers to [`ensure_available_with`].
pub fn ensure_available(socket_path: &Path) -> EndpointResult<()> {
    let socket_table = SocketTable::load()?;
    ensure_available_with(&socket_table, socket_path)
}

/// Ensure the socket path is available, using the given table snapshot.
///
/// Returns [`EndpointError::Busy`] without touching the filesystem when a
/// live listener holds the path. Otherwise removes any stale file at the
/// path, treating "does not exist" as success: the file may have been
/// cleaned up already or never existed.
pub fn ensure_available_with(socket_table: &SocketTable, socket_path: &Path) -> EndpointResult<()> {
    if socket_table.contains(socket_path) {
        return Err(EndpointError::Busy(socket_path.to_path_buf()));
    }

    match fs::remove_file(socket_path) {
        Ok(()) => {
            info!("Removed stale socket file {}", socket_path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No existing file at {}", socket_path.display());
            Ok(())
        }
        Err(source) => Err(EndpointError::Remove {
            path: socket_path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const HEADER: &str = "Num       RefCount Protocol Flags    Type St Inode Path";

    fn table_with(path: Option<&str>) -> SocketTable {
        let mut content = String::from(HEADER);
        if let Some(path) = path {
            content.push_str(&format!(
                "\nffff8800b7f3aa80: 00000002 00000000 00010000 0001 01 17031 {path}"
            ));
        }
        SocketTable::parse(&content).unwrap()
    }

    #[test]
    fn test_stale_socket_removed() {
        let temp_dir = tempdir().unwrap();
        let socket_path = temp_dir.path().join("agent.sock");
        fs::write(&socket_path, b"").unwrap();

        let socket_table = table_with(None);
        ensure_available_with(&socket_table, &socket_path).unwrap();
        assert!(!socket_path.exists());
    }

    #[test]
    fn test_busy_socket_preserved() {
        let temp_dir = tempdir().unwrap();
        let socket_path = temp_dir.path().join("agent.sock");
        fs::write(&socket_path, b"").unwrap();

        let socket_table = table_with(Some(socket_path.to_str().unwrap()));
        let err = ensure_available_with(&socket_table, &socket_path).unwrap_err();
        assert!(matches!(err, EndpointError::Busy(_)));
        assert!(socket_path.exists());
    }

    #[test]
    fn test_missing_socket_is_noop() {
        let temp_dir = tempdir().unwrap();
        let socket_path = temp_dir.path().join("never-created.sock");

        let socket_table = table_with(None);
        ensure_available_with(&socket_table, &socket_path).unwrap();
    }

    #[test]
    fn test_other_entries_do_not_block() {
        let temp_dir = tempdir().unwrap();
        let socket_path = temp_dir.path().join("agent.sock");

        let socket_table = table_with(Some("/run/user/1000/bus"));
        ensure_available_with(&socket_table, &socket_path).unwrap();
    }
}
