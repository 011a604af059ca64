//! Companion executable artifact lifecycle.
//!
//! The bridge reaches the Windows side through a small companion
//! executable. Its bytes ship inside this binary (or come from a file via
//! `--proxy-exe`) and are materialized into a uniquely named, executable
//! temporary file at startup. The artifact is shared read-only by every
//! forwarded connection and must disappear from disk on every exit path:
//! [`CompanionArtifact::release`] removes it explicitly and the `Drop`
//! impl is the backstop for early returns.

use std::fs::{self, File};
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from companion artifact creation.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Failed to create the temporary file.
    #[error("Could not create temporary file for companion executable: {0}")]
    Create(#[source] io::Error),

    /// Failed to mark the temporary file executable.
    #[error("Could not make {path} executable: {source}")]
    Permissions {
        /// Path of the partially created artifact.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to write the payload.
    #[error("Could not write companion executable to {path}: {source}")]
    Write {
        /// Path of the partially created artifact.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Result type for artifact operations.
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// An extracted companion executable on disk.
///
/// The artifact is only ever observable in a fully written, executable
/// state: any failure during extraction removes the partial file before
/// the error is returned.
#[derive(Debug)]
pub struct CompanionArtifact {
    path: PathBuf,
    present: bool,
}

impl CompanionArtifact {
    /// Extract the payload into an executable temporary file.
    pub fn extract(payload: &[u8]) -> ArtifactResult<Self> {
        Self::extract_in(&std::env::temp_dir(), payload)
    }

    /// Extract the payload into an executable temporary file under `dir`.
    pub fn extract_in(dir: &Path, payload: &[u8]) -> ArtifactResult<Self> {
        Self::extract_with(dir, payload, populate)
    }

    /// Extraction core with the populate step injectable, so the
    /// partial-failure cleanup path is reachable from tests.
    fn extract_with<F>(dir: &Path, payload: &[u8], populate: F) -> ArtifactResult<Self>
    where
        F: FnOnce(File, &Path, &[u8]) -> ArtifactResult<()>,
    {
        let file = tempfile::Builder::new()
            .prefix("agent-pipe-proxy.")
            .suffix(".exe")
            .tempfile_in(dir)
            .map_err(ArtifactError::Create)?;
        // Take ownership of cleanup: from here on *we* guarantee removal,
        // on the failure path below and via release()/Drop afterwards.
        let (file, path) = file.keep().map_err(|e| ArtifactError::Create(e.error))?;

        match populate(file, &path, payload) {
            Ok(()) => {
                debug!("Extracted companion executable to {}", path.display());
                Ok(Self {
                    path,
                    present: true,
                })
            }
            Err(e) => {
                if let Err(remove_err) = fs::remove_file(&path) {
                    warn!(
                        "Failed to remove partial artifact {}: {}",
                        path.display(),
                        remove_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Path of the extracted executable.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the backing file.
    ///
    /// Safe to call more than once and tolerant of the file already being
    /// gone. This (or the `Drop` backstop) is the only path by which the
    /// artifact's filesystem footprint disappears.
    pub fn release(&mut self) {
        if !self.present {
            return;
        }
        self.present = false;
        info!("Removing temporary file {}", self.path.display());
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Artifact {} already removed", self.path.display());
            }
            Err(e) => {
                warn!("Failed to remove artifact {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for CompanionArtifact {
    fn drop(&mut self) {
        self.release();
    }
}

/// Make the freshly created file executable and write the full payload.
fn populate(mut file: File, path: &Path, payload: &[u8]) -> ArtifactResult<()> {
    let permissions_err = |source| ArtifactError::Permissions {
        path: path.to_path_buf(),
        source,
    };
    let write_err = |source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut perms = file.metadata().map_err(permissions_err)?.permissions();
    perms.set_mode(0o755);
    file.set_permissions(perms).map_err(permissions_err)?;

    file.write_all(payload).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    Ok(())
}
