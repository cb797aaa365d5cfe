//! Local audio file removal
//!
//! The pruner only deletes. Whether a file is still referenced by another
//! library record is decided by the caller before calling [`LocalTrackPruner::prune`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Deletion failed for a reason other than the file already being gone
#[derive(Debug, Error)]
#[error("Failed to remove {path}: {source}")]
pub struct PruneError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneOutcome {
    Removed,
    /// Nothing on disk; counts as success
    AlreadyAbsent,
    /// Another record still uses the file; left untouched
    StillReferenced,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTrackPruner;

impl LocalTrackPruner {
    pub fn new() -> Self {
        Self
    }

    /// Delete `path`, treating an already-missing file as success
    pub async fn prune(&self, path: &Path) -> Result<PruneOutcome, PruneError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::info!(file = %path.display(), "Removed local track");
                Ok(PruneOutcome::Removed)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(file = %path.display(), "Local track already absent");
                Ok(PruneOutcome::AlreadyAbsent)
            }
            Err(source) => Err(PruneError {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prune_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("track.mp3");
        std::fs::write(&file, b"audio").unwrap();

        let outcome = LocalTrackPruner::new().prune(&file).await.unwrap();
        assert_eq!(outcome, PruneOutcome::Removed);
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_prune_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("track.mp3");
        std::fs::write(&file, b"audio").unwrap();

        let pruner = LocalTrackPruner::new();
        assert_eq!(pruner.prune(&file).await.unwrap(), PruneOutcome::Removed);
        assert_eq!(pruner.prune(&file).await.unwrap(), PruneOutcome::AlreadyAbsent);
    }

    #[tokio::test]
    async fn test_prune_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalTrackPruner::new().prune(dir.path()).await.unwrap_err();
        assert_eq!(err.path, dir.path());
        assert!(dir.path().exists());
    }
}
