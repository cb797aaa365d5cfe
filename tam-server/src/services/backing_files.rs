//! Local source files of chapters uploaded by this process
//!
//! A chapter carries only a remote file reference. The local file it was
//! made from is known for certain only at upload time, so the mapping is
//! recorded then. Chapters without a recorded mapping (uploaded by another
//! client or before a restart) never lead to a local deletion.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct BackingFiles {
    files: Mutex<HashMap<String, PathBuf>>,
}

impl BackingFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember that remote file `remote_file` was uploaded from `local`
    pub fn record(&self, remote_file: &str, local: &Path) {
        if remote_file.is_empty() {
            return;
        }
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(remote_file.to_string(), local.to_path_buf());
    }

    pub fn lookup(&self, remote_file: &str) -> Option<PathBuf> {
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(remote_file)
            .cloned()
    }

    /// Forget `remote_file` and return its local file
    ///
    /// Returns `None` when nothing was recorded, or when another recorded
    /// upload (e.g. the same album on a second tonie) still uses the file.
    pub fn release(&self, remote_file: &str) -> Option<PathBuf> {
        let mut files = self
            .files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let local = files.remove(remote_file)?;
        if files.values().any(|other| *other == local) {
            return None;
        }
        Some(local)
    }

    pub fn len(&self) -> usize {
        self.files
            .lock()
            .map(|files| files.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_returns_recorded_file() {
        let backing = BackingFiles::new();
        backing.record("file-1", Path::new("/m/book/01.mp3"));

        assert_eq!(backing.lookup("file-1"), Some(PathBuf::from("/m/book/01.mp3")));
        assert_eq!(backing.release("file-1"), Some(PathBuf::from("/m/book/01.mp3")));
        assert!(backing.is_empty());
        assert_eq!(backing.release("file-1"), None);
    }

    #[test]
    fn test_unknown_file_is_not_released() {
        let backing = BackingFiles::new();
        assert_eq!(backing.release("remote-xyz"), None);
    }

    #[test]
    fn test_file_shared_by_two_uploads_is_kept() {
        let backing = BackingFiles::new();
        backing.record("file-1", Path::new("/m/book/01.mp3"));
        backing.record("file-2", Path::new("/m/book/01.mp3"));

        assert_eq!(backing.release("file-1"), None);
        assert_eq!(backing.release("file-2"), Some(PathBuf::from("/m/book/01.mp3")));
    }

    #[test]
    fn test_empty_remote_reference_is_ignored() {
        let backing = BackingFiles::new();
        backing.record("", Path::new("/m/book/01.mp3"));
        assert!(backing.is_empty());
    }
}
