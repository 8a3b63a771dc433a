//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`] for reading wiki pages and probing the local
//! filesystem on behalf of the indexer.

use std::fs;
use std::path::Path;

use crate::storage::{DirEntry, EntryKind, Storage, StorageError};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem storage implementation.
///
/// Directory listings never follow symlinks: a symlinked file or directory is
/// reported as [`EntryKind::Other`] so the index can't be tricked into walking
/// outside the data directory.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use gw_index::{FsStorage, Storage};
///
/// let storage = FsStorage::new();
/// let entries = storage.list(Path::new("data/pages"))?;
/// # Ok::<(), gw_index::StorageError>(())
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl FsStorage {
    /// Create a new filesystem storage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Storage for FsStorage {
    fn read(&self, path: &Path) -> Result<String, StorageError> {
        fs::read_to_string(path).map_err(|e| StorageError::io(e, path).with_backend(BACKEND))
    }

    fn is_file(&self, path: &Path) -> bool {
        // Opening proves readability, metadata of the open handle proves kind
        fs::File::open(path)
            .and_then(|file| file.metadata())
            .is_ok_and(|meta| meta.is_file())
    }

    fn is_dir(&self, path: &Path) -> bool {
        fs::read_dir(path).is_ok()
    }

    fn list(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError> {
        let entries =
            fs::read_dir(path).map_err(|e| StorageError::io(e, path).with_backend(BACKEND))?;

        let mut listing: Vec<DirEntry> = entries
            .filter_map(Result::ok)
            .map(|entry| {
                // DirEntry::file_type does not traverse symlinks
                let kind = match entry.file_type() {
                    Ok(t) if t.is_file() => EntryKind::File,
                    Ok(t) if t.is_dir() => EntryKind::Directory,
                    _ => EntryKind::Other,
                };
                DirEntry::new(entry.file_name().to_string_lossy().into_owned(), kind)
            })
            .collect();

        listing.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageErrorKind;

    fn assert_send_sync<T: Send + Sync>() {}

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_fs_storage_is_send_sync() {
        assert_send_sync::<FsStorage>();
    }

    #[test]
    fn test_read_existing_file() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("start.txt");
        fs::write(&path, "====== Start ======").unwrap();

        let content = FsStorage::new().read(&path).unwrap();

        assert_eq!(content, "====== Start ======");
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("missing.txt");

        let err = FsStorage::new().read(&path).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(err.backend, Some("Fs"));
        assert_eq!(err.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_read_rejects_invalid_utf8() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("binary.txt");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = FsStorage::new().read(&path).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::InvalidData);
    }

    #[test]
    fn test_is_file() {
        let temp_dir = create_test_dir();
        let path = temp_dir.path().join("page.txt");
        fs::write(&path, "text").unwrap();
        let storage = FsStorage::new();

        assert!(storage.is_file(&path));
        assert!(!storage.is_file(temp_dir.path()));
        assert!(!storage.is_file(&temp_dir.path().join("missing.txt")));
    }

    #[test]
    fn test_is_dir() {
        let temp_dir = create_test_dir();
        let file = temp_dir.path().join("page.txt");
        fs::write(&file, "text").unwrap();
        let storage = FsStorage::new();

        assert!(storage.is_dir(temp_dir.path()));
        assert!(!storage.is_dir(&file));
        assert!(!storage.is_dir(&temp_dir.path().join("missing")));
    }

    #[test]
    fn test_list_sorted_with_kinds() {
        let temp_dir = create_test_dir();
        fs::write(temp_dir.path().join("zeta.txt"), "z").unwrap();
        fs::write(temp_dir.path().join("alpha.txt"), "a").unwrap();
        fs::create_dir(temp_dir.path().join("wiki")).unwrap();

        let entries = FsStorage::new().list(temp_dir.path()).unwrap();

        assert_eq!(
            entries,
            vec![
                DirEntry::new("alpha.txt", EntryKind::File),
                DirEntry::new("wiki", EntryKind::Directory),
                DirEntry::new("zeta.txt", EntryKind::File),
            ]
        );
    }

    #[test]
    fn test_list_missing_dir() {
        let temp_dir = create_test_dir();

        let err = FsStorage::new()
            .list(&temp_dir.path().join("missing"))
            .unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_reports_symlinks_as_other() {
        let temp_dir = create_test_dir();
        let outside = create_test_dir();
        fs::write(outside.path().join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(outside.path(), temp_dir.path().join("escape")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            temp_dir.path().join("secret.txt"),
        )
        .unwrap();

        let entries = FsStorage::new().list(temp_dir.path()).unwrap();

        assert_eq!(
            entries,
            vec![
                DirEntry::new("escape", EntryKind::Other),
                DirEntry::new("secret.txt", EntryKind::Other),
            ]
        );
    }
}
