//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::storage::{DirEntry, EntryKind, Storage, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores files and directories in memory. Adding a file registers all of its
/// ancestor directories. Files can be removed or made unreadable after an
/// index was built to simulate races between indexing and access.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use gw_index::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_file("data/pages/start.txt", "====== Start ======")
///     .with_dir("data/media");
///
/// let content = storage.read(Path::new("data/pages/start.txt")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    /// File contents; `None` marks a file that exists but can't be read.
    files: RwLock<BTreeMap<PathBuf, Option<String>>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with content, registering its ancestor directories.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path: PathBuf = path.into();
        self.register_ancestors(&path);
        self.files
            .write()
            .unwrap()
            .insert(path, Some(content.into()));
        self
    }

    /// Add an empty directory, registering its ancestors.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        let path: PathBuf = path.into();
        self.register_ancestors(&path);
        self.dirs.write().unwrap().insert(path);
        self
    }

    /// Remove a file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove(&self, path: impl AsRef<Path>) {
        self.files.write().unwrap().remove(path.as_ref());
    }

    /// Keep a file listed but make every read and existence check fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn make_unreadable(&self, path: impl AsRef<Path>) {
        if let Some(content) = self.files.write().unwrap().get_mut(path.as_ref()) {
            *content = None;
        }
    }

    fn register_ancestors(&self, path: &Path) {
        let mut dirs = self.dirs.write().unwrap();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl Storage for MockStorage {
    fn read(&self, path: &Path) -> Result<String, StorageError> {
        match self.files.read().unwrap().get(path) {
            Some(Some(content)) => Ok(content.clone()),
            Some(None) => Err(StorageError::new(StorageErrorKind::PermissionDenied)
                .with_path(path)
                .with_backend(BACKEND)),
            None => Err(StorageError::not_found(path).with_backend(BACKEND)),
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.files.read().unwrap().get(path), Some(Some(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.read().unwrap().contains(path)
    }

    fn list(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError> {
        if !self.is_dir(path) {
            return Err(StorageError::not_found(path).with_backend(BACKEND));
        }

        let child_name = |child: &Path| {
            (child.parent() == Some(path))
                .then(|| child.file_name())
                .flatten()
                .map(|name| name.to_string_lossy().into_owned())
        };

        let mut entries: Vec<DirEntry> = self
            .dirs
            .read()
            .unwrap()
            .iter()
            .filter_map(|dir| child_name(dir))
            .map(|name| DirEntry::new(name, EntryKind::Directory))
            .chain(
                self.files
                    .read()
                    .unwrap()
                    .keys()
                    .filter_map(|file| child_name(file))
                    .map(|name| DirEntry::new(name, EntryKind::File)),
            )
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_file_registers_ancestors() {
        let storage = MockStorage::new().with_file("data/pages/wiki/syntax.txt", "text");

        assert!(storage.is_dir(Path::new("data")));
        assert!(storage.is_dir(Path::new("data/pages")));
        assert!(storage.is_dir(Path::new("data/pages/wiki")));
        assert!(storage.is_file(Path::new("data/pages/wiki/syntax.txt")));
    }

    #[test]
    fn test_read_and_remove() {
        let storage = MockStorage::new().with_file("data/pages/start.txt", "hello");

        assert_eq!(storage.read(Path::new("data/pages/start.txt")).unwrap(), "hello");

        storage.remove("data/pages/start.txt");

        let err = storage.read(Path::new("data/pages/start.txt")).unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert!(!storage.is_file(Path::new("data/pages/start.txt")));
    }

    #[test]
    fn test_make_unreadable() {
        let storage = MockStorage::new().with_file("data/pages/start.txt", "hello");

        storage.make_unreadable("data/pages/start.txt");

        assert!(!storage.is_file(Path::new("data/pages/start.txt")));
        let err = storage.read(Path::new("data/pages/start.txt")).unwrap_err();
        assert_eq!(err.kind, StorageErrorKind::PermissionDenied);
    }

    #[test]
    fn test_list_direct_children_sorted() {
        let storage = MockStorage::new()
            .with_file("data/pages/zeta.txt", "z")
            .with_file("data/pages/alpha.txt", "a")
            .with_file("data/pages/wiki/deep.txt", "d")
            .with_dir("data/pages/empty");

        let entries = storage.list(Path::new("data/pages")).unwrap();

        assert_eq!(
            entries,
            vec![
                DirEntry::new("alpha.txt", EntryKind::File),
                DirEntry::new("empty", EntryKind::Directory),
                DirEntry::new("wiki", EntryKind::Directory),
                DirEntry::new("zeta.txt", EntryKind::File),
            ]
        );
    }

    #[test]
    fn test_list_missing_dir() {
        let storage = MockStorage::new();

        let err = storage.list(Path::new("nowhere")).unwrap_err();

        assert_eq!(err.kind, StorageErrorKind::NotFound);
    }
}
