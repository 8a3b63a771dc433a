//! Storage trait and error types.
//!
//! Provides the [`Storage`] trait the indexer and resolver use for every
//! filesystem touch, along with [`StorageError`] for unified error handling
//! across backends.
//!
//! # Path Convention
//!
//! Unlike request URIs, every path parameter here is a full storage path
//! (e.g. `data/pages/wiki/syntax.txt`). Translating URIs into such paths is
//! the job of [`UriResolver`](crate::UriResolver).

use std::path::{Path, PathBuf};

/// Kind of a directory entry as reported by [`Storage::list`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Anything else (symlinks, sockets, devices). Never indexed.
    Other,
}

/// Single entry of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    /// File name without any directory component.
    pub name: String,
    /// Entry kind. Symlinks are reported as [`EntryKind::Other`].
    pub kind: EntryKind,
}

impl DirEntry {
    /// Create a new directory entry.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Semantic error categories.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Content is not valid UTF-8 text.
    InvalidData,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    /// Semantic error category.
    pub kind: StorageErrorKind,
    /// Path context (if applicable).
    pub path: Option<PathBuf>,
    /// Backend identifier (e.g., "Fs", "Mock").
    pub backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: &Path) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::InvalidData => StorageErrorKind::InvalidData,
            _ => StorageErrorKind::Other,
        };
        Self::new(kind).with_path(path).with_source(err)
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::InvalidData => "Invalid data",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Storage I/O used by the index, the resolver and page rendering.
///
/// Implementations must answer existence checks cheaply: [`is_file`](Self::is_file) is
/// called on every resolution as the live half of the path-safety check.
pub trait Storage: Send + Sync {
    /// Read a UTF-8 text file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file doesn't exist, can't be read or
    /// isn't valid UTF-8.
    fn read(&self, path: &Path) -> Result<String, StorageError>;

    /// Check that `path` is a regular file that can currently be opened.
    ///
    /// Returns `false` on errors.
    fn is_file(&self, path: &Path) -> bool;

    /// Check that `path` is a directory that can currently be listed.
    ///
    /// Returns `false` on errors.
    fn is_dir(&self, path: &Path) -> bool;

    /// List the entries of a directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory doesn't exist or can't be read.
    fn list(&self, path: &Path) -> Result<Vec<DirEntry>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_entry_new() {
        let entry = DirEntry::new("start.txt", EntryKind::File);

        assert_eq!(entry.name, "start.txt");
        assert_eq!(entry.kind, EntryKind::File);
    }

    #[test]
    fn test_storage_error_new() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert!(err.path.is_none());
        assert!(err.backend.is_none());
    }

    #[test]
    fn test_storage_error_not_found() {
        let err = StorageError::not_found("/data/pages/start.txt");

        assert_eq!(err.kind, StorageErrorKind::NotFound);
        assert_eq!(
            err.path.as_deref(),
            Some(Path::new("/data/pages/start.txt"))
        );
    }

    #[test]
    fn test_storage_error_io_maps_kinds() {
        let cases = [
            (std::io::ErrorKind::NotFound, StorageErrorKind::NotFound),
            (
                std::io::ErrorKind::PermissionDenied,
                StorageErrorKind::PermissionDenied,
            ),
            (std::io::ErrorKind::InvalidData, StorageErrorKind::InvalidData),
            (std::io::ErrorKind::TimedOut, StorageErrorKind::Other),
        ];

        for (io_kind, expected) in cases {
            let err = StorageError::io(std::io::Error::new(io_kind, "boom"), Path::new("x"));
            assert_eq!(err.kind, expected);
        }
    }

    #[test]
    fn test_storage_error_display_simple() {
        let err = StorageError::new(StorageErrorKind::NotFound);

        assert_eq!(err.to_string(), "Not found");
    }

    #[test]
    fn test_storage_error_display_full() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = StorageError::new(StorageErrorKind::NotFound)
            .with_backend("Fs")
            .with_path("/foo/bar")
            .with_source(io_err);

        assert_eq!(
            err.to_string(),
            "[Fs] Not found: file not found (path: /foo/bar)"
        );
    }

    #[test]
    fn test_storage_error_source_is_exposed() {
        use std::error::Error as _;

        let io_err = std::io::Error::other("inner");
        let err = StorageError::new(StorageErrorKind::Other).with_source(io_err);

        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("inner"));
    }

    #[test]
    fn test_storage_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }
}
