//! Content discovery by walking the wiki data directory.
//!
//! [`PathIndex::build`] scans the data directory exactly once and records
//! every file and directory it sees. The result is immutable: a re-index
//! builds a new value, it never patches an existing one.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::resolver::UriResolver;
use crate::storage::{EntryKind, Storage};

/// Directory holding wiki pages, relative to the data root.
pub(crate) const PAGES_DIR: &str = "pages";
/// Directory holding media files, relative to the data root.
pub(crate) const MEDIA_DIR: &str = "media";
/// File extension of wiki pages.
pub(crate) const PAGE_EXTENSION: &str = "txt";

/// Kind of an indexed filesystem entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Wiki page (`.txt` file below `pages/`).
    Page,
    /// Directory (namespace).
    Directory,
    /// Any other indexed file.
    Media,
}

/// Filesystem entry discovered during indexing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContentNode {
    /// Full path (data root joined with the entry's relative path).
    pub path: PathBuf,
    /// Entry kind.
    pub kind: NodeKind,
    /// Containing directory. `None` only for the data root itself.
    pub parent: Option<PathBuf>,
}

/// File names excluded from indexing.
///
/// The default skips the current/parent directory markers, the sidebar page
/// and the namespace template pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blacklist(Vec<String>);

impl Blacklist {
    /// Create a blacklist from file names.
    #[must_use]
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Check if a file name is blacklisted.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Blacklisted names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl Default for Blacklist {
    fn default() -> Self {
        Self::new([".", "..", "sidebar.txt", "_template.txt", "__template.txt"])
    }
}

/// Trusted set of paths discovered under the data root.
///
/// Owns two derived views over the discovered [`ContentNode`]s:
/// - `tree`: directory → member files in scan order. Every directory seen
///   is a key, empty ones included, so "exists but empty" and "unknown"
///   stay distinguishable.
/// - `list`: all discovered files, the membership oracle for path safety.
///
/// # Thread Safety
///
/// The index is never mutated after [`build`](Self::build), so it can be
/// shared behind an `Arc` by any number of readers.
pub struct PathIndex {
    root: PathBuf,
    storage: Arc<dyn Storage>,
    nodes: Vec<ContentNode>,
    tree: BTreeMap<PathBuf, Vec<PathBuf>>,
    list: HashSet<PathBuf>,
}

impl PathIndex {
    /// Scan `root` and build the index.
    ///
    /// Walks the directory tree iteratively with an explicit stack. Each
    /// directory is registered as a `tree` key before its members are
    /// listed. Symlinks and other non-regular entries are skipped.
    ///
    /// Never fails: an unreadable root produces an empty index, and
    /// unreadable subdirectories are recorded as empty.
    pub fn build(storage: Arc<dyn Storage>, root: impl Into<PathBuf>, blacklist: &Blacklist) -> Self {
        let root = root.into();
        let pages_dir = root.join(PAGES_DIR);

        let mut nodes = Vec::new();
        let mut tree: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        let mut list = HashSet::new();

        if storage.is_dir(&root) {
            tree.insert(root.clone(), Vec::new());
            nodes.push(ContentNode {
                path: root.clone(),
                kind: NodeKind::Directory,
                parent: None,
            });

            let mut stack = vec![root.clone()];
            while let Some(dir) = stack.pop() {
                let entries = match storage.list(&dir) {
                    Ok(entries) => entries,
                    Err(e) => {
                        tracing::debug!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                        continue;
                    }
                };

                let mut subdirs = Vec::new();
                for entry in entries {
                    if blacklist.contains(&entry.name) {
                        continue;
                    }

                    let path = dir.join(&entry.name);
                    match entry.kind {
                        EntryKind::Directory => {
                            tree.insert(path.clone(), Vec::new());
                            nodes.push(ContentNode {
                                path: path.clone(),
                                kind: NodeKind::Directory,
                                parent: Some(dir.clone()),
                            });
                            subdirs.push(path);
                        }
                        EntryKind::File => {
                            let kind = if path.starts_with(&pages_dir)
                                && path.extension().is_some_and(|e| e == PAGE_EXTENSION)
                            {
                                NodeKind::Page
                            } else {
                                NodeKind::Media
                            };
                            tree.entry(dir.clone()).or_default().push(path.clone());
                            list.insert(path.clone());
                            nodes.push(ContentNode {
                                path,
                                kind,
                                parent: Some(dir.clone()),
                            });
                        }
                        EntryKind::Other => {
                            tracing::debug!(path = %path.display(), "Skipping non-regular entry");
                        }
                    }
                }

                // Reverse so subdirectories are visited in listing order
                stack.extend(subdirs.into_iter().rev());
            }
        } else {
            tracing::warn!(root = %root.display(), "Content root is not a readable directory, index is empty");
        }

        tracing::info!(
            root = %root.display(),
            files = list.len(),
            directories = tree.len(),
            "Content index built"
        );

        Self {
            root,
            storage,
            nodes,
            tree,
            list,
        }
    }

    /// Data root the index was built from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding wiki pages (`<root>/pages`).
    #[must_use]
    pub fn pages_dir(&self) -> PathBuf {
        self.root.join(PAGES_DIR)
    }

    /// Directory holding media files (`<root>/media`).
    #[must_use]
    pub fn media_dir(&self) -> PathBuf {
        self.root.join(MEDIA_DIR)
    }

    /// Storage backend used for live checks and reads.
    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// All discovered nodes in discovery order.
    #[must_use]
    pub fn nodes(&self) -> &[ContentNode] {
        &self.nodes
    }

    /// Directory → member files map.
    #[must_use]
    pub fn tree(&self) -> &BTreeMap<PathBuf, Vec<PathBuf>> {
        &self.tree
    }

    /// Number of indexed files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// True if no file was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Check that `path` was discovered during indexing AND is still a
    /// readable regular file.
    ///
    /// Index membership proves the path lies under the data root; the live
    /// check catches files removed or locked down after indexing.
    #[must_use]
    pub fn is_path(&self, path: &Path) -> bool {
        self.list.contains(path) && self.storage.is_file(path)
    }

    /// Check that `path` is an indexed directory that is still readable.
    #[must_use]
    pub fn is_directory(&self, path: &Path) -> bool {
        self.tree.contains_key(path) && self.storage.is_dir(path)
    }

    /// Member files of an indexed directory in scan order.
    ///
    /// Returns `None` if the directory was never indexed.
    #[must_use]
    pub fn child_paths(&self, dir: &Path) -> Option<&[PathBuf]> {
        self.tree.get(dir).map(Vec::as_slice)
    }

    /// Borrow a URI resolver backed by this index.
    #[must_use]
    pub fn resolver(&self) -> UriResolver<'_> {
        UriResolver::new(self)
    }
}

impl fmt::Debug for PathIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathIndex")
            .field("root", &self.root)
            .field("files", &self.list.len())
            .field("directories", &self.tree.len())
            .finish_non_exhaustive()
    }
}
