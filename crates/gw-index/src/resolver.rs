//! Translation between colon-delimited URIs and indexed filesystem paths.
//!
//! Every externally supplied URI is untrusted. Resolution functions here are
//! the only place untrusted strings become filesystem paths, and they never
//! return a path that [`PathIndex`] did not discover.

use std::path::{Component, Path, PathBuf};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::index::{PAGE_EXTENSION, PathIndex};

/// Characters left as-is in URI link targets: A-Z a-z 0-9 : - . _ ~
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b':')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a URI for use as a link target, keeping `:` delimiters.
///
/// ```
/// assert_eq!(gw_index::encode_uri("wiki:my page"), "wiki:my%20page");
/// ```
#[must_use]
pub fn encode_uri(uri: &str) -> String {
    utf8_percent_encode(uri, URI_ENCODE_SET).to_string()
}

/// Decode, lowercase and split a URI into validated path segments.
///
/// Returns `None` if any segment is empty, a relative directory marker or
/// contains a path separator.
fn segments(uri: &str) -> Option<Vec<String>> {
    let decoded = percent_decode_str(uri).decode_utf8_lossy().to_lowercase();
    let trimmed = decoded.trim_matches(':');
    if trimmed.is_empty() {
        return Some(Vec::new());
    }

    trimmed
        .split(':')
        .map(|segment| {
            let valid = !segment.is_empty()
                && segment != "."
                && segment != ".."
                && !segment.contains(['/', '\\', '\0']);
            valid.then(|| segment.to_owned())
        })
        .collect()
}

/// Convert the components of a relative path back into a colon URI.
fn join_components(relative: &Path) -> Option<String> {
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    Some(parts?.join(":"))
}

/// URI resolver borrowing a [`PathIndex`].
///
/// Obtained through [`PathIndex::resolver`].
///
/// # Example
///
/// ```ignore
/// let resolver = index.resolver();
///
/// // "Wiki:Syntax" -> <root>/pages/wiki/syntax.txt
/// let path = resolver.page_uri_to_path("Wiki:Syntax").unwrap();
/// assert_eq!(resolver.path_to_page_uri(&path).as_deref(), Some("wiki:syntax"));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct UriResolver<'a> {
    index: &'a PathIndex,
}

impl<'a> UriResolver<'a> {
    pub(crate) fn new(index: &'a PathIndex) -> Self {
        Self { index }
    }

    /// Index backing this resolver.
    #[must_use]
    pub fn index(&self) -> &'a PathIndex {
        self.index
    }

    /// Resolve a page URI (`a:b:c` → `<root>/pages/a/b/c.txt`).
    ///
    /// Returns the path only if it is an indexed, currently readable file.
    #[must_use]
    pub fn page_uri_to_path(&self, uri: &str) -> Option<PathBuf> {
        let segments = segments(uri)?;
        let (last, dirs) = segments.split_last()?;

        let mut path = self.index.pages_dir();
        path.extend(dirs);
        path.push(format!("{last}.{PAGE_EXTENSION}"));

        if self.index.is_path(&path) {
            Some(path)
        } else {
            tracing::debug!(uri, path = %path.display(), "Page URI not resolved");
            None
        }
    }

    /// Inverse of [`page_uri_to_path`](Self::page_uri_to_path).
    ///
    /// Returns `None` if the path is not an indexed readable file below
    /// `<root>/pages` with the page extension.
    #[must_use]
    pub fn path_to_page_uri(&self, path: &Path) -> Option<String> {
        if !self.index.is_path(path) {
            return None;
        }
        if path.extension().is_none_or(|e| e != PAGE_EXTENSION) {
            return None;
        }

        let relative = path.strip_prefix(self.index.pages_dir()).ok()?;
        let uri = join_components(&relative.with_extension(""))?;
        (!uri.is_empty()).then_some(uri)
    }

    /// Resolve a section URI (`a:b` → `<root>/pages/a/b`).
    ///
    /// The empty URI denotes the pages directory itself. Returns the path
    /// only if the directory was indexed and is still readable.
    #[must_use]
    pub fn uri_to_directory_path(&self, uri: &str) -> Option<PathBuf> {
        let mut path = self.index.pages_dir();
        path.extend(segments(uri)?);

        if self.index.is_directory(&path) {
            Some(path)
        } else {
            tracing::debug!(uri, path = %path.display(), "Section URI not resolved");
            None
        }
    }

    /// Inverse of [`uri_to_directory_path`](Self::uri_to_directory_path).
    ///
    /// The pages directory maps to the empty URI.
    #[must_use]
    pub fn directory_path_to_uri(&self, path: &Path) -> Option<String> {
        if !self.index.is_directory(path) {
            return None;
        }
        let relative = path.strip_prefix(self.index.pages_dir()).ok()?;
        join_components(relative)
    }

    /// Resolve a media URI (`a:logo.png` → `<root>/media/a/logo.png`).
    ///
    /// Media keeps its own extension.
    #[must_use]
    pub fn media_uri_to_path(&self, uri: &str) -> Option<PathBuf> {
        let segments = segments(uri)?;
        if segments.is_empty() {
            return None;
        }

        let mut path = self.index.media_dir();
        path.extend(segments);

        if self.index.is_path(&path) {
            Some(path)
        } else {
            tracing::debug!(uri, path = %path.display(), "Media URI not resolved");
            None
        }
    }

    /// Inverse of [`media_uri_to_path`](Self::media_uri_to_path).
    #[must_use]
    pub fn path_to_media_uri(&self, path: &Path) -> Option<String> {
        if !self.index.is_path(path) {
            return None;
        }
        let relative = path.strip_prefix(self.index.media_dir()).ok()?;
        join_components(relative).filter(|uri| !uri.is_empty())
    }
}
