//! Section and page menus built from the live index.
//!
//! Every menu entry is a Gemtext link line (`=> target title`). Titles come
//! from the first level-1 heading of the converted page, so building a menu
//! converts every listed page. Menus are sorted by the full link line and
//! never contain duplicates.

use std::path::Path;

use gw_index::{PathIndex, encode_uri};
use gw_markup::{Converter, get_h1};

/// Builds link lines for the children of a section.
///
/// Borrows one index snapshot for its whole lifetime, so a menu is always
/// built from a single consistent index even while a re-index runs.
pub struct Navigator<'a> {
    index: &'a PathIndex,
    converter: &'a Converter,
    site_root: &'a str,
}

impl<'a> Navigator<'a> {
    /// Create a navigator.
    ///
    /// `site_root` prefixes every link target.
    #[must_use]
    pub fn new(index: &'a PathIndex, converter: &'a Converter, site_root: &'a str) -> Self {
        Self {
            index,
            converter,
            site_root,
        }
    }

    /// First level-1 heading of a page's converted text.
    ///
    /// Returns `None` if the page can't be read or has no such heading.
    #[must_use]
    pub fn page_title(&self, path: &Path) -> Option<String> {
        let raw = match self.index.storage().read(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Page unreadable, no title");
                return None;
            }
        };
        self.converter
            .convert(&raw)
            .and_then(|conversion| get_h1(&conversion.text))
    }

    /// Title of a section.
    ///
    /// Taken from the section index page (`ns:ns`) if it exists, otherwise
    /// from the page named after the section (`ns`).
    #[must_use]
    pub fn section_title(&self, uri: &str) -> Option<String> {
        let resolver = self.index.resolver();
        let last = uri.rsplit(':').next().unwrap_or(uri);

        [format!("{uri}:{last}"), uri.to_owned()]
            .iter()
            .find_map(|candidate| resolver.page_uri_to_path(candidate))
            .and_then(|path| self.page_title(&path))
    }

    /// Link lines for the direct subsections of a section.
    ///
    /// Deeper descendants are skipped, not recursed into. Returns an empty
    /// list if the section doesn't resolve.
    #[must_use]
    pub fn child_sections(&self, uri: &str) -> Vec<String> {
        let resolver = self.index.resolver();
        let Some(dir) = resolver.uri_to_directory_path(uri) else {
            return Vec::new();
        };
        let depth = dir.components().count() + 1;

        let links = self
            .index
            .tree()
            .keys()
            .filter(|path| path.starts_with(&dir) && path.components().count() == depth)
            .filter_map(|path| resolver.directory_path_to_uri(path))
            .map(|child| {
                let title = self.section_title(&child).unwrap_or_default();
                self.link_line(&child, &title)
            })
            .collect();

        sorted_unique(links)
    }

    /// Link lines for the pages directly inside a section.
    ///
    /// Pages that fail the live readability check are skipped.
    #[must_use]
    pub fn child_pages(&self, uri: &str) -> Vec<String> {
        let Some(dir) = self.index.resolver().uri_to_directory_path(uri) else {
            return Vec::new();
        };

        let links = self
            .index
            .child_paths(&dir)
            .unwrap_or_default()
            .iter()
            .filter_map(|path| self.page_link(path))
            .collect();

        sorted_unique(links)
    }

    /// Link line for a single page.
    ///
    /// Returns `None` if the path is not an indexed, readable page. A page
    /// without a title gets a link line without label.
    #[must_use]
    pub fn page_link(&self, path: &Path) -> Option<String> {
        let uri = self.index.resolver().path_to_page_uri(path)?;
        let title = self.page_title(path).unwrap_or_default();
        Some(self.link_line(&uri, &title))
    }

    fn link_line(&self, uri: &str, title: &str) -> String {
        let line = format!("=> {}{}", self.site_root, encode_uri(uri));
        if title.is_empty() {
            line
        } else {
            format!("{line} {title}")
        }
    }
}

fn sorted_unique(mut links: Vec<String>) -> Vec<String> {
    links.sort();
    links.dedup();
    links
}
