//! Request-level composition of index, converter and navigation.
//!
//! [`Site`] owns the current [`PathIndex`] snapshot and answers decoded
//! request URIs with a [`Response`]. It never produces protocol status codes:
//! the caller maps [`Response::NotFound`] and [`Response::NoContent`] to
//! whatever its protocol uses.
//!
//! # Thread Safety
//!
//! `Site` is designed for concurrent access:
//! - `index()` returns `Arc<PathIndex>` with minimal locking (just Arc clone)
//! - `reindex()` builds a fresh index outside the read lock and publishes it
//!   with a single swap, so in-flight requests keep their own snapshot
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gw_index::FsStorage;
//! use gw_site::{Response, Site, SiteConfig};
//!
//! let site = Site::new(Arc::new(FsStorage::new()), SiteConfig::default());
//!
//! if let Response::Document(body) = site.respond("wiki:syntax") {
//!     println!("{body}");
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use gw_index::{Blacklist, PathIndex, Storage};
use gw_markup::{Converter, LinkConfig, get_links};

use crate::navigator::Navigator;

/// Fence line opening and closing raw blocks in converted output.
const FENCE: &str = "```";

/// Page rendered for the root section when it exists.
const ROOT_PAGE: &str = "start";

/// Configuration for [`Site`].
#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Wiki data directory (contains `pages/` and `media/`).
    pub root: PathBuf,
    /// File names never indexed.
    pub blacklist: Blacklist,
    /// Link prefixes used by the converter and the navigation menus.
    pub links: LinkConfig,
    /// Heading of the root section when it has no `start` page.
    pub title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data"),
            blacklist: Blacklist::default(),
            links: LinkConfig::default(),
            title: "Wiki".to_owned(),
        }
    }
}

/// Answer to a request URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    /// Gemtext document.
    Document(String),
    /// Indexed media file to be streamed by the caller.
    Media(PathBuf),
    /// The page exists but converts to nothing.
    NoContent,
    /// Nothing indexed under this URI.
    NotFound,
}

/// Wiki site answering request URIs.
///
/// # Thread Safety
///
/// The index is published behind `RwLock<Arc<PathIndex>>`; readers clone the
/// `Arc` and release the lock immediately. `reload_lock` serializes rebuilds.
pub struct Site {
    storage: Arc<dyn Storage>,
    converter: Converter,
    config: SiteConfig,
    /// Serializes concurrent `reindex()` calls.
    reload_lock: Mutex<()>,
    /// Current index snapshot (atomically swappable).
    current_index: RwLock<Arc<PathIndex>>,
}

impl Site {
    /// Create a site and build its first index.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, config: SiteConfig) -> Self {
        let converter = Converter::dokuwiki(&config.links);
        let index = PathIndex::build(Arc::clone(&storage), &config.root, &config.blacklist);

        Self {
            storage,
            converter,
            config,
            reload_lock: Mutex::new(()),
            current_index: RwLock::new(Arc::new(index)),
        }
    }

    /// Current index snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn index(&self) -> Arc<PathIndex> {
        Arc::clone(&self.current_index.read().unwrap())
    }

    /// Rebuild the index from storage and publish it.
    ///
    /// Requests already holding the previous snapshot finish against it.
    ///
    /// # Panics
    ///
    /// Panics if internal locks are poisoned.
    pub fn reindex(&self) -> Arc<PathIndex> {
        let _guard = self.reload_lock.lock().unwrap();

        let index = Arc::new(PathIndex::build(
            Arc::clone(&self.storage),
            &self.config.root,
            &self.config.blacklist,
        ));
        *self.current_index.write().unwrap() = Arc::clone(&index);

        tracing::info!(nodes = index.len(), "Reindexed site");
        index
    }

    /// Site configuration.
    #[must_use]
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Converter used for pages.
    #[must_use]
    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    /// Answer a decoded request URI.
    ///
    /// Resolution order: media (under the media prefix), page, section.
    /// A name that is both a page and a section renders the page followed
    /// by the section menus.
    ///
    /// # Panics
    ///
    /// Panics if the internal `RwLock` is poisoned.
    #[must_use]
    pub fn respond(&self, uri: &str) -> Response {
        let index = self.index();
        let resolver = index.resolver();
        let uri = uri.trim_start_matches('/');

        if let Some(rest) = media_prefix(&self.config.links.media_root)
            .and_then(|prefix| uri.strip_prefix(prefix))
            .and_then(|rest| rest.strip_prefix('/'))
        {
            return resolver
                .media_uri_to_path(rest)
                .map_or(Response::NotFound, Response::Media);
        }

        if let Some(path) = resolver.page_uri_to_path(uri) {
            let menus = if resolver.uri_to_directory_path(uri).is_some() {
                self.menus(&index, uri)
            } else {
                Vec::new()
            };
            return self.render_page(&index, uri, &path, menus);
        }
        if resolver.uri_to_directory_path(uri).is_some() {
            return Response::Document(self.render_section(&index, uri));
        }

        tracing::debug!(uri, "Nothing indexed for URI");
        Response::NotFound
    }

    fn render_page(
        &self,
        index: &PathIndex,
        uri: &str,
        path: &Path,
        menus: Vec<String>,
    ) -> Response {
        let raw = match index.storage().read(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(uri, error = %e, "Indexed page unreadable");
                return Response::NotFound;
            }
        };

        let body = match self.convert_page(uri, &raw) {
            Some(text) => text,
            None if menus.is_empty() => return Response::NoContent,
            None => format!("# {uri}"),
        };

        let mut blocks = vec![body];
        blocks.extend(menus);
        Response::Document(blocks.join("\n\n"))
    }

    /// Convert a page and append link lines for absolute URLs it mentions
    /// outside fences.
    fn convert_page(&self, uri: &str, raw: &str) -> Option<String> {
        let conversion = self.converter.convert(raw)?;
        for warning in &conversion.warnings {
            tracing::warn!(uri, warning = %warning, "Conversion warning");
        }
        if conversion.text.is_empty() {
            return None;
        }

        let linked: HashSet<&str> = conversion
            .lines
            .iter()
            .filter_map(|line| line.strip_prefix("=> "))
            .filter_map(|rest| rest.split_whitespace().next())
            .collect();
        let extra: Vec<String> = get_links(&unfenced(&conversion.lines))
            .into_iter()
            .filter(|url| !linked.contains(url.as_str()))
            .map(|url| format!("=> {url}"))
            .collect();

        if extra.is_empty() {
            Some(conversion.text)
        } else {
            Some(format!("{}\n\n{}", conversion.text, extra.join("\n")))
        }
    }

    fn render_section(&self, index: &PathIndex, uri: &str) -> String {
        let mut blocks = Vec::new();

        let intro = self
            .section_page(index, uri)
            .and_then(|(page_uri, path)| {
                let raw = index.storage().read(&path).ok()?;
                self.convert_page(&page_uri, &raw)
            });
        blocks.push(intro.unwrap_or_else(|| {
            if uri.is_empty() {
                format!("# {}", self.config.title)
            } else {
                format!("# {uri}")
            }
        }));

        blocks.extend(self.menus(index, uri));
        blocks.join("\n\n")
    }

    /// `## Sections` and `## Pages` blocks of a section, skipping empty ones.
    fn menus(&self, index: &PathIndex, uri: &str) -> Vec<String> {
        let navigator = Navigator::new(index, &self.converter, &self.config.links.site_root);
        let mut blocks = Vec::new();

        let sections = navigator.child_sections(uri);
        if !sections.is_empty() {
            blocks.push(format!("## Sections\n{}", sections.join("\n")));
        }
        let pages = navigator.child_pages(uri);
        if !pages.is_empty() {
            blocks.push(format!("## Pages\n{}", pages.join("\n")));
        }
        blocks
    }

    /// Index page of a section: `ns:ns`, then `ns:start`; `start` at the root.
    fn section_page(&self, index: &PathIndex, uri: &str) -> Option<(String, PathBuf)> {
        let resolver = index.resolver();
        let candidates = if uri.is_empty() {
            vec![ROOT_PAGE.to_owned()]
        } else {
            let last = uri.rsplit(':').next().unwrap_or(uri);
            vec![format!("{uri}:{last}"), format!("{uri}:{ROOT_PAGE}")]
        };

        candidates.into_iter().find_map(|candidate| {
            resolver
                .page_uri_to_path(&candidate)
                .map(|path| (candidate, path))
        })
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("config", &self.config)
            .field("index", &self.index())
            .finish_non_exhaustive()
    }
}

/// Lines outside fences, joined with `\n`.
fn unfenced(lines: &[String]) -> String {
    let mut fenced = false;
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        if line.starts_with(FENCE) {
            fenced = !fenced;
        } else if !fenced {
            out.push(line.as_str());
        }
    }
    out.join("\n")
}

/// Request path prefix serving media, taken from the path part of `media_root`.
fn media_prefix(media_root: &str) -> Option<&str> {
    let path = match media_root.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("", |i| &rest[i..]),
        None => media_root,
    };
    let prefix = path.trim_matches('/');
    (!prefix.is_empty()).then_some(prefix)
}
