//! Navigation and request handling for gemwiki.
//!
//! - [`Navigator`] builds sorted Gemtext menus of subsections and pages
//! - [`Site`] holds the swappable index snapshot and answers request URIs
//!   with a [`Response`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gw_index::FsStorage;
//! use gw_site::{Site, SiteConfig};
//!
//! let site = Site::new(Arc::new(FsStorage::new()), SiteConfig::default());
//! let index = site.index();
//! let nav = gw_site::Navigator::new(&index, site.converter(), "/");
//!
//! for line in nav.child_sections("") {
//!     println!("{line}");
//! }
//! ```

mod navigator;
mod site;

pub use navigator::Navigator;
pub use site::{Response, Site, SiteConfig};
