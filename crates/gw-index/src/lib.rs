//! Content tree indexing for gemwiki.
//!
//! This crate owns everything that turns untrusted request URIs into
//! filesystem paths:
//!
//! - [`Storage`] abstracts the storage I/O the index needs (read, existence checks, list)
//! - [`FsStorage`] implements it over the local filesystem
//! - [`PathIndex`] scans a wiki data directory once and keeps the trusted set
//!   of discovered paths plus a directory → members map
//! - [`UriResolver`] translates colon-delimited URIs to paths and back, never
//!   returning a path the index did not discover
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gw_index::{Blacklist, FsStorage, PathIndex};
//!
//! let index = PathIndex::build(Arc::new(FsStorage::new()), "data", &Blacklist::default());
//! let resolver = index.resolver();
//!
//! if let Some(path) = resolver.page_uri_to_path("wiki:syntax") {
//!     println!("{}", path.display());
//! }
//! ```

mod fs;
mod index;
#[cfg(feature = "mock")]
mod mock;
mod resolver;
mod storage;

pub use fs::FsStorage;
pub use index::{Blacklist, ContentNode, NodeKind, PathIndex};
#[cfg(feature = "mock")]
pub use mock::MockStorage;
pub use resolver::{UriResolver, encode_uri};
pub use storage::{DirEntry, EntryKind, Storage, StorageError, StorageErrorKind};
