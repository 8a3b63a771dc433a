//! `DokuWiki` to Gemtext markup conversion.
//!
//! [`Converter`] rewrites `DokuWiki` pages into line-oriented Gemtext in three
//! passes over the input lines:
//!
//! 1. Raw block scanning: `<code>`/`<file>` blocks and existing fences are
//!    kept verbatim; every other line goes through the ordered [`RuleSet`]
//! 2. Table synthesis: `^`/`|` grids become fixed-width fenced blocks
//! 3. Assembly: placeholders are expanded, leftover tags stripped and blank
//!    line runs collapsed
//!
//! Conversion is idempotent: converting Gemtext produced by this crate
//! yields the same text again.
//!
//! [`get_h1`] and [`get_links`] extract the page title and absolute links
//! from converted text.
//!
//! # Example
//!
//! ```
//! use gw_markup::{Converter, LinkConfig, get_h1};
//!
//! let converter = Converter::dokuwiki(&LinkConfig::default());
//! let page = converter
//!     .convert("====== Syntax ======\nSee [[wiki:start|the start page]].")
//!     .unwrap();
//!
//! assert_eq!(get_h1(&page.text).as_deref(), Some("Syntax"));
//! assert!(page.lines.contains(&"=> /wiki:start the start page".to_owned()));
//! ```

mod block;
mod converter;
mod error;
mod extract;
mod rules;
mod table;

pub use converter::{Conversion, Converter};
pub use error::MarkupError;
pub use extract::{get_h1, get_links};
pub use rules::{ConversionRule, LinkConfig, ReplaceFn, Replacement, RuleSet};
