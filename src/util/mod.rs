//! Utility functions shared by the parser and the CLI.
//!
//! This module provides reusable utilities for:
//!
//! - **Character data**: newline folding and control-character stripping for
//!   accumulated element text, plus Unicode-aware truncation for display
//! - **Entity repair**: fixing publisher-mangled numeric character references
//! - **Links**: URL validation, repair of malformed item links, relative
//!   reference resolution and cache-key normalization
//!
//! # Examples
//!
//! ```
//! use minifeed::util::{demoronize, repair_link, truncate_to_width};
//!
//! assert_eq!(demoronize("&#147;quoted&#148;"), "\u{201C}quoted\u{201D}");
//!
//! let url = repair_link("13027@http://example.com/a").unwrap();
//! assert_eq!(url.as_str(), "http://example.com/a");
//!
//! assert_eq!(truncate_to_width("Long article title", 10), "Long ar...");
//! ```

mod entities;
mod links;
mod text;

pub use entities::{demoronize, unescape_predefined};
pub use links::{
    guess_mime_type, normalize_url, parse_link, repair_link, resolve_link, LinkError,
    ATOM_MIME_TYPE, HTML_MIME_TYPE, RSS_MIME_TYPE,
};
pub use text::{display_width, normalize_character_data, truncate_to_width};
