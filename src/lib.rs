//! minifeed: a tolerant parser for RSS 0.9x, RSS 1.0, RSS 2.0 and Atom 0.3
//! feeds.
//!
//! Every dialect is read into the same [`Channel`]/[`Item`] model, with
//! relative links resolved, dates normalized to UTC and broken character
//! references repaired.
//!
//! ```
//! let xml = br#"<feed version="0.3">
//!   <title>Example</title>
//!   <link rel="alternate" type="text/html" href="http://example.com/"/>
//!   <entry><title>Hello</title><issued>2024-01-02T15:04:05Z</issued></entry>
//! </feed>"#;
//!
//! let channel = minifeed::parse_feed(xml).unwrap();
//! assert_eq!(channel.format.to_string(), "Atom 0.3");
//! assert_eq!(channel.items[0].title.as_deref(), Some("Hello"));
//! ```

pub mod config;
pub mod date;
pub mod feed;
pub mod model;
pub mod util;

pub use config::{Config, ConfigError, ParserOptions};
pub use feed::{Document, FeedParser, ParseError};
pub use model::{Channel, Content, Item, Link, LinkRole};

/// Parses feed bytes with default options and no source URL.
///
/// # Errors
///
/// Any [`ParseError`]; in particular relative links that cannot be resolved
/// without a source URL are rejected, as with [`FeedParser::default`].
pub fn parse_feed(bytes: &[u8]) -> Result<Channel, ParseError> {
    FeedParser::default().parse_bytes(None, bytes, None)
}
