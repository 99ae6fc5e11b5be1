//! Feed parsing for RSS 0.9x, RSS 1.0, RSS 2.0 and Atom 0.3.
//!
//! The root element selects a dialect grammar; from then on a shared element
//! stack machine feeds closed elements to that grammar, which fills in a
//! [`Channel`]. Events come either from the quick-xml tokenizer over decoded
//! bytes or from a walk over a pre-parsed [`Document`].
//!
//! # Example
//!
//! ```
//! use minifeed::feed::FeedParser;
//!
//! let xml = r#"<rss version="2.0"><channel>
//!   <title>Example</title>
//!   <link>http://example.com/</link>
//!   <item><title>First</title><link>/first</link></item>
//! </channel></rss>"#;
//!
//! let channel = FeedParser::default().parse_str(None, xml).unwrap();
//! assert_eq!(channel.title.as_deref(), Some("Example"));
//! assert_eq!(channel.items[0].title.as_deref(), Some("First"));
//! ```

mod atom;
mod dialect;
mod document;
mod error;
mod event;
mod rss1;
mod rss2;
mod source;
mod stack;

use std::io::Read;

use url::Url;

use crate::config::ParserOptions;
use crate::model::Channel;

pub use document::{Document, Element, Node};
pub use error::ParseError;
pub use event::Attributes;

/// Entry point for parsing feeds.
///
/// Holds only immutable options; every call runs its own session, so one
/// parser can be shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct FeedParser {
    options: ParserOptions,
}

impl FeedParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Reads and parses a feed.
    ///
    /// `source_url` is the address the feed was fetched from; relative links
    /// fall back to it when the channel has no link of its own.
    /// `encoding` overrides whatever the document says about itself.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`]. No partial channel is returned.
    pub fn parse(
        &self,
        source_url: Option<&Url>,
        mut reader: impl Read,
        encoding: Option<&str>,
    ) -> Result<Channel, ParseError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.parse_bytes(source_url, &bytes, encoding)
    }

    /// Parses feed bytes already in memory.
    pub fn parse_bytes(
        &self,
        source_url: Option<&Url>,
        bytes: &[u8],
        encoding: Option<&str>,
    ) -> Result<Channel, ParseError> {
        let xml = source::decode(bytes, encoding, self.options.default_encoding.as_deref())?;
        self.parse_str(source_url, &xml)
    }

    /// Parses feed text.
    pub fn parse_str(&self, source_url: Option<&Url>, xml: &str) -> Result<Channel, ParseError> {
        let mut session = stack::Session::new(&self.options, source_url);
        source::tokenize(xml, &mut session)?;
        let channel = session.finish()?;
        log_parsed(&channel, source_url);
        Ok(channel)
    }

    /// Parses a pre-parsed document tree.
    pub fn parse_document(
        &self,
        document: &Document,
        source_url: Option<&Url>,
    ) -> Result<Channel, ParseError> {
        let mut session = stack::Session::new(&self.options, source_url);
        document.walk(&mut session)?;
        let channel = session.finish()?;
        log_parsed(&channel, source_url);
        Ok(channel)
    }
}

fn log_parsed(channel: &Channel, source_url: Option<&Url>) {
    tracing::debug!(
        format = %channel.format,
        items = channel.items.len(),
        source = ?source_url.map(Url::as_str),
        "Parsed feed"
    );
}
