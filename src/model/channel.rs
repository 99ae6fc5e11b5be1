use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{HasAuthors, HasLinks, Item, Link};

/// Grammar family a feed document was parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dialect {
    /// RSS 1.0 (RDF Site Summary).
    Rss1,
    /// RSS 0.91, 0.92 and 2.0.
    Rss2,
    /// Atom 0.3, with Atom 1.0 element names tolerated.
    Atom,
}

/// Dialect plus the version string the document declared.
///
/// Displays as the dialect tag, e.g. `RSS 2.0`, `RSS 1.0`, `Atom 0.3`, or
/// just `Atom` when the feed carries no version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedFormat {
    pub dialect: Dialect,
    pub version: Option<String>,
}

impl FeedFormat {
    pub fn rss1() -> Self {
        Self {
            dialect: Dialect::Rss1,
            version: Some("1.0".to_string()),
        }
    }

    pub fn rss2(version: impl Into<String>) -> Self {
        Self {
            dialect: Dialect::Rss2,
            version: Some(version.into()),
        }
    }

    pub fn atom(version: Option<String>) -> Self {
        Self {
            dialect: Dialect::Atom,
            version,
        }
    }
}

impl fmt::Display for FeedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.dialect {
            Dialect::Rss1 | Dialect::Rss2 => "RSS",
            Dialect::Atom => "Atom",
        };
        match &self.version {
            Some(version) => write!(f, "{} {}", name, version),
            None => f.write_str(name),
        }
    }
}

/// A parsed feed: channel metadata plus its items in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub title: Option<String>,
    pub description: Option<String>,
    pub items: Vec<Item>,
    pub links: Vec<Link>,
    pub pub_date: Option<DateTime<Utc>>,
    pub copyright: Option<String>,
    pub format: FeedFormat,
    pub authors: Vec<String>,
    /// Atom `id` or RSS 1.0 `rdf:about`.
    pub id: Option<String>,
}

impl Channel {
    pub fn new(format: FeedFormat) -> Self {
        Self {
            title: None,
            description: None,
            items: Vec::new(),
            links: Vec::new(),
            pub_date: None,
            copyright: None,
            format,
            authors: Vec::new(),
            id: None,
        }
    }

    /// Appends an item and returns its index.
    pub fn push_item(&mut self, item: Item) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }
}

impl HasLinks for Channel {
    fn links(&self) -> &[Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }
}

impl HasAuthors for Channel {
    fn authors(&self) -> &[String] {
        &self.authors
    }

    fn authors_mut(&mut self) -> &mut Vec<String> {
        &mut self.authors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_display() {
        assert_eq!(FeedFormat::rss1().to_string(), "RSS 1.0");
        assert_eq!(FeedFormat::rss2("0.91").to_string(), "RSS 0.91");
        assert_eq!(FeedFormat::atom(Some("0.3".into())).to_string(), "Atom 0.3");
        assert_eq!(FeedFormat::atom(None).to_string(), "Atom");
    }

    #[test]
    fn test_push_item_returns_index() {
        let mut channel = Channel::new(FeedFormat::rss2("2.0"));
        assert_eq!(channel.push_item(Item::default()), 0);
        assert_eq!(channel.push_item(Item::default()), 1);
        assert_eq!(channel.items.len(), 2);
    }
}
