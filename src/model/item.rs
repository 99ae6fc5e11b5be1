use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Channel, Content, HasAuthors, HasLinks, Link, DEFAULT_CONTENT_TYPE};
use crate::util::normalize_url;

/// One entry of a channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Item {
    pub title: Option<String>,
    pub summary: Option<String>,
    contents: Vec<Content>,
    pub links: Vec<Link>,
    pub pub_date: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
    pub authors: Vec<String>,
    /// Dialect-supplied unique id (RSS `guid`, Atom `id`, RSS 1.0 `rdf:about`).
    pub id: Option<String>,
}

impl Item {
    /// Content blocks in the order they were added.
    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    pub fn add_content(&mut self, content: Content) {
        self.contents.push(content);
    }

    /// Content of the given MIME type, falling back to the default block.
    pub fn content(&self, mime_type: &str) -> Option<&Content> {
        self.content_for(mime_type)
            .or_else(|| self.content_for(DEFAULT_CONTENT_TYPE))
    }

    /// Content of exactly the given MIME type.
    ///
    /// [`DEFAULT_CONTENT_TYPE`] always selects the first block added, whatever
    /// its real type.
    pub fn content_for(&self, mime_type: &str) -> Option<&Content> {
        if mime_type == DEFAULT_CONTENT_TYPE {
            return self.contents.first();
        }
        self.contents.iter().find(|c| c.is_type(mime_type))
    }

    /// Content for the first of `mime_types` that the item has.
    pub fn first_content_of_type(&self, mime_types: &[&str]) -> Option<&Content> {
        mime_types.iter().find_map(|mime_type| self.content_for(mime_type))
    }

    /// Publication date, inherited from the channel when the item has none.
    pub fn effective_date(&self, parent: &Channel) -> Option<DateTime<Utc>> {
        self.pub_date.or(parent.pub_date)
    }

    /// Key an external cache can use to recognize this item across runs:
    /// the unique id, else the normalized resolved URL.
    pub fn cache_key(&self) -> Option<String> {
        self.id
            .clone()
            .or_else(|| self.resolved_url().map(normalize_url))
    }
}

impl HasLinks for Item {
    fn links(&self) -> &[Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }
}

impl HasAuthors for Item {
    fn authors(&self) -> &[String] {
        &self.authors
    }

    fn authors_mut(&mut self) -> &mut Vec<String> {
        &mut self.authors
    }
}
