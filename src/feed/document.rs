//! A minimal pre-parsed XML tree.
//!
//! Callers that already hold a document (built by hand, or parsed once and
//! inspected before feed parsing) can hand it to
//! [`FeedParser::parse_document`](super::FeedParser::parse_document)
//! instead of re-tokenizing the bytes. Walking a tree produces exactly the
//! events the tokenizer would, so both paths yield the same channel.

use crate::config::ParserOptions;

use super::event::{Attributes, EventSink};
use super::source;
use super::ParseError;

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data with entities already resolved.
    Text(String),
}

/// An element with its qualified name, attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(&text.into());
        self
    }

    /// Appends character data, merging with a preceding text node.
    fn push_text(&mut self, text: &str) {
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    /// Concatenated text of the direct children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter_map(move |node| match node {
            Node::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }
}

// Descendants are detached onto a heap worklist so dropping a deep tree
// never recurses.
impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Element(mut element) = node {
                pending.append(&mut element.children);
            }
        }
    }
}

/// A parsed XML document: one root element.
///
/// # Examples
///
/// ```
/// use minifeed::feed::{Document, Element};
///
/// let doc = Document::parse_str("<rss version=\"2.0\"><channel/></rss>").unwrap();
/// assert_eq!(doc.root.name, "rss");
/// assert_eq!(doc.root.attributes.get("version"), Some("2.0"));
///
/// let built = Document::new(
///     Element::new("rss")
///         .with_attribute("version", "2.0")
///         .with_child(Element::new("channel")),
/// );
/// assert_eq!(doc, built);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parses XML text into a tree with the default nesting limit.
    ///
    /// Entity handling matches feed parsing: only the five predefined
    /// entities are resolved and CDATA becomes plain text.
    ///
    /// # Errors
    ///
    /// [`ParseError::Xml`] for tokenizer failures,
    /// [`ParseError::StructuralInconsistency`] for mismatched tags, a second
    /// root element, or a document without one, and
    /// [`ParseError::DepthExceeded`] past
    /// [`ParserOptions::DEFAULT_MAX_DEPTH`] levels.
    pub fn parse_str(xml: &str) -> Result<Self, ParseError> {
        Self::parse_str_with(xml, &ParserOptions::default())
    }

    /// Parses XML text into a tree, nesting at most `options.max_depth`
    /// elements deep.
    pub fn parse_str_with(xml: &str, options: &ParserOptions) -> Result<Self, ParseError> {
        let mut builder = TreeBuilder::new(options.max_depth);
        source::tokenize(xml, &mut builder)?;
        builder.finish()
    }

    /// Replays the tree as start/text/end events, without recursion.
    pub(crate) fn walk<S: EventSink>(&self, sink: &mut S) -> Result<(), ParseError> {
        enum Step<'d> {
            Open(&'d Element),
            Text(&'d str),
            Close(&'d str),
        }

        let mut steps = vec![Step::Open(&self.root)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Open(element) => {
                    sink.start(&element.name, &element.attributes)?;
                    steps.push(Step::Close(&element.name));
                    for child in element.children.iter().rev() {
                        steps.push(match child {
                            Node::Element(e) => Step::Open(e),
                            Node::Text(t) => Step::Text(t),
                        });
                    }
                }
                Step::Text(text) => sink.text(text)?,
                Step::Close(name) => sink.end(name)?,
            }
        }
        Ok(())
    }
}

struct TreeBuilder {
    open: Vec<Element>,
    root: Option<Element>,
    max_depth: usize,
}

impl TreeBuilder {
    fn new(max_depth: usize) -> Self {
        Self {
            open: Vec::new(),
            root: None,
            max_depth,
        }
    }

    fn finish(self) -> Result<Document, ParseError> {
        if let Some(element) = self.open.last() {
            return Err(ParseError::StructuralInconsistency(format!(
                "document ended inside <{}>",
                element.name
            )));
        }
        self.root.map(Document::new).ok_or_else(|| {
            ParseError::StructuralInconsistency("document has no root element".to_string())
        })
    }
}

impl EventSink for TreeBuilder {
    fn start(&mut self, name: &str, attrs: &Attributes) -> Result<(), ParseError> {
        if self.open.is_empty() && self.root.is_some() {
            return Err(ParseError::StructuralInconsistency(format!(
                "second root element <{}>",
                name
            )));
        }
        // SEC-003: Same nesting limit the feed session enforces
        if self.open.len() >= self.max_depth {
            return Err(ParseError::DepthExceeded(self.max_depth));
        }
        self.open.push(Element {
            name: name.to_string(),
            attributes: attrs.clone(),
            children: Vec::new(),
        });
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), ParseError> {
        if let Some(element) = self.open.last_mut() {
            element.push_text(text);
        }
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ParseError> {
        let element = self.open.pop().ok_or_else(|| {
            ParseError::StructuralInconsistency(format!(
                "closing tag </{}> with no open element",
                name
            ))
        })?;
        if element.name != name {
            return Err(ParseError::StructuralInconsistency(format!(
                "closing tag </{}> does not match open element <{}>",
                name, element.name
            )));
        }

        match self.open.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None => self.root = Some(element),
        }
        Ok(())
    }
}
