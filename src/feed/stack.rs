//! The element stack machine shared by every dialect.
//!
//! A [`Session`] receives start/text/end events, keeps one [`Frame`] per open
//! element and hands each closed element's text to the active grammar. The
//! grammar only decides what an element means; stack discipline, character
//! accumulation, markup capture and depth limits live here.

use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use url::Url;

use super::dialect::{self, Grammar};
use super::event::{Attributes, EventSink};
use super::ParseError;
use crate::config::ParserOptions;
use crate::date;
use crate::model::{Channel, HasLinks, Item, Link, LinkRole};
use crate::util::{demoronize, normalize_character_data, resolve_link};

/// Entity that owns an author context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owner {
    Channel,
    Item(usize),
}

/// What a frame's closing text is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// The root of a dialect whose channel is a child element.
    Document,
    Channel,
    /// Index into `Channel::items`.
    Item(usize),
    Author(Owner),
    /// A content block of the item, with its pending MIME type.
    Content { item: usize, mime_type: String },
    /// An element nested inside a markup field, serialized into that field.
    Markup,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameKind {
    /// Child elements are dispatched to the grammar.
    Scope,
    /// Text only; child elements are ignored.
    Field,
    /// Text plus child markup, which is serialized back into the text.
    Markup,
}

/// A grammar's decision for a newly opened element.
#[derive(Debug)]
pub(crate) struct Open {
    pub target: Target,
    pub kind: FrameKind,
}

impl Open {
    pub fn scope(target: Target) -> Option<Self> {
        Some(Self {
            target,
            kind: FrameKind::Scope,
        })
    }

    pub fn field(target: Target) -> Option<Self> {
        Some(Self {
            target,
            kind: FrameKind::Field,
        })
    }

    pub fn markup(target: Target) -> Option<Self> {
        Some(Self {
            target,
            kind: FrameKind::Markup,
        })
    }
}

/// A closed element handed back to the grammar.
#[derive(Debug)]
pub(crate) struct Closed {
    pub name: String,
    pub target: Target,
    pub kind: FrameKind,
    /// Repaired, trimmed text; `None` when nothing but whitespace was seen.
    pub text: Option<String>,
}

#[derive(Debug)]
struct Frame {
    name: String,
    text: String,
    target: Target,
    kind: FrameKind,
    /// Whether the buffered text ends inside a newline run.
    after_newline: bool,
    /// Whether child markup has been serialized into `text`. From then on
    /// the buffer holds escaped markup rather than plain character data.
    has_markup: bool,
}

impl Frame {
    fn collects_text(&self) -> bool {
        !matches!(self.kind, FrameKind::Scope) && !matches!(self.target, Target::Ignored)
    }

    fn push_text(&mut self, text: &str) {
        let normalized = normalize_character_data(text, &mut self.after_newline);
        if self.has_markup {
            // Repair references before escaping, or they turn into `&amp;#..;`
            self.text.push_str(&escape(demoronize(&normalized).as_ref()));
        } else {
            self.text.push_str(&normalized);
        }
    }

    /// Escapes the plain text collected so far so it sits alongside the
    /// serialized child markup that follows.
    fn begin_markup(&mut self) {
        if self.has_markup {
            return;
        }
        let escaped = escape(demoronize(&self.text).as_ref()).into_owned();
        self.text = escaped;
        self.has_markup = true;
    }
}

/// Model access and shared helpers handed to grammars.
pub(crate) struct Context<'s> {
    pub channel: &'s mut Channel,
    options: &'s ParserOptions,
    source_url: Option<&'s Url>,
}

impl Context<'_> {
    /// The item at `index`. Indices come from [`Channel::push_item`] during
    /// this parse, so they are always in range.
    pub fn item(&mut self, index: usize) -> &mut Item {
        &mut self.channel.items[index]
    }

    pub fn push_item(&mut self, item: Item) -> usize {
        self.channel.push_item(item)
    }

    /// Builds a link from element text or an `href` attribute.
    ///
    /// Relative references resolve against the channel's links (SELF links
    /// first) and then the source URL; anything else that fails to parse
    /// goes through link repair. An unusable link is fatal when
    /// `strict_links` is set, and otherwise dropped with a warning.
    pub fn link(
        &self,
        text: &str,
        mime_type: Option<&str>,
        role: LinkRole,
    ) -> Result<Option<Link>, ParseError> {
        let self_links = self
            .channel
            .links()
            .iter()
            .filter(|l| l.role() == LinkRole::SelfLink);
        let other_links = self
            .channel
            .links()
            .iter()
            .filter(|l| l.role() != LinkRole::SelfLink);
        let bases = self_links
            .chain(other_links)
            .map(Link::url)
            .chain(self.source_url);

        match resolve_link(text, bases) {
            Ok(url) => Ok(Some(Link::new(url, mime_type.unwrap_or(""), role))),
            Err(reason) if self.options.strict_links => Err(ParseError::MalformedUrl {
                url: text.to_string(),
                reason,
            }),
            Err(reason) => {
                tracing::warn!(
                    url = %text,
                    source = ?self.source_url.map(Url::as_str),
                    error = %reason,
                    "Dropping unusable link"
                );
                Ok(None)
            }
        }
    }

    /// Parses a date element, logging values that cannot be read.
    pub fn date(&self, element: &str, text: &str) -> Option<DateTime<Utc>> {
        let parsed = date::parse(text);
        if parsed.is_none() {
            tracing::debug!(element, value = %text, "Ignoring unparsable date");
        }
        parsed
    }
}

struct Active {
    grammar: &'static dyn Grammar,
    channel: Channel,
}

/// State of one parse: the element stack and the channel under construction.
pub(crate) struct Session<'a> {
    options: &'a ParserOptions,
    source_url: Option<&'a Url>,
    active: Option<Active>,
    frames: Vec<Frame>,
}

impl<'a> Session<'a> {
    pub fn new(options: &'a ParserOptions, source_url: Option<&'a Url>) -> Self {
        Self {
            options,
            source_url,
            active: None,
            frames: Vec::new(),
        }
    }

    /// Ends the parse, returning the channel if the document was complete.
    pub fn finish(self) -> Result<Channel, ParseError> {
        if let Some(frame) = self.frames.last() {
            return Err(ParseError::StructuralInconsistency(format!(
                "document ended inside <{}> ({} element(s) still open)",
                frame.name,
                self.frames.len()
            )));
        }

        match self.active {
            Some(active) => Ok(active.channel),
            None => Err(ParseError::StructuralInconsistency(
                "document has no root element".to_string(),
            )),
        }
    }

    fn start_root(&mut self, name: &str, attrs: &Attributes) -> Result<(), ParseError> {
        let (grammar, format) = dialect::select(name, attrs)?;
        tracing::debug!(
            format = %format,
            source = ?self.source_url.map(Url::as_str),
            "Detected feed dialect"
        );
        self.active = Some(Active {
            grammar,
            channel: Channel::new(format),
        });
        self.push(name, grammar.root_target(), FrameKind::Scope)
    }

    fn push(&mut self, name: &str, target: Target, kind: FrameKind) -> Result<(), ParseError> {
        // SEC-003: Reject excessively nested documents
        if self.frames.len() >= self.options.max_depth {
            return Err(ParseError::DepthExceeded(self.options.max_depth));
        }
        self.frames.push(Frame {
            name: name.to_string(),
            text: String::new(),
            target,
            kind,
            after_newline: true,
            has_markup: false,
        });
        Ok(())
    }

    /// The markup field that nested markup frames serialize into.
    fn markup_owner(&mut self) -> Option<&mut Frame> {
        self.frames
            .iter_mut()
            .rev()
            .find(|f| !matches!(f.target, Target::Markup))
    }

    fn dispatch_start(
        &mut self,
        parent: &Target,
        name: &str,
        attrs: &Attributes,
    ) -> Result<Option<Open>, ParseError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(None);
        };
        let grammar = active.grammar;
        let mut cx = Context {
            channel: &mut active.channel,
            options: self.options,
            source_url: self.source_url,
        };
        grammar.start(&mut cx, parent, name, attrs)
    }

    fn write_start_tag(&mut self, name: &str, attrs: &Attributes) {
        if let Some(owner) = self.markup_owner() {
            owner.begin_markup();
            owner.text.push('<');
            owner.text.push_str(name);
            for (key, value) in attrs.iter() {
                owner.text.push(' ');
                owner.text.push_str(key);
                owner.text.push_str("=\"");
                owner.text.push_str(&escape(value));
                owner.text.push('"');
            }
            owner.text.push('>');
            owner.after_newline = false;
        }
    }

    fn write_end_tag(&mut self, name: &str) {
        if let Some(owner) = self.markup_owner() {
            owner.text.push_str("</");
            owner.text.push_str(name);
            owner.text.push('>');
            owner.after_newline = false;
        }
    }
}

impl EventSink for Session<'_> {
    fn start(&mut self, name: &str, attrs: &Attributes) -> Result<(), ParseError> {
        if self.active.is_none() {
            return self.start_root(name, attrs);
        }
        let Some(top) = self.frames.last() else {
            return Err(ParseError::StructuralInconsistency(format!(
                "second root element <{}>",
                name
            )));
        };
        let (parent, parent_kind) = (top.target.clone(), top.kind);

        let (target, kind) = match (parent, parent_kind) {
            (Target::Ignored, _) => (Target::Ignored, FrameKind::Field),
            (Target::Markup, _) | (_, FrameKind::Markup) => {
                self.write_start_tag(name, attrs);
                (Target::Markup, FrameKind::Markup)
            }
            (_, FrameKind::Field) => (Target::Ignored, FrameKind::Field),
            (parent, FrameKind::Scope) => match self.dispatch_start(&parent, name, attrs)? {
                Some(open) => (open.target, open.kind),
                None => (Target::Ignored, FrameKind::Field),
            },
        };

        self.push(name, target, kind)
    }

    fn text(&mut self, text: &str) -> Result<(), ParseError> {
        let Some(top) = self.frames.last() else {
            // Whitespace around the root element
            return Ok(());
        };

        let frame = if matches!(top.target, Target::Markup) {
            self.markup_owner()
        } else if top.collects_text() {
            self.frames.last_mut()
        } else {
            None
        };
        if let Some(frame) = frame {
            frame.push_text(text);
        }
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), ParseError> {
        let frame = self.frames.pop().ok_or_else(|| {
            ParseError::StructuralInconsistency(format!(
                "closing tag </{}> with no open element",
                name
            ))
        })?;

        if frame.name != name {
            return Err(ParseError::StructuralInconsistency(format!(
                "closing tag </{}> does not match open element <{}>",
                name, frame.name
            )));
        }

        match frame.target {
            Target::Ignored => Ok(()),
            Target::Markup => {
                self.write_end_tag(name);
                Ok(())
            }
            target => {
                let Some(active) = self.active.as_mut() else {
                    return Ok(());
                };
                let text = demoronize(&frame.text).trim().to_string();
                let closed = Closed {
                    name: frame.name,
                    target,
                    kind: frame.kind,
                    text: Some(text).filter(|t| !t.is_empty()),
                };
                let grammar = active.grammar;
                let mut cx = Context {
                    channel: &mut active.channel,
                    options: self.options,
                    source_url: self.source_url,
                };
                grammar.end(&mut cx, closed)
            }
        }
    }
}
