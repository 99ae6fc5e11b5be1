//! Atom 0.3, tolerating the Atom 1.0 element names.
//!
//! The root `<feed>` element is the channel itself. Links carry their URL in
//! attributes, authors are nested `<author><name>` structures, and
//! `<content>` selects its MIME type with a `type` attribute.

use super::event::Attributes;
use super::stack::{Closed, Context, FrameKind, Open, Owner, Target};
use super::ParseError;
use crate::model::{Content, HasAuthors, HasLinks, Item, LinkRole};
use crate::util::ATOM_MIME_TYPE;

/// MIME type of `<content>` without a usable `type` attribute.
const DEFAULT_ATOM_CONTENT_TYPE: &str = "text/plain";

/// Elements that may carry a channel or entry date. The last one seen wins.
const DATE_ELEMENTS: &[&str] = &["issued", "modified", "created", "published", "updated"];

pub(crate) struct AtomGrammar;

impl super::dialect::Grammar for AtomGrammar {
    fn root_target(&self) -> Target {
        Target::Channel
    }

    fn start(
        &self,
        cx: &mut Context<'_>,
        parent: &Target,
        name: &str,
        attrs: &Attributes,
    ) -> Result<Option<Open>, ParseError> {
        let open = match (parent, name) {
            (Target::Channel, "entry") => {
                let index = cx.push_item(Item::default());
                Open::scope(Target::Item(index))
            }
            (Target::Channel, "author" | "contributor") => {
                Open::scope(Target::Author(Owner::Channel))
            }
            (&Target::Item(index), "author" | "contributor") => {
                Open::scope(Target::Author(Owner::Item(index)))
            }
            (&Target::Author(owner), "name") => Open::field(Target::Author(owner)),
            (Target::Channel, "link") => {
                link(cx, Owner::Channel, attrs)?;
                None
            }
            (&Target::Item(index), "link") => {
                link(cx, Owner::Item(index), attrs)?;
                None
            }
            (&Target::Item(index), "category") => {
                if let Some(term) = attrs.get_trimmed("term") {
                    cx.item(index).categories.push(term.to_string());
                }
                None
            }
            (&Target::Item(index), "summary") => Open::markup(Target::Item(index)),
            (&Target::Item(index), "content") => Open::markup(Target::Content {
                item: index,
                mime_type: content_type(attrs.get("type")),
            }),
            (Target::Channel, "title" | "id" | "tagline" | "subtitle" | "copyright" | "rights") => {
                Open::field(Target::Channel)
            }
            (&Target::Item(index), "title" | "id") => Open::field(Target::Item(index)),
            (Target::Channel, date) if DATE_ELEMENTS.contains(&date) => {
                Open::field(Target::Channel)
            }
            (&Target::Item(index), date) if DATE_ELEMENTS.contains(&date) => {
                Open::field(Target::Item(index))
            }
            _ => None,
        };
        Ok(open)
    }

    fn end(&self, cx: &mut Context<'_>, closed: Closed) -> Result<(), ParseError> {
        if closed.kind == FrameKind::Scope {
            return Ok(());
        }
        let Some(text) = closed.text else {
            return Ok(());
        };
        let name = closed.name.as_str();

        match closed.target {
            Target::Channel => match name {
                "title" => cx.channel.title = Some(text),
                "id" => cx.channel.id = Some(text),
                "tagline" | "subtitle" => cx.channel.description = Some(text),
                "copyright" | "rights" => cx.channel.copyright = Some(text),
                date if DATE_ELEMENTS.contains(&date) => {
                    if let Some(parsed) = cx.date(date, &text) {
                        cx.channel.pub_date = Some(parsed);
                    }
                }
                _ => {}
            },
            Target::Item(index) => match name {
                "title" => cx.item(index).title = Some(text),
                "id" => cx.item(index).id = Some(text),
                "summary" => cx.item(index).summary = Some(text),
                date if DATE_ELEMENTS.contains(&date) => {
                    if let Some(parsed) = cx.date(date, &text) {
                        cx.item(index).pub_date = Some(parsed);
                    }
                }
                _ => {}
            },
            Target::Author(Owner::Channel) => cx.channel.add_author(text),
            Target::Author(Owner::Item(index)) => cx.item(index).add_author(text),
            Target::Content { item, mime_type } => {
                cx.item(item).add_content(Content::new(mime_type, text));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Maps a `<content type>` to a MIME type.
///
/// Atom 1.0 short forms are expanded; anything else is used verbatim.
fn content_type(attr: Option<&str>) -> String {
    match attr.map(str::trim) {
        None | Some("") | Some("text") => DEFAULT_ATOM_CONTENT_TYPE.to_string(),
        Some("html") => "text/html".to_string(),
        Some("xhtml") => "application/xhtml+xml".to_string(),
        Some(other) => other.to_string(),
    }
}

/// `<link href rel type/>`. Only `alternate` and `self` links are kept.
fn link(cx: &mut Context<'_>, owner: Owner, attrs: &Attributes) -> Result<(), ParseError> {
    let Some(href) = attrs.get_trimmed("href") else {
        tracing::debug!("Skipping Atom link without href");
        return Ok(());
    };
    let role = match attrs.get_trimmed("rel") {
        None | Some("alternate") => LinkRole::Alternate,
        Some("self") => LinkRole::SelfLink,
        Some(other) => {
            tracing::debug!(rel = other, href, "Skipping Atom link with unsupported rel");
            return Ok(());
        }
    };
    let mime_type = attrs
        .get_trimmed("type")
        .or((role == LinkRole::SelfLink).then_some(ATOM_MIME_TYPE));

    if let Some(link) = cx.link(href, mime_type, role)? {
        match owner {
            Owner::Channel => cx.channel.add_link(link),
            Owner::Item(index) => cx.item(index).add_link(link),
        }
    }
    Ok(())
}
