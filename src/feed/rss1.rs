//! RSS 1.0 (RDF Site Summary).
//!
//! Items are siblings of `<channel>` under `<rdf:RDF>` and belong to the
//! channel by document order alone. Identity comes from `rdf:about`
//! attributes; dates, authors and subjects from Dublin Core elements.

use super::event::Attributes;
use super::stack::{Closed, Context, FrameKind, Open, Target};
use super::ParseError;
use crate::model::{HasAuthors, HasLinks, Item, Link, LinkRole};
use crate::util::parse_link;

pub(crate) struct Rss1Grammar;

impl super::dialect::Grammar for Rss1Grammar {
    fn root_target(&self) -> Target {
        Target::Document
    }

    fn start(
        &self,
        cx: &mut Context<'_>,
        parent: &Target,
        name: &str,
        attrs: &Attributes,
    ) -> Result<Option<Open>, ParseError> {
        let open = match (parent, name) {
            (Target::Document, "channel") => {
                if let Some(about) = attrs.get_trimmed("rdf:about") {
                    cx.channel.id = Some(about.to_string());
                }
                Open::scope(Target::Channel)
            }
            (Target::Document | Target::Channel, "item") => {
                let mut item = Item::default();
                item.id = attrs.get_trimmed("rdf:about").map(str::to_string);
                Open::scope(Target::Item(cx.push_item(item)))
            }
            (
                Target::Channel,
                "title" | "link" | "description" | "dc:date" | "dc:creator" | "dc:rights",
            ) => Open::field(Target::Channel),
            (&Target::Item(index), "description") => Open::markup(Target::Item(index)),
            (
                &Target::Item(index),
                "title" | "link" | "dc:date" | "dc:creator" | "dc:subject",
            ) => Open::field(Target::Item(index)),
            _ => None,
        };
        Ok(open)
    }

    fn end(&self, cx: &mut Context<'_>, closed: Closed) -> Result<(), ParseError> {
        if closed.kind == FrameKind::Scope {
            if closed.target == Target::Channel {
                finish_channel(cx);
            }
            return Ok(());
        }
        let Some(text) = closed.text else {
            return Ok(());
        };
        let name = closed.name.as_str();

        match closed.target {
            Target::Channel => match name {
                "title" => cx.channel.title = Some(text),
                "description" => cx.channel.description = Some(text),
                "dc:rights" => cx.channel.copyright = Some(text),
                "dc:creator" => cx.channel.add_author(text),
                "link" => {
                    if let Some(link) = cx.link(&text, None, LinkRole::SelfLink)? {
                        cx.channel.add_link(link);
                    }
                }
                "dc:date" => {
                    if let Some(date) = cx.date(name, &text) {
                        cx.channel.pub_date = Some(date);
                    }
                }
                _ => {}
            },
            Target::Item(index) => match name {
                "title" => cx.item(index).title = Some(text),
                "description" => cx.item(index).summary = Some(text),
                "dc:subject" => cx.item(index).categories.push(text),
                "dc:creator" => cx.item(index).add_author(text),
                "link" => {
                    if let Some(link) = cx.link(&text, None, LinkRole::SelfLink)? {
                        cx.item(index).add_link(link);
                    }
                }
                "dc:date" => {
                    if let Some(date) = cx.date(name, &text) {
                        cx.item(index).pub_date = Some(date);
                    }
                }
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }
}

/// A channel without a `<link>` falls back to its `rdf:about` URI.
fn finish_channel(cx: &mut Context<'_>) {
    if !cx.channel.links.is_empty() {
        return;
    }
    let Some(about) = cx.channel.id.as_deref() else {
        return;
    };
    match parse_link(about) {
        Ok(url) => {
            let link = Link::new(url, "", LinkRole::SelfLink);
            cx.channel.add_link(link);
        }
        Err(e) => {
            tracing::debug!(about, error = %e, "Channel rdf:about is not a usable link");
        }
    }
}
