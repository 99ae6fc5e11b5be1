//! RSS 0.91, 0.92 and 2.0.
//!
//! The 0.9x and 2.0 lines are close enough to share one table. `<item>`
//! is accepted directly under the root as well as under `<channel>`, since
//! some 0.9x feeds were written that way.

use super::event::Attributes;
use super::stack::{Closed, Context, FrameKind, Open, Target};
use super::ParseError;
use crate::model::{Content, HasAuthors, HasLinks, Item, LinkRole};
use crate::util::{HTML_MIME_TYPE, RSS_MIME_TYPE};

pub(crate) struct Rss2Grammar;

impl super::dialect::Grammar for Rss2Grammar {
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
            (Target::Document, "channel") => Open::scope(Target::Channel),
            (Target::Document | Target::Channel, "item") => {
                let index = cx.push_item(Item::default());
                Open::scope(Target::Item(index))
            }
            (Target::Channel, "atom:link") => {
                atom_link(cx, attrs)?;
                None
            }
            (
                Target::Channel,
                "title" | "link" | "description" | "pubDate" | "lastBuildDate" | "copyright"
                | "managingEditor" | "dc:creator" | "dc:date",
            ) => Open::field(Target::Channel),
            (&Target::Item(index), "description") => Open::markup(Target::Item(index)),
            (&Target::Item(index), "content:encoded") => Open::markup(Target::Content {
                item: index,
                mime_type: HTML_MIME_TYPE.to_string(),
            }),
            (
                &Target::Item(index),
                "title" | "link" | "pubDate" | "dc:date" | "category" | "guid" | "author"
                | "dc:creator",
            ) => Open::field(Target::Item(index)),
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
                "description" => cx.channel.description = Some(text),
                "copyright" => cx.channel.copyright = Some(text),
                "managingEditor" | "dc:creator" => cx.channel.add_author(text),
                "link" => {
                    if let Some(link) = cx.link(&text, None, LinkRole::SelfLink)? {
                        cx.channel.add_link(link);
                    }
                }
                "pubDate" | "dc:date" => {
                    if let Some(date) = cx.date(name, &text) {
                        cx.channel.pub_date = Some(date);
                    }
                }
                "lastBuildDate" if cx.channel.pub_date.is_none() => {
                    cx.channel.pub_date = cx.date(name, &text);
                }
                _ => {}
            },
            Target::Item(index) => match name {
                "title" => cx.item(index).title = Some(text),
                "description" => cx.item(index).summary = Some(text),
                "guid" => cx.item(index).id = Some(text),
                "category" => cx.item(index).categories.push(text),
                "author" | "dc:creator" => cx.item(index).add_author(text),
                "link" => {
                    if let Some(link) = cx.link(&text, None, LinkRole::SelfLink)? {
                        cx.item(index).add_link(link);
                    }
                }
                "pubDate" | "dc:date" => {
                    if let Some(date) = cx.date(name, &text) {
                        cx.item(index).pub_date = Some(date);
                    }
                }
                _ => {}
            },
            Target::Content { item, mime_type } => {
                cx.item(item).add_content(Content::new(mime_type, text));
            }
            _ => {}
        }
        Ok(())
    }
}

/// `<atom:link href rel type/>` inside an RSS channel.
fn atom_link(cx: &mut Context<'_>, attrs: &Attributes) -> Result<(), ParseError> {
    let Some(href) = attrs.get_trimmed("href") else {
        return Ok(());
    };
    let role = match attrs.get_trimmed("rel") {
        None | Some("alternate") => LinkRole::Alternate,
        Some("self") => LinkRole::SelfLink,
        Some(other) => {
            tracing::debug!(rel = other, href, "Skipping atom:link with unsupported rel");
            return Ok(());
        }
    };
    let mime_type = attrs
        .get_trimmed("type")
        .or((role == LinkRole::SelfLink).then_some(RSS_MIME_TYPE));

    if let Some(link) = cx.link(href, mime_type, role)? {
        cx.channel.add_link(link);
    }
    Ok(())
}
