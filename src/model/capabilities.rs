//! Link and author lookups shared by channels and items.
//!
//! The algorithms are free functions over the [`HasLinks`] and [`HasAuthors`]
//! traits; the traits also expose them as provided methods.

use url::Url;

use super::{Link, LinkRole};
use crate::util::HTML_MIME_TYPE;

/// Anything that carries a list of [`Link`]s.
pub trait HasLinks {
    fn links(&self) -> &[Link];

    fn links_mut(&mut self) -> &mut Vec<Link>;

    fn add_link(&mut self, link: Link) {
        self.links_mut().push(link);
    }

    fn link_for(&self, mime_type: &str, roles: &[LinkRole]) -> Option<&Link> {
        link_for(self, mime_type, roles)
    }

    fn link_for_role(&self, role: LinkRole) -> Option<&Link> {
        link_for_role(self, role)
    }

    fn link_for_type(&self, mime_type: &str) -> Option<&Link> {
        link_for_type(self, mime_type)
    }

    fn link_with_fallback(&self, mime_type: &str) -> Option<&Link> {
        link_with_fallback(self, mime_type)
    }

    fn resolved_url(&self) -> Option<&Url> {
        resolved_url(self)
    }
}

/// Anything that carries a list of author names.
pub trait HasAuthors {
    fn authors(&self) -> &[String];

    fn authors_mut(&mut self) -> &mut Vec<String>;

    fn add_author(&mut self, name: impl Into<String>)
    where
        Self: Sized,
    {
        self.authors_mut().push(name.into());
    }

    fn author(&self) -> Option<String> {
        author(self)
    }
}

/// First link with the given MIME type whose role is one of `roles`.
pub fn link_for<'a, T>(owner: &'a T, mime_type: &str, roles: &[LinkRole]) -> Option<&'a Link>
where
    T: HasLinks + ?Sized,
{
    owner
        .links()
        .iter()
        .find(|link| link.mime_type().eq_ignore_ascii_case(mime_type) && roles.contains(&link.role()))
}

/// First link with the given role.
pub fn link_for_role<T: HasLinks + ?Sized>(owner: &T, role: LinkRole) -> Option<&Link> {
    owner.links().iter().find(|link| link.role() == role)
}

/// First link with the given MIME type.
pub fn link_for_type<'a, T: HasLinks + ?Sized>(owner: &'a T, mime_type: &str) -> Option<&'a Link> {
    owner
        .links()
        .iter()
        .find(|link| link.mime_type().eq_ignore_ascii_case(mime_type))
}

/// Link of the given MIME type, else the SELF link, else the first link.
pub fn link_with_fallback<'a, T: HasLinks + ?Sized>(
    owner: &'a T,
    mime_type: &str,
) -> Option<&'a Link> {
    link_for_type(owner, mime_type)
        .or_else(|| link_for_role(owner, LinkRole::SelfLink))
        .or_else(|| owner.links().first())
}

/// The URL that best identifies the owner.
///
/// Preference order: the SELF link, an ALTERNATE link typed `text/html`, the
/// first ALTERNATE link, the first `text/html` link.
///
/// # Examples
///
/// ```
/// use minifeed::model::{resolved_url, Channel, FeedFormat, HasLinks, Link, LinkRole};
/// use url::Url;
///
/// let mut channel = Channel::new(FeedFormat::rss2("2.0"));
/// let page = Url::parse("https://example.com/").unwrap();
/// let feed = Url::parse("https://example.com/feed.xml").unwrap();
/// channel.add_link(Link::new(page, "text/html", LinkRole::Alternate));
/// channel.add_link(Link::new(feed.clone(), "", LinkRole::SelfLink));
///
/// assert_eq!(resolved_url(&channel), Some(&feed));
/// ```
pub fn resolved_url<T: HasLinks + ?Sized>(owner: &T) -> Option<&Url> {
    link_for_role(owner, LinkRole::SelfLink)
        .or_else(|| link_for(owner, HTML_MIME_TYPE, &[LinkRole::Alternate]))
        .or_else(|| link_for_role(owner, LinkRole::Alternate))
        .or_else(|| link_for_type(owner, HTML_MIME_TYPE))
        .map(Link::url)
}

/// All author names joined with `", "`, or `None` when there are none.
pub fn author<T: HasAuthors + ?Sized>(owner: &T) -> Option<String> {
    let authors = owner.authors();
    if authors.is_empty() {
        None
    } else {
        Some(authors.join(", "))
    }
}
