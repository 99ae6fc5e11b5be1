use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::util::guess_mime_type;

/// What a link points at, relative to the element that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LinkRole {
    /// The feed document itself.
    #[serde(rename = "self")]
    SelfLink,
    /// A human-readable rendering of the channel or item.
    #[serde(rename = "alternate")]
    Alternate,
}

/// A mutation reported to a [`Link`]'s observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkChange {
    Url { old: Url, new: Url },
    MimeType { old: String, new: String },
    Role { old: LinkRole, new: LinkRole },
}

/// Callback invoked synchronously after a [`Link`] setter changes a value.
pub type LinkObserver = Arc<dyn Fn(&Link, &LinkChange) + Send + Sync>;

/// A URL tagged with a MIME type and a role.
///
/// The MIME type is never empty: a blank type is replaced with one guessed
/// from the URL path.
///
/// Post-processing code may attach one observer to hear about later edits.
/// The parser never installs one. Observers are not part of a link's
/// identity: they are skipped by `PartialEq`, `Debug` and serialization.
///
/// # Examples
///
/// ```
/// use minifeed::model::{Link, LinkRole};
/// use url::Url;
///
/// let url = Url::parse("https://example.com/feed.rss").unwrap();
/// let link = Link::new(url, "", LinkRole::SelfLink);
/// assert_eq!(link.mime_type(), "application/rss+xml");
/// ```
#[derive(Clone, Serialize)]
pub struct Link {
    url: Url,
    mime_type: String,
    role: LinkRole,
    #[serde(skip)]
    observer: Option<LinkObserver>,
}

impl Link {
    /// Creates a link. A blank `mime_type` is replaced by a guess from the URL.
    pub fn new(url: Url, mime_type: &str, role: LinkRole) -> Self {
        let mime_type = effective_mime_type(&url, mime_type);
        Self {
            url,
            mime_type,
            role,
            observer: None,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }

    /// Replaces the URL, notifying the observer if it changed.
    pub fn set_url(&mut self, url: Url) {
        if url == self.url {
            return;
        }
        let old = std::mem::replace(&mut self.url, url);
        let new = self.url.clone();
        self.notify(LinkChange::Url { old, new });
    }

    /// Replaces the MIME type, notifying the observer if it changed.
    ///
    /// A blank type is replaced by a guess from the current URL.
    pub fn set_mime_type(&mut self, mime_type: &str) {
        let mime_type = effective_mime_type(&self.url, mime_type);
        if mime_type == self.mime_type {
            return;
        }
        let old = std::mem::replace(&mut self.mime_type, mime_type);
        let new = self.mime_type.clone();
        self.notify(LinkChange::MimeType { old, new });
    }

    /// Replaces the role, notifying the observer if it changed.
    pub fn set_role(&mut self, role: LinkRole) {
        if role == self.role {
            return;
        }
        let old = std::mem::replace(&mut self.role, role);
        self.notify(LinkChange::Role { old, new: role });
    }

    /// Installs the change observer, returning the one it replaces.
    pub fn set_observer(&mut self, observer: LinkObserver) -> Option<LinkObserver> {
        self.observer.replace(observer)
    }

    /// Removes and returns the change observer.
    pub fn take_observer(&mut self) -> Option<LinkObserver> {
        self.observer.take()
    }

    fn notify(&self, change: LinkChange) {
        if let Some(observer) = self.observer.clone() {
            observer(self, &change);
        }
    }
}

fn effective_mime_type(url: &Url, mime_type: &str) -> String {
    let mime_type = mime_type.trim();
    if mime_type.is_empty() {
        guess_mime_type(url).to_string()
    } else {
        mime_type.to_string()
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("url", &self.url.as_str())
            .field("mime_type", &self.mime_type)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url && self.mime_type == other.mime_type && self.role == other.role
    }
}

impl Eq for Link {}
