//! The normalized, dialect-independent feed model.
//!
//! Every supported dialect parses into the same shape: a [`Channel`] that
//! owns its [`Item`]s in document order. Both carry [`Link`]s and author
//! names, and share the lookups in [`HasLinks`] and [`HasAuthors`].

mod capabilities;
mod channel;
mod content;
mod item;
mod link;

pub use capabilities::{
    author, link_for, link_for_role, link_for_type, link_with_fallback, resolved_url,
    HasAuthors, HasLinks,
};
pub use channel::{Channel, Dialect, FeedFormat};
pub use content::{Content, DEFAULT_CONTENT_TYPE};
pub use item::Item;
pub use link::{Link, LinkChange, LinkObserver, LinkRole};
