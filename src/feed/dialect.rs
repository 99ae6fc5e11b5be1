//! Root-element dispatch to a dialect grammar.

use super::atom::AtomGrammar;
use super::event::Attributes;
use super::rss1::Rss1Grammar;
use super::rss2::Rss2Grammar;
use super::stack::{Closed, Context, Open, Target};
use super::ParseError;
use crate::model::FeedFormat;

/// Element-to-model mapping for one dialect.
///
/// Grammars are stateless: everything a parse accumulates lives in the
/// session and the channel reached through [`Context`].
pub(crate) trait Grammar {
    /// Target of the root element's frame.
    fn root_target(&self) -> Target;

    /// Decides what a child element of a scope opens.
    ///
    /// `None` means the element is not part of the model, and it is skipped
    /// along with everything inside it. Elements whose data lives entirely in
    /// attributes are applied here and return `None`.
    fn start(
        &self,
        cx: &mut Context<'_>,
        parent: &Target,
        name: &str,
        attrs: &Attributes,
    ) -> Result<Option<Open>, ParseError>;

    /// Applies a closed field, or finishes a closed scope.
    fn end(&self, cx: &mut Context<'_>, closed: Closed) -> Result<(), ParseError>;
}

/// Selects the grammar for a document from its root element.
///
/// # Errors
///
/// [`ParseError::UnsupportedFormat`] for unknown roots and for `rss` roots
/// whose version is neither 0.9x nor 2.x.
pub(crate) fn select(
    name: &str,
    attrs: &Attributes,
) -> Result<(&'static dyn Grammar, FeedFormat), ParseError> {
    match name {
        "rdf:RDF" => Ok((&Rss1Grammar, FeedFormat::rss1())),
        "rss" => {
            let version = attrs.get("version").map(str::trim).unwrap_or("");
            if version.starts_with("0.9") || version.starts_with("2.") {
                Ok((&Rss2Grammar, FeedFormat::rss2(version)))
            } else {
                Err(ParseError::UnsupportedFormat(format!(
                    "RSS version \"{}\"",
                    version
                )))
            }
        }
        "feed" => {
            let version = attrs.get_trimmed("version").map(str::to_string);
            Ok((&AtomGrammar, FeedFormat::atom(version)))
        }
        other => Err(ParseError::UnsupportedFormat(format!(
            "unrecognized root element <{}>",
            other
        ))),
    }
}
