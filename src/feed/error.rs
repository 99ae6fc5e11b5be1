use thiserror::Error;

use crate::util::LinkError;

/// Errors that abort a feed parse.
///
/// Data-quality problems (unparsable dates, broken character references)
/// never surface here: they are repaired or left unset and the parse goes on.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Root element or declared version is not one this parser handles.
    #[error("Unsupported feed format: {0}")]
    UnsupportedFormat(String),

    /// Tags do not nest properly, or the document ends inside an element.
    #[error("Structural inconsistency: {0}")]
    StructuralInconsistency(String),

    /// A link could not be resolved or repaired into a valid URL.
    #[error("Malformed URL \"{url}\": {reason}")]
    MalformedUrl {
        url: String,
        #[source]
        reason: LinkError,
    },

    /// SEC-003: Element nesting exceeds the configured limit.
    #[error("Element nesting depth exceeds maximum of {0} levels")]
    DepthExceeded(usize),

    /// The tokenizer rejected the document.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A declared or configured character encoding label is not recognized.
    #[error("Unknown character encoding: {0}")]
    UnknownEncoding(String),

    /// Reading the feed bytes failed.
    #[error("Failed to read feed: {0}")]
    Io(#[from] std::io::Error),
}
