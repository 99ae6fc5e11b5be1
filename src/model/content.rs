use serde::Serialize;

/// Pseudo MIME type that always selects an item's first content block.
pub const DEFAULT_CONTENT_TYPE: &str = "*";

/// One body of an item, in one MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Content {
    mime_type: String,
    text: String,
}

impl Content {
    pub fn new(mime_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            text: text.into(),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether this block has the given MIME type, ignoring ASCII case.
    pub fn is_type(&self, mime_type: &str) -> bool {
        self.mime_type.eq_ignore_ascii_case(mime_type)
    }
}
