use super::ParseError;

/// Attributes of one element, in document order, with values unescaped.
///
/// Names are kept qualified as written (`rdf:about`, `xml:lang`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute. A repeated name keeps its first value on lookup.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Value of the named attribute, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the named attribute, trimmed, or `None` when absent or blank.
    pub fn get_trimmed(&self, name: &str) -> Option<&str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Receiver of the structural events produced by an event source.
///
/// Both event sources (the XML tokenizer and the [`Document`] walker) drive
/// the same sinks, so a parse behaves identically whichever one supplies it.
///
/// [`Document`]: super::Document
pub(crate) trait EventSink {
    fn start(&mut self, name: &str, attrs: &Attributes) -> Result<(), ParseError>;

    /// Character data, already unescaped. May arrive in several chunks.
    fn text(&mut self, text: &str) -> Result<(), ParseError>;

    fn end(&mut self, name: &str) -> Result<(), ParseError>;
}
