//! Byte decoding and XML tokenizing.

use std::borrow::Cow;
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex_lite::Regex;

use super::event::{Attributes, EventSink};
use super::ParseError;
use crate::util::unescape_predefined;

/// How much of the document is searched for an XML declaration.
const DECLARATION_SNIFF_LEN: usize = 1024;

static XML_DECL_ENCODING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*<\?xml[^>]*?\sencoding\s*=\s*["']([A-Za-z0-9._:\-]+)["']"#).unwrap()
});

/// Decodes feed bytes to text.
///
/// The encoding is chosen from, in order: the caller's declared label, a
/// byte order mark, the XML declaration's `encoding`, the configured
/// default, and finally UTF-8. Malformed sequences become U+FFFD.
///
/// # Errors
///
/// [`ParseError::UnknownEncoding`] when the declared label or the configured
/// default is not a known encoding. An unknown label inside the document is
/// only logged.
pub(crate) fn decode<'b>(
    bytes: &'b [u8],
    declared: Option<&str>,
    default: Option<&str>,
) -> Result<Cow<'b, str>, ParseError> {
    if let Some(label) = declared {
        let encoding = lookup(label)?;
        let (text, malformed) = encoding.decode_with_bom_removal(bytes);
        log_malformed(encoding, malformed);
        return Ok(text);
    }

    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => match sniff_declaration(bytes) {
            Some(encoding) => encoding,
            None => default.map(lookup).transpose()?.unwrap_or(UTF_8),
        },
    };

    let (text, malformed) = encoding.decode_with_bom_removal(bytes);
    log_malformed(encoding, malformed);
    Ok(text)
}

fn lookup(label: &str) -> Result<&'static Encoding, ParseError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ParseError::UnknownEncoding(label.to_string()))
}

fn log_malformed(encoding: &'static Encoding, malformed: bool) {
    if malformed {
        tracing::debug!(
            encoding = encoding.name(),
            "Replaced malformed byte sequences while decoding feed"
        );
    }
}

/// Reads the `encoding` pseudo-attribute of an ASCII-compatible XML
/// declaration.
fn sniff_declaration(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(DECLARATION_SNIFF_LEN)];
    let head = String::from_utf8_lossy(head);
    let label = XML_DECL_ENCODING_RE.captures(&head)?.get(1)?.as_str().to_string();

    match Encoding::for_label(label.as_bytes()) {
        // The declaration was readable as ASCII, so the bytes cannot be UTF-16
        Some(encoding) if encoding == UTF_16LE || encoding == UTF_16BE => Some(UTF_8),
        Some(encoding) => Some(encoding),
        None => {
            tracing::debug!(label = %label, "Ignoring unknown encoding in XML declaration");
            None
        }
    }
}

/// Tokenizes an XML document into sink events.
///
/// Text and attribute values reach the sink with only the five predefined
/// entities resolved; numeric references are left for entity repair and
/// undeclared named entities are kept verbatim. CDATA sections pass through
/// raw. Comments, processing instructions and the DOCTYPE are skipped.
pub(crate) fn tokenize<S: EventSink>(xml: &str, sink: &mut S) -> Result<(), ParseError> {
    // SEC-002: XXE protection — quick-xml (0.37) never parses <!ENTITY> declarations from
    // DOCTYPE, and entity references are resolved only by `unescape_predefined()` and
    // `decode_and_unescape_value()`, which know nothing beyond the 5 XML builtins.
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.expand_empty_elements = true;
    // End-tag mismatches are reported by the sink with element context
    config.check_end_names = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(e.name().into_inner());
                let attrs = attributes(&e, &reader);
                sink.start(&name, &attrs)?;
            }
            Event::End(e) => {
                let name = element_name(e.name().into_inner());
                sink.end(&name)?;
            }
            Event::Text(e) => {
                let raw = String::from_utf8_lossy(&e);
                sink.text(&unescape_predefined(&raw))?;
            }
            Event::CData(e) => {
                sink.text(&String::from_utf8_lossy(&e))?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

fn element_name(raw: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(raw)
}

fn attributes(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Attributes {
    let mut attrs = Attributes::new();

    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.decode_and_unescape_value(reader.decoder()) {
            Ok(value) => value.into_owned(),
            Err(e) => {
                // Undeclared entities such as &nbsp; are kept verbatim
                tracing::debug!(attribute = %key, error = %e, "Falling back to lenient unescape");
                let raw = String::from_utf8_lossy(&attr.value);
                unescape_predefined(&raw).into_owned()
            }
        };
        attrs.push(key, value);
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl EventSink for Recorder {
        fn start(&mut self, name: &str, attrs: &Attributes) -> Result<(), ParseError> {
            let attrs: Vec<String> = attrs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            self.0.push(format!("start {} [{}]", name, attrs.join(",")));
            Ok(())
        }

        fn text(&mut self, text: &str) -> Result<(), ParseError> {
            if !text.trim().is_empty() {
                self.0.push(format!("text {}", text));
            }
            Ok(())
        }

        fn end(&mut self, name: &str) -> Result<(), ParseError> {
            self.0.push(format!("end {}", name));
            Ok(())
        }
    }

    fn record(xml: &str) -> Vec<String> {
        let mut recorder = Recorder::default();
        tokenize(xml, &mut recorder).unwrap();
        recorder.0
    }

    #[test]
    fn test_empty_elements_expanded() {
        assert_eq!(
            record(r#"<feed><link href="a"/></feed>"#),
            vec!["start feed []", "start link [href=a]", "end link", "end feed"]
        );
    }

    #[test]
    fn test_text_entities() {
        assert_eq!(
            record("<t>a &amp; b &#147; &nbsp;</t>"),
            vec!["start t []", "text a & b &#147; &nbsp;", "end t"]
        );
    }

    #[test]
    fn test_cdata_passes_raw() {
        assert_eq!(
            record("<t><![CDATA[<p>&amp;</p>]]></t>"),
            vec!["start t []", "text <p>&amp;</p>", "end t"]
        );
    }

    #[test]
    fn test_attribute_with_unknown_entity() {
        assert_eq!(
            record(r#"<t title="a&nbsp;b &amp; c"></t>"#),
            vec!["start t [title=a&nbsp;b & c]", "end t"]
        );
    }

    #[test]
    fn test_qualified_names_kept() {
        assert_eq!(
            record(r#"<rdf:RDF><dc:date>x</dc:date></rdf:RDF>"#),
            vec!["start rdf:RDF []", "start dc:date []", "text x", "end dc:date", "end rdf:RDF"]
        );
    }

    #[test]
    fn test_mismatched_end_reaches_sink() {
        assert_eq!(
            record("<a><b></a></b>"),
            vec!["start a []", "start b []", "end a", "end b"]
        );
    }

    #[test]
    fn test_decode_declared_label() {
        let bytes = b"<t>caf\xe9</t>";
        assert_eq!(decode(bytes, Some("iso-8859-1"), None).unwrap(), "<t>caf\u{e9}</t>");
    }

    #[test]
    fn test_decode_unknown_declared_label() {
        assert!(matches!(
            decode(b"<t/>", Some("no-such-charset"), None),
            Err(ParseError::UnknownEncoding(_))
        ));
    }

    #[test]
    fn test_decode_bom() {
        let bytes = b"\xEF\xBB\xBF<t>x</t>";
        assert_eq!(decode(bytes, None, Some("windows-1252")).unwrap(), "<t>x</t>");
    }

    #[test]
    fn test_decode_xml_declaration() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"windows-1252\"?><t>\x93q\x94</t>";
        let text = decode(bytes, None, None).unwrap();
        assert!(text.ends_with("<t>\u{201C}q\u{201D}</t>"));
    }

    #[test]
    fn test_decode_utf16_declaration_on_ascii_bytes() {
        let bytes = b"<?xml version='1.0' encoding='UTF-16'?><t>x</t>";
        let text = decode(bytes, None, None).unwrap();
        assert!(text.ends_with("<t>x</t>"));
    }

    #[test]
    fn test_decode_configured_default() {
        let bytes = b"<t>caf\xe9</t>";
        assert_eq!(decode(bytes, None, Some("latin1")).unwrap(), "<t>caf\u{e9}</t>");
        assert_eq!(decode(bytes, None, None).unwrap(), "<t>caf\u{FFFD}</t>");
    }
}
