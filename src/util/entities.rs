//! Repair of numeric character references left in feed text.
//!
//! Publishers routinely double-escape their markup or paste Windows-1252
//! "smart punctuation" codes as if they were Unicode, so the character data
//! that reaches the model still contains references like `&#147;`. These are
//! resolved here after the XML layer is done with the text.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::escape::resolve_predefined_entity;
use regex_lite::{Captures, Regex};

/// Matches decimal (`&#147;`) and hexadecimal (`&#x93;`) character references.
static CHAR_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#([0-9]+|[xX][0-9A-Fa-f]+);").unwrap());

/// Windows-1252 punctuation codes that publishers emit as character
/// references, with the text that should replace them.
const CP1252_PUNCTUATION: &[(u32, &str)] = &[
    (0x85, "..."),      // ellipsis
    (0x91, "\u{2018}"), // left single quote
    (0x92, "\u{2019}"), // right single quote
    (0x93, "\u{201C}"), // left double quote
    (0x94, "\u{201D}"), // right double quote
    (0x96, "\u{2013}"), // en dash
    (0x97, "\u{2014}"), // em dash
    (0x98, "~"),        // small tilde
    (0x99, "\u{2122}"), // trademark
];

/// Replaces numeric character references with the characters they denote.
///
/// - Windows-1252 punctuation codes (0x85, 0x91-0x94, 0x96-0x99) become their
///   intended Unicode punctuation.
/// - Any other code that is a Unicode scalar value and not a control
///   character (tab, newline and carriage return excepted) is substituted
///   directly.
/// - Everything else is rewritten as `[<digits>]`, which keeps the value
///   visible without ever matching the reference pattern again.
///
/// Named entities are not touched.
///
/// # Examples
///
/// ```
/// use minifeed::util::demoronize;
///
/// assert_eq!(demoronize("&#147;Hi&#148;"), "\u{201C}Hi\u{201D}");
/// assert_eq!(demoronize("caf&#233;"), "café");
/// assert_eq!(demoronize("bell&#19;"), "bell[19]");
/// ```
pub fn demoronize(s: &str) -> Cow<'_, str> {
    if !s.contains("&#") {
        return Cow::Borrowed(s);
    }

    CHAR_REF_RE.replace_all(s, |caps: &Captures<'_>| replacement(&caps[1]))
}

fn replacement(reference: &str) -> String {
    let code = match reference.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => reference.parse::<u32>().ok(),
    };

    let Some(code) = code else {
        return format!("[{}]", reference);
    };

    if let Some((_, text)) = CP1252_PUNCTUATION.iter().find(|(c, _)| *c == code) {
        return (*text).to_string();
    }

    match char::from_u32(code) {
        Some(c) if !c.is_control() || matches!(c, '\t' | '\n' | '\r') => c.to_string(),
        _ => format!("[{}]", reference),
    }
}

/// Resolves the five predefined XML entities (`&lt;`, `&gt;`, `&amp;`,
/// `&apos;`, `&quot;`) and leaves every other reference verbatim.
///
/// Numeric references survive so that [`demoronize`] can apply its repair
/// rules to them; unknown named entities (`&nbsp;` and friends, which feeds
/// borrow from HTML without declaring) survive so a bad entity never aborts
/// a parse.
///
/// # Examples
///
/// ```
/// use minifeed::util::unescape_predefined;
///
/// assert_eq!(unescape_predefined("a &lt;b&gt; &amp;#147; &nbsp;"), "a <b> &#147; &nbsp;");
/// ```
pub fn unescape_predefined(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let resolved = tail[1..]
            .find(';')
            .map(|semi| (&tail[1..=semi], semi + 2))
            .and_then(|(name, consumed)| {
                resolve_predefined_entity(name).map(|text| (text, consumed))
            });

        match resolved {
            Some((text, consumed)) => {
                out.push_str(text);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}
