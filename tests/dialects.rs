//! Integration tests: complete documents in every supported dialect.
//!
//! Each test parses a realistic feed through the public API and checks the
//! normalized channel, so grammar tables, the stack machine, link resolution
//! and date parsing are exercised together.

use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use url::Url;

use minifeed::config::ParserOptions;
use minifeed::feed::{Document, Element};
use minifeed::model::{Dialect, HasAuthors, HasLinks, LinkRole};
use minifeed::{parse_feed, FeedParser, ParseError};

const RSS2: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0"
     xmlns:content="http://purl.org/rss/1.0/modules/content/"
     xmlns:dc="http://purl.org/dc/elements/1.1/"
     xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>Example News</title>
    <link>http://example.com/</link>
    <atom:link href="http://example.com/feed.xml" rel="self" type="application/rss+xml"/>
    <description>All the news</description>
    <copyright>2024 Example</copyright>
    <managingEditor>editor@example.com</managingEditor>
    <pubDate>Tue, 02 Jan 2024 15:04:05 GMT</pubDate>
    <image>
      <title>Logo</title>
      <url>http://example.com/logo.png</url>
    </image>
    <item>
      <title>First &#147;post&#148;</title>
      <link>/2024/01/first</link>
      <guid>urn:example:1</guid>
      <description>Hello &lt;b&gt;world&lt;/b&gt;</description>
      <content:encoded><![CDATA[<p>Full text</p>]]></content:encoded>
      <category>rust</category>
      <category>feeds</category>
      <dc:creator>Ann</dc:creator>
      <pubDate>Wed, 03 Jan 2024 10:00:00 +0100</pubDate>
    </item>
    <item>
      <title>Second</title>
      <link>13027@http://example.com/2024/01/second</link>
    </item>
  </channel>
</rss>"#;

const RSS1: &str = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/"
         xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel rdf:about="http://example.org/rss.rdf">
    <title>RDF Feed</title>
    <description>An RSS 1.0 feed</description>
    <dc:date>2024-01-02T15:04:05Z</dc:date>
    <dc:rights>CC-BY</dc:rights>
    <items>
      <rdf:Seq><rdf:li resource="http://example.org/a"/></rdf:Seq>
    </items>
  </channel>
  <item rdf:about="http://example.org/a">
    <title>A</title>
    <link>http://example.org/a</link>
    <description>About &#151; A</description>
    <dc:subject>news</dc:subject>
    <dc:creator>Bob</dc:creator>
    <dc:date>2024-01-01T00:00:00Z</dc:date>
  </item>
  <item rdf:about="http://example.org/b">
    <title>B</title>
  </item>
</rdf:RDF>"#;

const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed version="0.3" xmlns="http://purl.org/atom/ns#">
  <title>Atom Feed</title>
  <tagline>Notes</tagline>
  <id>tag:example.com,2024:feed</id>
  <link rel="alternate" type="text/html" href="http://example.com/"/>
  <link rel="service.post" href="http://example.com/post"/>
  <modified>2024-01-02T15:04:05Z</modified>
  <author><name>Carol</name><email>c@example.com</email></author>
  <entry>
    <title>Entry one</title>
    <link rel="alternate" type="text/html" href="/entries/1"/>
    <id>tag:example.com,2024:1</id>
    <issued>2024-01-01T08:00:00-05:00</issued>
    <summary type="text/plain">Short</summary>
    <content type="application/xhtml+xml" mode="xml"><div xmlns="http://www.w3.org/1999/xhtml"><p>Hi &amp; bye</p></div></content>
    <content>Plain body</content>
    <contributor><name>Dan</name></contributor>
  </entry>
  <entry>
    <title>Entry two</title>
    <id>tag:example.com,2024:2</id>
    <content>Untyped</content>
  </entry>
</feed>"#;

fn relaxed() -> FeedParser {
    FeedParser::new(ParserOptions {
        strict_links: false,
        ..ParserOptions::default()
    })
}

// ============================================================================
// RSS 0.9x / 2.0
// ============================================================================

#[test]
fn test_rss2_channel() {
    let channel = parse_feed(RSS2.as_bytes()).unwrap();

    assert_eq!(channel.format.dialect, Dialect::Rss2);
    assert_eq!(channel.format.to_string(), "RSS 2.0");
    assert_eq!(channel.title.as_deref(), Some("Example News"));
    assert_eq!(channel.description.as_deref(), Some("All the news"));
    assert_eq!(channel.copyright.as_deref(), Some("2024 Example"));
    assert_eq!(channel.author().as_deref(), Some("editor@example.com"));
    assert_eq!(
        channel.pub_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap())
    );

    let links: Vec<(&str, &str, LinkRole)> = channel
        .links()
        .iter()
        .map(|l| (l.url().as_str(), l.mime_type(), l.role()))
        .collect();
    assert_eq!(
        links,
        vec![
            ("http://example.com/", "text/html", LinkRole::SelfLink),
            (
                "http://example.com/feed.xml",
                "application/rss+xml",
                LinkRole::SelfLink
            ),
        ]
    );
    assert_eq!(
        channel.resolved_url().map(Url::as_str),
        Some("http://example.com/")
    );
}

#[test]
fn test_rss2_items() {
    let channel = parse_feed(RSS2.as_bytes()).unwrap();
    assert_eq!(channel.items.len(), 2);

    let first = &channel.items[0];
    assert_eq!(first.title.as_deref(), Some("First \u{201C}post\u{201D}"));
    assert_eq!(first.id.as_deref(), Some("urn:example:1"));
    assert_eq!(first.summary.as_deref(), Some("Hello <b>world</b>"));
    assert_eq!(first.categories, vec!["rust", "feeds"]);
    assert_eq!(first.authors(), ["Ann".to_string()]);
    assert_eq!(
        first.resolved_url().map(Url::as_str),
        Some("http://example.com/2024/01/first")
    );
    assert_eq!(
        first.pub_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap())
    );

    let html = first.content_for("text/html").unwrap();
    assert_eq!(html.text(), "<p>Full text</p>");
    assert_eq!(first.cache_key().as_deref(), Some("urn:example:1"));

    let second = &channel.items[1];
    assert_eq!(
        second.resolved_url().map(Url::as_str),
        Some("http://example.com/2024/01/second")
    );
    assert!(second.contents().is_empty());
    assert_eq!(
        second.cache_key().as_deref(),
        Some("http://example.com/2024/01/second")
    );
}

#[test]
fn test_rss2_item_date_inherited_from_channel() {
    let channel = parse_feed(RSS2.as_bytes()).unwrap();
    let channel_date = channel.pub_date;

    assert_eq!(channel.items[1].pub_date, None);
    assert_eq!(channel.items[1].effective_date(&channel), channel_date);
    assert_ne!(channel.items[0].effective_date(&channel), channel_date);
}

#[test]
fn test_nested_unknown_elements_do_not_leak() {
    // <image><title> must not overwrite the channel title
    let channel = parse_feed(RSS2.as_bytes()).unwrap();
    assert_eq!(channel.title.as_deref(), Some("Example News"));
}

#[test]
fn test_rss091_matches_rss20() {
    let old = RSS2.replace(r#"version="2.0""#, r#"version="0.91""#);
    let v091 = parse_feed(old.as_bytes()).unwrap();
    let v20 = parse_feed(RSS2.as_bytes()).unwrap();

    assert_eq!(v091.format.to_string(), "RSS 0.91");
    assert_eq!(v091.title, v20.title);
    assert_eq!(v091.links, v20.links);
    assert_eq!(v091.items, v20.items);
}

#[test]
fn test_rss092_items_outside_channel() {
    let xml = r#"<rss version="0.92">
  <channel><title>Loose</title><link>http://example.com/</link></channel>
  <item><title>Orphan</title><link>http://example.com/orphan</link></item>
</rss>"#;
    let channel = parse_feed(xml.as_bytes()).unwrap();
    assert_eq!(channel.items.len(), 1);
    assert_eq!(channel.items[0].title.as_deref(), Some("Orphan"));
}

#[test]
fn test_last_build_date_used_without_pub_date() {
    let xml = r#"<rss version="2.0"><channel>
  <lastBuildDate>Mon, 01 Jan 2024 00:00:00 GMT</lastBuildDate>
</channel></rss>"#;
    let channel = parse_feed(xml.as_bytes()).unwrap();
    assert_eq!(
        channel.pub_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
}

#[test]
fn test_unparsable_date_is_absent() {
    let xml = r#"<rss version="2.0"><channel>
  <pubDate>sometime last week</pubDate>
  <item><title>x</title><pubDate>yesterday</pubDate></item>
</channel></rss>"#;
    let channel = parse_feed(xml.as_bytes()).unwrap();
    assert_eq!(channel.pub_date, None);
    assert_eq!(channel.items[0].pub_date, None);
}

#[test]
fn test_double_escaped_reference_repaired() {
    let xml = r#"<rss version="2.0"><channel>
  <title>Caf&amp;#233; &amp;#150; bar</title>
</channel></rss>"#;
    let channel = parse_feed(xml.as_bytes()).unwrap();
    assert_eq!(channel.title.as_deref(), Some("Caf\u{e9} \u{2013} bar"));
}

// ============================================================================
// RSS 1.0
// ============================================================================

#[test]
fn test_rss1_channel() {
    let channel = parse_feed(RSS1.as_bytes()).unwrap();

    assert_eq!(channel.format.dialect, Dialect::Rss1);
    assert_eq!(channel.format.to_string(), "RSS 1.0");
    assert_eq!(channel.title.as_deref(), Some("RDF Feed"));
    assert_eq!(channel.description.as_deref(), Some("An RSS 1.0 feed"));
    assert_eq!(channel.copyright.as_deref(), Some("CC-BY"));
    assert_eq!(channel.id.as_deref(), Some("http://example.org/rss.rdf"));
    assert_eq!(
        channel.pub_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap())
    );

    // No <link>, so rdf:about stands in
    let link = channel.link_for_role(LinkRole::SelfLink).unwrap();
    assert_eq!(link.url().as_str(), "http://example.org/rss.rdf");
    assert_eq!(link.mime_type(), "application/rss+xml");
}

#[test]
fn test_rss1_items() {
    let channel = parse_feed(RSS1.as_bytes()).unwrap();
    assert_eq!(channel.items.len(), 2);

    let a = &channel.items[0];
    assert_eq!(a.id.as_deref(), Some("http://example.org/a"));
    assert_eq!(a.title.as_deref(), Some("A"));
    assert_eq!(a.summary.as_deref(), Some("About \u{2014} A"));
    assert_eq!(a.categories, vec!["news"]);
    assert_eq!(a.author().as_deref(), Some("Bob"));
    assert_eq!(
        a.resolved_url().map(Url::as_str),
        Some("http://example.org/a")
    );
    assert_eq!(
        a.pub_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );

    let b = &channel.items[1];
    assert_eq!(b.id.as_deref(), Some("http://example.org/b"));
    assert!(b.links().is_empty());
    assert_eq!(b.effective_date(&channel), channel.pub_date);
}

// ============================================================================
// Atom
// ============================================================================

#[test]
fn test_atom_channel() {
    let channel = parse_feed(ATOM.as_bytes()).unwrap();

    assert_eq!(channel.format.dialect, Dialect::Atom);
    assert_eq!(channel.format.to_string(), "Atom 0.3");
    assert_eq!(channel.title.as_deref(), Some("Atom Feed"));
    assert_eq!(channel.description.as_deref(), Some("Notes"));
    assert_eq!(channel.id.as_deref(), Some("tag:example.com,2024:feed"));
    assert_eq!(channel.authors(), ["Carol".to_string()]);
    assert_eq!(
        channel.pub_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap())
    );

    // rel="service.post" is not kept
    assert_eq!(channel.links().len(), 1);
    assert_eq!(channel.links()[0].role(), LinkRole::Alternate);
    assert_eq!(
        channel.resolved_url().map(Url::as_str),
        Some("http://example.com/")
    );
}

#[test]
fn test_atom_entry() {
    let channel = parse_feed(ATOM.as_bytes()).unwrap();
    let entry = &channel.items[0];

    assert_eq!(entry.title.as_deref(), Some("Entry one"));
    assert_eq!(entry.id.as_deref(), Some("tag:example.com,2024:1"));
    assert_eq!(entry.summary.as_deref(), Some("Short"));
    assert_eq!(entry.authors(), ["Dan".to_string()]);
    assert_eq!(
        entry.resolved_url().map(Url::as_str),
        Some("http://example.com/entries/1")
    );
    assert_eq!(
        entry.pub_date,
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap())
    );

    let contents: Vec<(&str, &str)> = entry
        .contents()
        .iter()
        .map(|c| (c.mime_type(), c.text()))
        .collect();
    assert_eq!(
        contents,
        vec![
            (
                "application/xhtml+xml",
                r#"<div xmlns="http://www.w3.org/1999/xhtml"><p>Hi &amp; bye</p></div>"#
            ),
            ("text/plain", "Plain body"),
        ]
    );

    // The first block is the default, whatever its type
    assert_eq!(
        entry.content("image/png").map(|c| c.mime_type()),
        Some("application/xhtml+xml")
    );
    assert_eq!(
        entry
            .first_content_of_type(&["text/html", "text/plain"])
            .map(|c| c.text()),
        Some("Plain body")
    );
}

#[test]
fn test_atom_untyped_content_is_plain_text_default() {
    let channel = parse_feed(ATOM.as_bytes()).unwrap();
    let entry = &channel.items[1];

    let default = entry.content_for("*").unwrap();
    assert_eq!(default.mime_type(), "text/plain");
    assert_eq!(default.text(), "Untyped");
    assert_eq!(entry.content_for("text/plain"), Some(default));
}

#[test]
fn test_atom_self_link_gets_atom_type() {
    let xml = r#"<feed version="0.3">
  <link rel="self" href="http://example.com/atom"/>
  <link href="http://example.com/"/>
</feed>"#;
    let channel = parse_feed(xml.as_bytes()).unwrap();

    let self_link = channel.link_for_role(LinkRole::SelfLink).unwrap();
    assert_eq!(self_link.mime_type(), "application/atom+xml");
    assert_eq!(
        channel.resolved_url().map(Url::as_str),
        Some("http://example.com/atom")
    );
}

#[test]
fn test_references_repaired_inside_nested_markup() {
    let xml = r#"<feed version="0.3"><entry>
  <content type="application/xhtml+xml"><div><p>&#147;Hi&#148; &#19;</p></div></content>
</entry></feed>"#;
    let channel = parse_feed(xml.as_bytes()).unwrap();

    let content = channel.items[0].content_for("*").unwrap();
    assert_eq!(content.text(), "<div><p>\u{201C}Hi\u{201D} [19]</p></div>");
}

#[test]
fn test_markup_field_escapes_direct_and_nested_text_alike() {
    let xml = r#"<feed version="0.3"><entry>
  <content type="text/html">a &lt; b <p>c &lt; d</p> e &amp; f</content>
</entry></feed>"#;
    let channel = parse_feed(xml.as_bytes()).unwrap();

    let content = channel.items[0].content_for("text/html").unwrap();
    assert_eq!(content.text(), "a &lt; b <p>c &lt; d</p> e &amp; f");
}

#[test]
fn test_rss_description_markup_repairs_references() {
    let xml = r#"<rss version="2.0"><channel><item>
  <description>&#147;Quoted&#148; <b>&#150; bold</b></description>
</item></channel></rss>"#;
    let channel = parse_feed(xml.as_bytes()).unwrap();

    assert_eq!(
        channel.items[0].summary.as_deref(),
        Some("\u{201C}Quoted\u{201D} <b>\u{2013} bold</b>")
    );
}

#[test]
fn test_markup_free_description_stays_plain() {
    let xml = r#"<rss version="2.0"><channel><item>
  <description>Fish &amp; chips &#147;daily&#148;</description>
</item></channel></rss>"#;
    let channel = parse_feed(xml.as_bytes()).unwrap();

    assert_eq!(
        channel.items[0].summary.as_deref(),
        Some("Fish & chips \u{201C}daily\u{201D}")
    );
}

#[test]
fn test_atom_without_version() {
    let channel = parse_feed(b"<feed><title>t</title></feed>").unwrap();
    assert_eq!(channel.format.to_string(), "Atom");
    assert_eq!(channel.format.version, None);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_unsupported_formats() {
    for xml in [
        r#"<rss version="3.0"><channel/></rss>"#,
        r#"<rss><channel/></rss>"#,
        "<html><body/></html>",
    ] {
        let err = parse_feed(xml.as_bytes()).unwrap_err();
        assert!(
            matches!(err, ParseError::UnsupportedFormat(_)),
            "{}: {:?}",
            xml,
            err
        );
    }
}

#[test]
fn test_mismatched_tags() {
    let err = parse_feed(br#"<rss version="2.0"><channel><title>x</channel></rss>"#).unwrap_err();
    assert!(matches!(err, ParseError::StructuralInconsistency(_)));
}

#[test]
fn test_truncated_document() {
    let err = parse_feed(br#"<rss version="2.0"><channel><title>x"#).unwrap_err();
    assert!(matches!(
        err,
        ParseError::StructuralInconsistency(_) | ParseError::Xml(_)
    ));
}

#[test]
fn test_empty_document() {
    assert!(parse_feed(b"").is_err());
}

// SEC-003: Nesting limit
#[test]
fn test_excessive_nesting_rejected() {
    let depth = ParserOptions::default().max_depth + 10;
    let xml = format!(
        r#"<rss version="2.0"><channel>{}{}</channel></rss>"#,
        "<x>".repeat(depth),
        "</x>".repeat(depth)
    );
    let err = parse_feed(xml.as_bytes()).unwrap_err();
    assert!(matches!(err, ParseError::DepthExceeded(64)));
}

#[test]
fn test_unrepairable_link_strict_and_relaxed() {
    let xml = r#"<rss version="2.0"><channel>
  <link>http://example.com/</link>
  <item><title>Broken</title><link>not a url at all</link></item>
  <item><title>Fine</title><link>http://example.com/fine</link></item>
</channel></rss>"#;

    let err = parse_feed(xml.as_bytes()).unwrap_err();
    match err {
        ParseError::MalformedUrl { url, .. } => assert_eq!(url, "not a url at all"),
        other => panic!("expected MalformedUrl, got {:?}", other),
    }

    let channel = relaxed().parse_str(None, xml).unwrap();
    assert_eq!(channel.items.len(), 2);
    assert!(channel.items[0].links().is_empty());
    assert_eq!(channel.items[1].links().len(), 1);
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn test_windows_1252_declaration() {
    let mut bytes = br#"<?xml version="1.0" encoding="windows-1252"?>
<rss version="2.0"><channel><title>"#
        .to_vec();
    bytes.extend_from_slice(b"\x93Quoted\x94 caf\xe9");
    bytes.extend_from_slice(b"</title></channel></rss>");

    let channel = parse_feed(&bytes).unwrap();
    assert_eq!(
        channel.title.as_deref(),
        Some("\u{201C}Quoted\u{201D} caf\u{e9}")
    );
}

#[test]
fn test_configured_default_encoding() {
    let parser = FeedParser::new(ParserOptions {
        default_encoding: Some("iso-8859-1".to_string()),
        ..ParserOptions::default()
    });
    let bytes = b"<rss version=\"2.0\"><channel><title>na\xefve</title></channel></rss>";
    let channel = parser.parse_bytes(None, bytes, None).unwrap();
    assert_eq!(channel.title.as_deref(), Some("na\u{ef}ve"));
}

#[test]
fn test_unknown_declared_encoding() {
    let err = FeedParser::default()
        .parse(None, RSS2.as_bytes(), Some("klingon"))
        .unwrap_err();
    assert!(matches!(err, ParseError::UnknownEncoding(_)));
}

#[test]
fn test_parse_hand_built_document() {
    let document = Document::new(
        Element::new("rss").with_attribute("version", "2.0").with_child(
            Element::new("channel")
                .with_child(Element::new("title").with_text("Built"))
                .with_child(Element::new("link").with_text("http://example.com/"))
                .with_child(
                    Element::new("item")
                        .with_child(Element::new("title").with_text("Child"))
                        .with_child(Element::new("link").with_text("/child")),
                ),
        ),
    );

    let channel = FeedParser::default()
        .parse_document(&document, None)
        .unwrap();
    assert_eq!(channel.title.as_deref(), Some("Built"));
    assert_eq!(
        channel.items[0].resolved_url().map(Url::as_str),
        Some("http://example.com/child")
    );
}

#[test]
fn test_document_and_tokenizer_agree_for_every_dialect() {
    let parser = FeedParser::default();
    for xml in [RSS2, RSS1, ATOM] {
        let document = Document::parse_str(xml).unwrap();
        assert_eq!(
            parser.parse_document(&document, None).unwrap(),
            parser.parse_str(None, xml).unwrap()
        );
    }
}

#[test]
fn test_source_url_resolves_relative_channel_link() {
    let xml = r#"<rss version="2.0"><channel><link>/blog/</link>
  <item><link>post-1</link></item>
</channel></rss>"#;
    let source = Url::parse("https://example.net/feeds/main.xml").unwrap();
    let channel = relaxed().parse_str(Some(&source), xml).unwrap();

    assert_eq!(
        channel.resolved_url().map(Url::as_str),
        Some("https://example.net/blog/")
    );
    // "post-1" is neither absolute nor a recognised relative form
    assert!(channel.items[0].links().is_empty());
}
