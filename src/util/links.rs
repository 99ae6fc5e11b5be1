use thiserror::Error;
use url::Url;

/// MIME type for RSS documents.
pub const RSS_MIME_TYPE: &str = "application/rss+xml";
/// MIME type for Atom documents.
pub const ATOM_MIME_TYPE: &str = "application/atom+xml";
/// MIME type assumed for links that point at ordinary web pages.
pub const HTML_MIME_TYPE: &str = "text/html";

/// Schemes accepted as a "valid URL" by link parsing and link repair.
///
/// `Url::parse` accepts any `scheme:` prefix, which would let strings such as
/// `"Note: see below"` pass as links. Only schemes a feed link can reasonably
/// carry are allowed.
const KNOWN_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "file", "mailto", "news", "nntp", "gopher", "feed",
];

/// Prefixes that mark a string as a relative reference rather than a
/// malformed absolute URL.
const RELATIVE_PREFIXES: &[&str] = &["/", "./", "../", "?", "#"];

/// Errors produced while turning link text into a URL.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The string could not be parsed as a URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL parsed but uses a scheme feeds do not link with.
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),
    /// No restart offset before the first `:` produced a valid URL.
    #[error("No valid URL found before the first ':'")]
    Unrepairable,
    /// The string contains no `:` at all, so there is nothing to repair.
    #[error("No scheme separator found")]
    MissingScheme,
}

/// Parses an absolute link URL.
///
/// # Errors
///
/// - [`LinkError::InvalidUrl`] if `Url::parse` rejects the string
/// - [`LinkError::UnsupportedScheme`] if the scheme is not one feeds link with
///
/// # Examples
///
/// ```
/// use minifeed::util::parse_link;
///
/// assert!(parse_link("https://example.com/feed.xml").is_ok());
/// assert!(parse_link("/relative/path").is_err());
/// assert!(parse_link("Note: not a link").is_err());
/// ```
pub fn parse_link(url_str: &str) -> Result<Url, LinkError> {
    let url = Url::parse(url_str)?;

    if !KNOWN_SCHEMES.contains(&url.scheme()) {
        return Err(LinkError::UnsupportedScheme(url.scheme().to_owned()));
    }

    Ok(url)
}

/// Parses a link, repairing publisher junk glued in front of the URL.
///
/// Some feeds emit item links like `"13027@http://host/path"`. When the string
/// does not parse, parsing is retried from every offset between the second
/// character and the first `:`, and the first offset that yields a valid URL
/// wins.
///
/// # Errors
///
/// - [`LinkError::MissingScheme`] if the string has no `:` at all
/// - [`LinkError::Unrepairable`] if no restart offset yields a valid URL
///
/// # Examples
///
/// ```
/// use minifeed::util::repair_link;
///
/// let url = repair_link("13027@http://example.com/a").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/a");
///
/// assert!(repair_link("not a url at all").is_err());
/// ```
pub fn repair_link(url_str: &str) -> Result<Url, LinkError> {
    if let Ok(url) = parse_link(url_str) {
        return Ok(url);
    }

    let colon = url_str.find(':').ok_or(LinkError::MissingScheme)?;

    url_str[..colon]
        .char_indices()
        .skip(1)
        .find_map(|(offset, _)| parse_link(&url_str[offset..]).ok())
        .ok_or(LinkError::Unrepairable)
}

/// Resolves link text that may be a relative reference.
///
/// Absolute URLs are returned as-is. Strings that look like relative
/// references (`/path`, `./x`, `../x`, `?query`, `#frag`) are joined onto the
/// first base that accepts them. Anything else goes through [`repair_link`].
///
/// # Errors
///
/// Returns the [`repair_link`] error when the text is neither absolute,
/// resolvable, nor repairable.
pub fn resolve_link<'a, I>(text: &str, bases: I) -> Result<Url, LinkError>
where
    I: IntoIterator<Item = &'a Url>,
{
    if let Ok(url) = parse_link(text) {
        return Ok(url);
    }

    if RELATIVE_PREFIXES.iter().any(|p| text.starts_with(p)) {
        if let Some(url) = bases
            .into_iter()
            .filter(|base| !base.cannot_be_a_base())
            .find_map(|base| base.join(text).ok())
        {
            return Ok(url);
        }
    }

    repair_link(text)
}

/// Guesses a link's MIME type from the extension of its path.
///
/// # Examples
///
/// ```
/// use minifeed::util::guess_mime_type;
/// use url::Url;
///
/// let feed = Url::parse("https://example.com/index.rss").unwrap();
/// assert_eq!(guess_mime_type(&feed), "application/rss+xml");
///
/// let page = Url::parse("https://example.com/2024/01/post").unwrap();
/// assert_eq!(guess_mime_type(&page), "text/html");
/// ```
pub fn guess_mime_type(url: &Url) -> &'static str {
    let path = url.path().to_ascii_lowercase();
    let extension = path.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");

    match extension {
        "rss" | "rdf" | "xml" => RSS_MIME_TYPE,
        "atom" => ATOM_MIME_TYPE,
        _ => HTML_MIME_TYPE,
    }
}

/// Converts a URL to the string used as a lookup key by feed caches.
///
/// `Url` parsing already lower-cases scheme and host, drops default ports and
/// turns an empty path into `/`, so the serialized form is the key. The
/// fragment is kept: some feeds distinguish entries only by fragment.
///
/// # Examples
///
/// ```
/// use minifeed::util::normalize_url;
/// use url::Url;
///
/// let url = Url::parse("HTTP://Example.COM:80/Post#c1").unwrap();
/// assert_eq!(normalize_url(&url), "http://example.com/Post#c1");
/// ```
pub fn normalize_url(url: &Url) -> String {
    url.as_str().to_owned()
}
