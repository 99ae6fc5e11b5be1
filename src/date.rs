//! Publication date parsing.
//!
//! Feeds carry dates in two families of formats: RFC 822 (`pubDate` in RSS
//! 0.9x/2.0) and the W3C profile of ISO 8601 (`dc:date` in RSS 1.0, every
//! Atom date element). Publishers mix them freely, so [`parse`] tries both.
//!
//! All functions here are total: malformed input yields `None`, never an
//! error or a panic. Strings without zone information are interpreted in the
//! local time zone of the process.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex_lite::Regex;

/// RFC 822 layouts tried after the zoned form, interpreted in local time.
const RFC822_LOCAL_FORMATS: &[&str] = &["%a, %d %b %Y %H:%M:%S", "%d %b %Y %H:%M:%S"];

/// W3C datetime layouts, most specific first. `%.f` also matches an absent
/// fraction.
const W3C_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

const W3C_DATE_FORMAT: &str = "%Y-%m-%d";

/// The only numeric zone shape honoured in W3C dates.
static W3C_OFFSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])(\d\d):(\d\d)$").unwrap());

/// Zone information split off a W3C date before the layout is matched.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Zone {
    Utc,
    Fixed(FixedOffset),
    Local,
}

/// Parses a feed date in any supported format.
///
/// RFC 822 forms are tried first, then W3C forms.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use minifeed::date;
///
/// let instant = date::parse("Tue, 02 Jan 2024 15:04:05 GMT").unwrap();
/// assert_eq!(instant, Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap());
///
/// assert!(date::parse("garbage").is_none());
/// ```
pub fn parse(s: &str) -> Option<DateTime<Utc>> {
    parse_rfc822(s).or_else(|| parse_w3c(s))
}

/// Parses an RFC 822 date.
///
/// Accepts, in order:
///
/// 1. `Tue, 02 Jan 2024 15:04:05 GMT` (zone names, North American
///    abbreviations and `+hhmm` offsets; the weekday may be omitted)
/// 2. `Tue, 02 Jan 2024 15:04:05` in local time
/// 3. `02 Jan 2024 15:04:05` in local time
///
/// Month and weekday names are always English.
pub fn parse_rfc822(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }

    RFC822_LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .and_then(|naive| Zone::Local.resolve(naive))
}

/// Parses a W3C (ISO 8601 profile) date.
///
/// Accepts, most specific first: `2024-01-02T15:04:05[.fff]`,
/// `2024-01-02T15:04`, `2024-01-02`, `2024-01` and `2024`. A trailing `Z`
/// means UTC and a trailing `+hh:mm`/`-hh:mm` is a fixed offset. Any other
/// signed suffix after the time, or no suffix at all, means local time.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use minifeed::date;
///
/// let instant = date::parse_w3c("2024-01-02T15:04:05+02:00").unwrap();
/// assert_eq!(instant, Utc.with_ymd_and_hms(2024, 1, 2, 13, 4, 5).unwrap());
/// ```
pub fn parse_w3c(s: &str) -> Option<DateTime<Utc>> {
    let (body, zone) = split_zone(s.trim());
    parse_w3c_naive(body).and_then(|naive| zone.resolve(naive))
}

fn split_zone(s: &str) -> (&str, Zone) {
    if let Some(body) = s.strip_suffix(['Z', 'z']) {
        return (body, Zone::Utc);
    }

    // Date parts contain '-', so only a sign after the time starts a zone
    let Some(time_start) = s.find('T') else {
        return (s, Zone::Local);
    };

    match s[time_start..].rfind(['+', '-']) {
        Some(rel) => {
            let split = time_start + rel;
            (&s[..split], parse_offset(&s[split..]))
        }
        None => (s, Zone::Local),
    }
}

fn parse_offset(suffix: &str) -> Zone {
    let Some(caps) = W3C_OFFSET_RE.captures(suffix) else {
        return Zone::Local;
    };

    let hours: i32 = caps[2].parse().unwrap_or(0);
    let minutes: i32 = caps[3].parse().unwrap_or(0);
    let seconds = hours * 3600 + minutes * 60;
    let seconds = if &caps[1] == "-" { -seconds } else { seconds };

    FixedOffset::east_opt(seconds).map_or(Zone::Local, Zone::Fixed)
}

fn parse_w3c_naive(body: &str) -> Option<NaiveDateTime> {
    if let Some(naive) = W3C_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(body, format).ok())
    {
        return Some(naive);
    }

    let date = NaiveDate::parse_from_str(body, W3C_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(&format!("{}-01", body), W3C_DATE_FORMAT))
        .ok()
        .or_else(|| parse_year(body))?;

    date.and_hms_opt(0, 0, 0)
}

fn parse_year(body: &str) -> Option<NaiveDate> {
    if body.len() != 4 || !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(body.parse().ok()?, 1, 1)
}

impl Zone {
    fn resolve(self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Zone::Utc => Some(naive.and_utc()),
            Zone::Fixed(offset) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc)),
            // A wall time skipped by a DST jump has no local instant; read it as UTC
            Zone::Local => Some(
                Local
                    .from_local_datetime(&naive)
                    .earliest()
                    .map_or_else(|| naive.and_utc(), |dt| dt.with_timezone(&Utc)),
            ),
        }
    }
}
