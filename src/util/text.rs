use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Calculates the display width of a string in terminal columns.
///
/// CJK characters and emoji count as two columns, combining marks as zero.
///
/// # Examples
///
/// ```
/// use minifeed::util::display_width;
///
/// assert_eq!(display_width("Hello"), 5);
/// assert_eq!(display_width("你好"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Ellipsis string used for truncation
const ELLIPSIS: &str = "...";
/// Display width of the ellipsis (3 columns for ASCII "...")
const ELLIPSIS_WIDTH: usize = 3;

/// Truncates a string to fit within a maximum display width.
///
/// If truncation is necessary, appends "..." to indicate text was cut off.
/// Uses Unicode-aware width calculation so CJK text and emoji never overflow
/// the column budget of the report printed by the CLI.
///
/// # Returns
///
/// - If `max_width == 0`, returns `Cow::Borrowed("")`
/// - If `max_width <= 3`, returns as many characters as fit, without ellipsis
/// - If the string fits, returns `Cow::Borrowed(s)`
/// - Otherwise the truncated text with "..." appended
///
/// # Examples
///
/// ```
/// use minifeed::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    // Too narrow for char + ellipsis: return whatever fits
    if max_width <= ELLIPSIS_WIDTH {
        let mut byte_end = 0;
        let mut current_width = 0;
        for (idx, c) in s.char_indices() {
            let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
            if current_width + char_width > max_width {
                break;
            }
            current_width += char_width;
            byte_end = idx + c.len_utf8();
        }
        if byte_end == s.len() {
            return Cow::Borrowed(s);
        }
        return Cow::Owned(s[..byte_end].to_string());
    }
    let target_width = max_width - ELLIPSIS_WIDTH;

    let mut current_width = 0;
    let mut cut_point = None;
    let mut exceeded_max = false;

    for (idx, c) in s.char_indices() {
        let char_width = UnicodeWidthChar::width(c).unwrap_or(0);

        if cut_point.is_none() && current_width + char_width > target_width {
            cut_point = Some(idx);
        }

        if current_width + char_width > max_width {
            exceeded_max = true;
            break;
        }

        current_width += char_width;
    }

    if exceeded_max {
        let cut = cut_point.unwrap_or(s.len());
        Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
    } else {
        Cow::Borrowed(s)
    }
}

/// ISO control characters: C0 (U+0000..U+001F), DEL and C1 (U+007F..U+009F).
fn is_iso_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}')
}

/// Normalizes a chunk of element character data before it is buffered.
///
/// Every run of consecutive `\n`/`\r` characters becomes a single space, and
/// leading newlines are dropped entirely. All other ISO control characters
/// (tabs included) are removed. Feed text is reflowed by whoever renders it,
/// so line structure carries no meaning here.
///
/// `after_newline` carries the "previous chunk ended in a newline run" state
/// across calls, because the XML tokenizer may split one text node into
/// several events. Pass `true` for the first chunk of an element.
///
/// Returns `Cow::Borrowed` when the chunk contains no control characters.
///
/// # Examples
///
/// ```
/// use minifeed::util::normalize_character_data;
///
/// let mut after_newline = true;
/// let text = normalize_character_data("\nline one\r\nline\ttwo", &mut after_newline);
/// assert_eq!(text, "line one linetwo");
/// ```
pub fn normalize_character_data<'a>(s: &'a str, after_newline: &mut bool) -> Cow<'a, str> {
    if !s.chars().any(is_iso_control) {
        if !s.is_empty() {
            *after_newline = false;
        }
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\n' || c == '\r' {
            if !*after_newline {
                out.push(' ');
            }
            *after_newline = true;
        } else {
            *after_newline = false;
            if !is_iso_control(c) {
                out.push(c);
            }
        }
    }

    Cow::Owned(out)
}
