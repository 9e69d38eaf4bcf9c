//! Paragraph segmentation.
//!
//! A paragraph boundary is any whitespace run that contains a blank line,
//! i.e. the regex `\n\s*\n`. A single newline never splits. Pieces are
//! trimmed and empty pieces are dropped.
//!
//! "Whitespace" here is Unicode `White_Space` plus the ASCII information
//! separators U+001C..=U+001F.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inserted between the texts of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n";

static RE_PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[\s\x1C-\x1F]*\n").unwrap());

fn is_blank(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Concatenate per-page texts, in order, into one text stream.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, page) in pages.into_iter().enumerate() {
        if i > 0 {
            out.push_str(PAGE_SEPARATOR);
        }
        out.push_str(page.as_ref());
    }
    out
}

/// Split a text stream into trimmed, non-empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    RE_PARAGRAPH_BREAK
        .split(text)
        .map(|p| p.trim_matches(is_blank))
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// The first `limit` paragraphs of `text`.
pub fn leading_paragraphs(text: &str, limit: usize) -> Vec<String> {
    let mut paragraphs = split_paragraphs(text);
    paragraphs.truncate(limit);
    paragraphs
}
