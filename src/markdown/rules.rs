//! Structural line classification.
//!
//! Pure, stateless predicates over a single line of text (plus one line of
//! lookback for table continuation), usable independently of the streaming
//! context. Callers strip inline code spans first so that `|`, list markers
//! and the like inside backticks never count as structure.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::VIDEO_SUCCESS_MARKER;

static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]*`").expect("inline code pattern compiles"));

static RULE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-=*_]+$").expect("rule line pattern compiles"));

static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[+\-*]\s+|\d+\.\s+)").expect("list item pattern compiles"));

static TABLE_ROW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|.*\|$").expect("table row pattern compiles"));

static HTTPS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}[^)\s]*").expect("url pattern compiles")
});

/// Removes single-backtick inline code spans, delimiters included.
#[must_use]
pub fn strip_inline_code(line: &str) -> String {
    INLINE_CODE_RE.replace_all(line, "").into_owned()
}

/// A thematic-break line: one or more of only `-`, `=`, `*`, `_`.
#[must_use]
pub fn is_rule_line(trimmed: &str) -> bool {
    RULE_LINE_RE.is_match(trimmed)
}

/// A bullet (`+`/`-`/`*`) or numbered (`1.`) list item marker at line start.
#[must_use]
pub fn is_list_item(line: &str) -> bool {
    LIST_ITEM_RE.is_match(line)
}

/// Classifies a line as part of a pipe-delimited table.
///
/// `stripped` is the trimmed line with inline code spans removed;
/// `last_line` is the previous raw line. A line that both starts and ends
/// with `|` is always a row; a line without any `|` never is; anything in
/// between continues a table only if the previous line contained `|`.
#[must_use]
pub fn is_table_row(stripped: &str, last_line: Option<&str>) -> bool {
    if TABLE_ROW_RE.is_match(stripped) {
        true
    } else if !stripped.contains('|') {
        false
    } else {
        last_line.is_some_and(|last| last.contains('|'))
    }
}

/// Extracts the video URL from a video-success line.
///
/// Returns the first `https://` URL on the line, exactly as matched, when
/// the line carries the success marker and the match parses as a URL.
#[must_use]
pub fn extract_video_url(line: &str) -> Option<String> {
    if !line.contains(VIDEO_SUCCESS_MARKER) {
        return None;
    }
    let matched = HTTPS_URL_RE.find(line)?.as_str();
    Url::parse(matched).ok()?;
    Some(matched.to_string())
}
