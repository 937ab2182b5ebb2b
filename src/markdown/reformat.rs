//! Stateful restyling of streamed answer lines.
//!
//! The backend streams the answer as plain text lines. Rendering them as
//! Markdown needs explicit line breaks (trailing double space) and blank
//! lines around structure the renderer would otherwise glue together:
//! blockquote runs, horizontal rules, tables and list items. The
//! [`Reformatter`] walks the lines once, keeping just enough state (code
//! fence, citation run, table run, one line of lookback) to insert those
//! separators, and re-emits display-ready fragments.

use tracing::debug;

use super::rules;
use super::{BUSY_NOTICE, SEARCH_STATUS_MARKER};

/// Line transducer for one answer stream.
///
/// State is scoped to a single stream; every question gets a fresh
/// instance. Feed decoded lines with [`push_line`](Self::push_line) and call
/// [`finish`](Self::finish) once the stream ends.
#[derive(Debug, Default)]
pub struct Reformatter {
    in_code_block: bool,
    in_citation: bool,
    in_table: bool,
    last_line: Option<String>,
    search_marker_count: u32,
    accumulated: String,
}

impl Reformatter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Processes one raw line and returns the display fragments it produces,
    /// in emission order. Empty lines produce nothing.
    pub fn push_line(&mut self, raw: &str) -> Vec<String> {
        let mut out = Vec::new();
        if raw.is_empty() {
            return out;
        }

        self.accumulated.push_str(raw);
        self.accumulated.push('\n');

        // The fence line itself flips the state first, so an opening fence
        // is emitted as a code line and a closing fence flows through the
        // normal pipeline.
        if raw.trim().starts_with("```") {
            self.in_code_block = !self.in_code_block;
        }

        if raw.contains(SEARCH_STATUS_MARKER) {
            self.search_marker_count += 1;
            if self.search_marker_count > 1 {
                debug!("suppressing repeated search status line");
                return out;
            }
        }

        if self.in_code_block {
            out.push(format!("{raw}  \n"));
            return out;
        }

        // The backend occasionally leaks a literal "\n\n" escape at the end
        // of a line; drop it before classification.
        let trimmed = raw.trim();
        let line = if trimmed.ends_with(r"\n\n") {
            trimmed[..trimmed.len() - 4].to_string()
        } else {
            raw.to_string()
        };

        if line.trim().is_empty() {
            return out;
        }

        // Inline code spans never count as structure.
        let stripped = rules::strip_inline_code(&line);
        let stripped_trim = stripped.trim();

        let is_quote = stripped_trim.starts_with('>');
        if !is_quote && self.in_citation {
            out.push("  \n".to_string());
        }
        self.in_citation = is_quote;

        if rules::is_rule_line(stripped_trim) {
            out.push("  \n".to_string());
        }

        let list_item = rules::is_list_item(&stripped);

        let is_table = rules::is_table_row(stripped_trim, self.last_line.as_deref());
        if self.in_table && !is_table {
            out.push("  \n\n".to_string());
        }
        self.in_table = is_table;
        self.last_line = Some(line.clone());

        if list_item {
            out.push(format!("{line}  \n\n"));
        } else {
            out.push(format!("{line}  \n"));
        }

        if let Some(url) = rules::extract_video_url(&line) {
            out.push("  \n\n".to_string());
            out.push(format!(
                "<video width=\"320\" height=\"240\" controls>\
                 <source src=\"{url}\" type=\"video/mp4\">\
                 Your browser does not support video playback.</video>  \n\n"
            ));
        }

        out
    }

    /// Terminal fragment for a stream that produced no content at all.
    ///
    /// Returns the busy notice when nothing (or only whitespace) was
    /// accumulated over the stream's lifetime, `None` otherwise.
    #[must_use]
    pub fn finish(&self) -> Option<String> {
        if self.accumulated.trim().is_empty() {
            Some(BUSY_NOTICE.to_string())
        } else {
            None
        }
    }

    /// Raw transcript of every line pushed so far, newline-joined.
    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.accumulated
    }
}
