//! Chunk-to-line decoding for the poll stream.
//!
//! The poll endpoint streams the answer as newline-delimited text, but HTTP
//! chunk boundaries fall anywhere: mid-line and even mid-codepoint. The
//! splitter buffers partial trailing data across feeds and only ever yields
//! complete, valid UTF-8 lines.

use std::str::Utf8Error;

/// Stateful byte-chunk to text-line decoder.
#[derive(Debug, Default)]
pub struct LineSplitter {
    /// Incomplete trailing UTF-8 sequence from the previous chunk.
    bytes: Vec<u8>,
    /// Decoded text not yet terminated by a newline.
    text: String,
}

impl LineSplitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte chunk and returns every line it completed, in order.
    /// Lines are yielded without their terminators; `\r\n` is tolerated.
    ///
    /// # Errors
    ///
    /// Returns the underlying `Utf8Error` when the buffered bytes can never
    /// become valid UTF-8 (as opposed to a codepoint split across chunks,
    /// which is buffered until the next feed).
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, Utf8Error> {
        self.bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&self.bytes) {
            Ok(valid) => {
                self.text.push_str(valid);
                self.bytes.clear();
            }
            Err(e) => {
                if e.error_len().is_some() {
                    return Err(e);
                }
                let valid_up_to = e.valid_up_to();
                if valid_up_to > 0 {
                    match std::str::from_utf8(&self.bytes[..valid_up_to]) {
                        Ok(valid) => self.text.push_str(valid),
                        Err(inner) => return Err(inner),
                    }
                    self.bytes.drain(..valid_up_to);
                }
                // Incomplete trailing sequence; wait for more bytes.
            }
        }

        let mut lines = Vec::new();
        while let Some(pos) = self.text.find('\n') {
            let mut line: String = self.text.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        Ok(lines)
    }

    /// Flushes the unterminated final line, if any. The backend does not
    /// always terminate the last line of an answer.
    ///
    /// An incomplete trailing UTF-8 sequence at end of stream is discarded.
    pub fn finish(&mut self) -> Option<String> {
        self.bytes.clear();
        if self.text.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.text))
        }
    }
}
