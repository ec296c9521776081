//! Console line representation
//!
//! `RawEntry` is one original, unwrapped unit of console output. It is the
//! source of truth: `DisplayLine`s are derived from raw entries by hard
//! character-count wrapping and are thrown away and rebuilt whenever the
//! line width changes.

use serde::{Deserialize, Serialize};

use super::color::ColorToken;

/// One original log/command text unit with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Monotonic identifier, used to find the display lines of an entry
    pub id: u64,
    /// Unwrapped text, may contain line breaks
    pub text: String,
    pub color: ColorToken,
    /// Captured stack trace, hidden unless stack traces are shown
    pub stack_trace: bool,
    /// Render directly after the previous entry on the same row
    pub same_line: bool,
}

/// One width-bounded chunk ready for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLine {
    /// At most `max_line_width` characters, never contains a line break
    pub text: String,
    pub color: ColorToken,
    /// Rendered on the same visual row as the previous display line
    pub continues_prior_line: bool,
    /// Soft-wrapped continuation of the previous chunk of the same entry
    pub wrapped: bool,
    /// The raw entry this line was derived from
    pub entry_id: u64,
}

impl DisplayLine {
    /// Number of characters in this line
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A wrapped piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// True if this chunk continues the previous chunk's logical line
    pub wrapped: bool,
}

/// Wrap `text` into chunks of at most `width` characters
///
/// Line breaks start a new chunk and are dropped; an empty logical line
/// yields one empty chunk. No word-boundary awareness.
pub fn wrap_text(text: &str, width: usize) -> Vec<Chunk> {
    wrap_text_at(text, width, 0)
}

/// Wrap `text` as if the first chunk starts at column `start_col`
///
/// The first chunk only gets the columns left on the current row; every
/// following chunk gets the full `width`.
pub fn wrap_text_at(text: &str, width: usize, start_col: usize) -> Vec<Chunk> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut capacity = width.saturating_sub(start_col).max(1);

    for logical in text.split('\n') {
        let chars: Vec<char> = logical.chars().collect();
        if chars.is_empty() {
            chunks.push(Chunk {
                text: String::new(),
                wrapped: false,
            });
            capacity = width;
            continue;
        }

        let mut pos = 0;
        let mut first = true;
        while pos < chars.len() {
            let end = (pos + capacity).min(chars.len());
            chunks.push(Chunk {
                text: chars[pos..end].iter().collect(),
                wrapped: !first,
            });
            pos = end;
            first = false;
            capacity = width;
        }
    }

    chunks
}

/// Rebuild the original text from its chunks
pub fn unwrap_chunks<'a, I>(chunks: I) -> String
where
    I: IntoIterator<Item = (&'a str, bool)>,
{
    let mut text = String::new();
    for (i, (chunk, wrapped)) in chunks.into_iter().enumerate() {
        if i > 0 && !wrapped {
            text.push('\n');
        }
        text.push_str(chunk);
    }
    text
}
