//! Deterministic snapshot generation
//!
//! Snapshots capture the visible console window in a serializable format
//! for testing and debugging. Given the same sequence of console calls,
//! the console must produce identical snapshots.

use serde::{Deserialize, Serialize};

use super::color::ColorToken;

/// A colored run of text within a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub color: ColorToken,
}

/// One visual row of the console window
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewRow {
    pub fragments: Vec<Fragment>,
}

impl ViewRow {
    /// Concatenated text of all fragments
    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }

    /// Width of the row in characters
    pub fn len(&self) -> usize {
        self.fragments.iter().map(|f| f.text.chars().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(|f| f.text.is_empty())
    }
}

/// Cursor position within the visible window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub row: usize,
    pub col: usize,
    pub visible: bool,
}

/// A complete snapshot of the visible console
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Characters per row
    pub cols: usize,
    /// Rows per screen
    pub rows: usize,
    /// Visible rows, top to bottom
    pub view: Vec<ViewRow>,
    /// Command line cursor, if keyboard input is active and on screen
    pub cursor: Option<CursorSnapshot>,
    pub scroll_offset: usize,
    pub total_rows: usize,
    /// Raw history entry count
    pub history_len: usize,
}

impl Snapshot {
    /// Plain text of the visible rows, one line per row
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (i, row) in self.view.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            text.push_str(row.text().trim_end());
        }
        text
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Whether the visible content matches, ignoring scroll bookkeeping
    pub fn content_equals(&self, other: &Snapshot) -> bool {
        self.cols == other.cols && self.view == other.view && self.cursor == other.cursor
    }
}
