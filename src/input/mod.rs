//! Keyboard Input Module
//!
//! Turns key presses into edits of the live command buffer. The
//! `CommandLine` state machine owns the buffer and the command history;
//! the history can be mirrored into a durable key-value slot.

mod command_line;
mod history;
mod store;

pub use command_line::{CommandLayout, CommandLine, LineState, Submission, PROMPT};
pub use history::{CommandHistory, HistoryEntry, HISTORY_BACKUP_KEY, HISTORY_BACKUP_LIMIT};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

/// Keys the console reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character
    Char(char),

    // Cursor keys
    Left,
    Right,
    Up,
    Down,

    // Navigation
    Home,
    End,
    PageUp,
    PageDown,

    // Editing
    Backspace,
    Delete,
    Enter,
}

impl Key {
    /// Whether the key edits the command buffer contents
    pub fn is_edit(&self) -> bool {
        matches!(self, Key::Char(_) | Key::Backspace | Key::Delete)
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        match c {
            '\n' | '\r' => Key::Enter,
            '\x08' | '\x7f' => Key::Backspace,
            c => Key::Char(c),
        }
    }
}
