//! Command line state machine
//!
//! The buffer is kept as characters with the cursor measured from the end,
//! so typing at the end never has to move the cursor.

use crate::core::ColorToken;

use super::history::{CommandHistory, HistoryEntry};
use super::Key;

/// Text drawn in front of the command buffer
pub const PROMPT: &str = "> ";

/// Command line state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineState {
    /// Empty buffer, nothing in progress
    #[default]
    Idle,
    /// Buffer being edited
    Composing,
    /// Buffer shows a history entry
    HistoryBrowsing,
}

/// A command handed over on Enter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    pub color: ColorToken,
}

/// The command buffer wrapped to a width, with the cursor cell located
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLayout {
    /// Visual rows, the first starting with the prompt
    pub rows: Vec<String>,
    /// Cursor row within `rows`
    pub cursor_row: usize,
    /// Cursor column within its row
    pub cursor_col: usize,
}

/// Keyboard-driven command buffer with history navigation
#[derive(Debug)]
pub struct CommandLine {
    buffer: Vec<char>,
    cursor_from_end: usize,
    state: LineState,
    /// History index shown while browsing
    browse_index: usize,
    /// Buffer saved on the first Up press, restored by Down
    transient: Option<Vec<char>>,
    history: CommandHistory,
    color: ColorToken,
}

impl CommandLine {
    pub fn new(history: CommandHistory, color: ColorToken) -> Self {
        Self {
            buffer: Vec::new(),
            cursor_from_end: 0,
            state: LineState::Idle,
            browse_index: 0,
            transient: None,
            history,
            color,
        }
    }

    pub fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn cursor_from_end(&self) -> usize {
        self.cursor_from_end
    }

    /// Insertion point as a character index
    pub fn cursor_index(&self) -> usize {
        self.buffer.len() - self.cursor_from_end
    }

    pub fn state(&self) -> LineState {
        self.state
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    pub fn color(&self) -> ColorToken {
        self.color
    }

    pub fn set_color(&mut self, color: ColorToken) {
        self.color = color;
    }

    /// Apply a key; returns the submitted command on Enter
    pub fn handle_key(&mut self, key: Key) -> Option<Submission> {
        match key {
            Key::Char(c) => {
                if c.is_control() {
                    return None;
                }
                self.begin_edit();
                let at = self.cursor_index();
                self.buffer.insert(at, c);
            }
            Key::Backspace => {
                self.begin_edit();
                let at = self.cursor_index();
                if at > 0 {
                    self.buffer.remove(at - 1);
                }
                self.settle_state();
            }
            Key::Delete => {
                self.begin_edit();
                self.buffer.clear();
                self.cursor_from_end = 0;
                self.settle_state();
            }
            Key::Left => {
                self.cursor_from_end = (self.cursor_from_end + 1).min(self.buffer.len());
            }
            Key::Right => {
                self.cursor_from_end = self.cursor_from_end.saturating_sub(1);
            }
            Key::Home => self.cursor_from_end = self.buffer.len(),
            Key::End => self.cursor_from_end = 0,
            Key::Up => self.history_older(),
            Key::Down => self.history_newer(),
            Key::Enter => return self.submit(),
            Key::PageUp | Key::PageDown => {}
        }
        None
    }

    /// Leave history browsing once the shown entry is edited
    fn begin_edit(&mut self) {
        if self.state == LineState::HistoryBrowsing {
            self.transient = None;
        }
        self.state = LineState::Composing;
    }

    fn settle_state(&mut self) {
        if self.buffer.is_empty() {
            self.state = LineState::Idle;
        }
    }

    fn history_older(&mut self) {
        if self.history.is_empty() {
            return;
        }
        if self.state != LineState::HistoryBrowsing {
            self.transient = Some(std::mem::take(&mut self.buffer));
            self.state = LineState::HistoryBrowsing;
            self.browse_index = self.history.len();
        }
        if self.browse_index > 0 {
            self.browse_index -= 1;
        }
        self.load_history(self.browse_index);
    }

    fn history_newer(&mut self) {
        if self.state != LineState::HistoryBrowsing {
            return;
        }
        if self.browse_index + 1 < self.history.len() {
            self.browse_index += 1;
            self.load_history(self.browse_index);
            return;
        }
        self.buffer = self.transient.take().unwrap_or_default();
        self.cursor_from_end = 0;
        self.state = if self.buffer.is_empty() {
            LineState::Idle
        } else {
            LineState::Composing
        };
    }

    fn load_history(&mut self, index: usize) {
        if let Some(entry) = self.history.get(index) {
            self.buffer = entry.text.chars().collect();
            self.cursor_from_end = 0;
        }
    }

    fn submit(&mut self) -> Option<Submission> {
        let text: String = self.buffer.drain(..).collect();
        self.cursor_from_end = 0;
        self.transient = None;
        self.state = LineState::Idle;

        if text.trim().is_empty() {
            return None;
        }

        let repeated = self.history.last().is_some_and(|last| last.text == text);
        if !repeated {
            self.history.push(HistoryEntry {
                text: text.clone(),
                color: self.color,
            });
        }
        tracing::debug!(command = %text, "command submitted");

        Some(Submission {
            text,
            color: self.color,
        })
    }

    /// Wrap prompt and buffer at `width` columns and locate the cursor
    ///
    /// A cursor past the last cell of a full row gets a row of its own.
    pub fn layout(&self, width: usize) -> CommandLayout {
        let width = width.max(1);
        let full: Vec<char> = PROMPT.chars().chain(self.buffer.iter().copied()).collect();

        let mut rows: Vec<String> = full
            .chunks(width)
            .map(|chunk| chunk.iter().collect())
            .collect();

        let pos = PROMPT.chars().count() + self.cursor_index();
        let cursor_row = pos / width;
        let cursor_col = pos % width;
        while rows.len() <= cursor_row {
            rows.push(String::new());
        }

        CommandLayout {
            rows,
            cursor_row,
            cursor_col,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> CommandLine {
        CommandLine::new(CommandHistory::new(), ColorToken::Default)
    }

    fn type_str(cl: &mut CommandLine, s: &str) {
        for c in s.chars() {
            cl.handle_key(Key::Char(c));
        }
    }

    #[test]
    fn test_typing_and_cursor() {
        let mut cl = line();
        assert_eq!(cl.state(), LineState::Idle);
        type_str(&mut cl, "ac");
        assert_eq!(cl.state(), LineState::Composing);
        cl.handle_key(Key::Left);
        cl.handle_key(Key::Char('b'));
        assert_eq!(cl.text(), "abc");
        assert_eq!(cl.cursor_from_end(), 1);
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut cl = line();
        type_str(&mut cl, "ab");
        for _ in 0..5 {
            cl.handle_key(Key::Left);
        }
        assert_eq!(cl.cursor_from_end(), 2);
        for _ in 0..5 {
            cl.handle_key(Key::Right);
        }
        assert_eq!(cl.cursor_from_end(), 0);
    }

    #[test]
    fn test_home_end() {
        let mut cl = line();
        type_str(&mut cl, "hello");
        cl.handle_key(Key::Home);
        assert_eq!(cl.cursor_from_end(), 5);
        assert_eq!(cl.cursor_index(), 0);
        cl.handle_key(Key::End);
        assert_eq!(cl.cursor_from_end(), 0);
    }

    #[test]
    fn test_backspace_before_cursor() {
        let mut cl = line();
        type_str(&mut cl, "abc");
        cl.handle_key(Key::Left);
        cl.handle_key(Key::Backspace);
        assert_eq!(cl.text(), "ac");
        cl.handle_key(Key::Home);
        cl.handle_key(Key::Backspace);
        assert_eq!(cl.text(), "ac");
    }

    #[test]
    fn test_delete_clears_buffer() {
        let mut cl = line();
        type_str(&mut cl, "abc");
        cl.handle_key(Key::Left);
        cl.handle_key(Key::Delete);
        assert!(cl.is_empty());
        assert_eq!(cl.cursor_from_end(), 0);
        assert_eq!(cl.state(), LineState::Idle);
    }

    #[test]
    fn test_enter_submits_and_resets() {
        let mut cl = line();
        type_str(&mut cl, "2+2");
        let sub = cl.handle_key(Key::Enter).unwrap();
        assert_eq!(sub.text, "2+2");
        assert!(cl.is_empty());
        assert_eq!(cl.state(), LineState::Idle);
        assert_eq!(cl.history().len(), 1);
    }

    #[test]
    fn test_repeated_command_not_duplicated() {
        let mut cl = line();
        type_str(&mut cl, "ls");
        cl.handle_key(Key::Enter);
        type_str(&mut cl, "ls");
        cl.handle_key(Key::Enter);
        assert_eq!(cl.history().len(), 1);
        type_str(&mut cl, "pwd");
        cl.handle_key(Key::Enter);
        type_str(&mut cl, "ls");
        cl.handle_key(Key::Enter);
        assert_eq!(cl.history().len(), 3);
    }

    #[test]
    fn test_blank_enter_submits_nothing() {
        let mut cl = line();
        type_str(&mut cl, "   ");
        assert!(cl.handle_key(Key::Enter).is_none());
        assert!(cl.history().is_empty());
    }

    #[test]
    fn test_up_down_restores_empty_buffer() {
        let mut cl = line();
        type_str(&mut cl, "ls");
        cl.handle_key(Key::Enter);

        cl.handle_key(Key::Up);
        assert_eq!(cl.state(), LineState::HistoryBrowsing);
        assert_eq!(cl.text(), "ls");

        cl.handle_key(Key::Down);
        assert_eq!(cl.text(), "");
        assert_eq!(cl.state(), LineState::Idle);
        assert_eq!(cl.history().len(), 1);
    }

    #[test]
    fn test_browsing_is_clamped_and_restores_draft() {
        let mut cl = line();
        for cmd in ["one", "two", "three"] {
            type_str(&mut cl, cmd);
            cl.handle_key(Key::Enter);
        }
        type_str(&mut cl, "dra");

        for _ in 0..5 {
            cl.handle_key(Key::Up);
        }
        assert_eq!(cl.text(), "one");

        cl.handle_key(Key::Down);
        assert_eq!(cl.text(), "two");
        cl.handle_key(Key::Down);
        assert_eq!(cl.text(), "three");
        cl.handle_key(Key::Down);
        assert_eq!(cl.text(), "dra");
        assert_eq!(cl.state(), LineState::Composing);

        // Down outside browsing does nothing
        cl.handle_key(Key::Down);
        assert_eq!(cl.text(), "dra");
    }

    #[test]
    fn test_editing_history_entry_leaves_browsing() {
        let mut cl = line();
        type_str(&mut cl, "ls");
        cl.handle_key(Key::Enter);
        cl.handle_key(Key::Up);
        cl.handle_key(Key::Char('l'));
        assert_eq!(cl.state(), LineState::Composing);
        assert_eq!(cl.text(), "lsl");
        cl.handle_key(Key::Down);
        assert_eq!(cl.text(), "lsl");
    }

    #[test]
    fn test_up_with_empty_history_is_noop() {
        let mut cl = line();
        cl.handle_key(Key::Up);
        assert_eq!(cl.state(), LineState::Idle);
    }

    #[test]
    fn test_layout_wraps_and_places_cursor() {
        let mut cl = line();
        type_str(&mut cl, "abcdef");
        let layout = cl.layout(4);
        assert_eq!(layout.rows, vec!["> ab", "cdef", ""]);
        assert_eq!((layout.cursor_row, layout.cursor_col), (2, 0));

        cl.handle_key(Key::Home);
        let layout = cl.layout(4);
        assert_eq!(layout.rows.len(), 2);
        assert_eq!((layout.cursor_row, layout.cursor_col), (0, 2));
    }
}
