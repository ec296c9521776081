//! Reflow engine
//!
//! Owns the raw input history and the display lines derived from it. Raw
//! entries are kept in arrival order and bounded by the history limit;
//! display lines are a disposable projection of them at the current line
//! width and are rebuilt from scratch by `reflow`.
//!
//! Eviction is entry-accurate: when the oldest raw entry is dropped, every
//! display line derived from it is dropped with it, however many chunks it
//! wrapped into.

use std::collections::VecDeque;

use crate::error::ConsoleError;
use crate::format::LogArg;

use super::color::ColorToken;
use super::line::{wrap_text_at, DisplayLine, RawEntry};

/// A visual row: one display line plus its same-line continuations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row {
    /// Index of the first display line of the row
    pub start: usize,
    /// One past the last display line of the row
    pub end: usize,
}

/// Raw history plus width-wrapped display lines
#[derive(Debug, Clone)]
pub struct ReflowEngine {
    raw: VecDeque<RawEntry>,
    lines: VecDeque<DisplayLine>,
    next_id: u64,
    history_limit: usize,
    max_line_width: usize,
    show_stack_traces: bool,
    /// Column where the last visual row currently ends
    row_col: usize,
}

impl ReflowEngine {
    /// Create an engine keeping at most `history_limit` raw entries
    pub fn new(history_limit: usize, max_line_width: usize) -> Self {
        Self {
            raw: VecDeque::with_capacity(history_limit.min(1024)),
            lines: VecDeque::new(),
            next_id: 0,
            history_limit: history_limit.max(1),
            max_line_width: max_line_width.max(1),
            show_stack_traces: false,
            row_col: 0,
        }
    }

    /// Append one unit of text
    ///
    /// Fails with `InvalidInputKind` for anything that is not already text;
    /// callers stringify through the formatter first. Returns the number of
    /// display lines produced.
    pub fn append(
        &mut self,
        payload: impl Into<LogArg>,
        color: ColorToken,
        stack_trace: bool,
        same_line: bool,
    ) -> Result<usize, ConsoleError> {
        let text = match payload.into() {
            LogArg::Text(text) => text,
            LogArg::Value(serde_json::Value::String(text)) => text,
            other => {
                return Err(ConsoleError::InvalidInputKind {
                    kind: other.kind_name(),
                })
            }
        };

        let entry = RawEntry {
            id: self.next_id,
            text,
            color,
            stack_trace,
            same_line,
        };
        self.next_id += 1;

        let produced = self.layout(&entry);
        self.raw.push_back(entry);
        self.evict();
        Ok(produced)
    }

    /// Rebuild every display line from the raw history
    ///
    /// Idempotent: with unchanged width the result equals the current queue.
    pub fn reflow(&mut self) {
        self.lines.clear();
        self.row_col = 0;
        let raw = std::mem::take(&mut self.raw);
        for entry in &raw {
            self.layout(entry);
        }
        self.raw = raw;
        tracing::debug!(
            entries = self.raw.len(),
            lines = self.lines.len(),
            width = self.max_line_width,
            "reflowed console history"
        );
    }

    /// Change the wrap width, reflowing if it differs
    pub fn set_max_line_width(&mut self, width: usize) {
        let width = width.max(1);
        if width != self.max_line_width {
            self.max_line_width = width;
            self.reflow();
        }
    }

    pub fn max_line_width(&self) -> usize {
        self.max_line_width
    }

    /// Show or hide stack trace entries, reflowing if it changes
    pub fn set_show_stack_traces(&mut self, show: bool) {
        if show != self.show_stack_traces {
            self.show_stack_traces = show;
            self.reflow();
        }
    }

    pub fn show_stack_traces(&self) -> bool {
        self.show_stack_traces
    }

    /// Change the history limit, evicting immediately if it shrank
    pub fn set_history_limit(&mut self, limit: usize) {
        self.history_limit = limit.max(1);
        self.evict();
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Drop all history and display lines
    pub fn clear(&mut self) {
        self.raw.clear();
        self.lines.clear();
        self.row_col = 0;
    }

    /// Raw entries, oldest first
    pub fn raw_entries(&self) -> impl ExactSizeIterator<Item = &RawEntry> {
        self.raw.iter()
    }

    pub fn raw_len(&self) -> usize {
        self.raw.len()
    }

    /// Display lines, oldest first
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &DisplayLine> {
        self.lines.iter()
    }

    pub fn line(&self, index: usize) -> Option<&DisplayLine> {
        self.lines.get(index)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Group display lines into visual rows
    pub fn rows(&self) -> Vec<Row> {
        let mut rows: Vec<Row> = Vec::new();
        for (i, line) in self.lines.iter().enumerate() {
            match rows.last_mut() {
                Some(row) if line.continues_prior_line => row.end = i + 1,
                _ => rows.push(Row { start: i, end: i + 1 }),
            }
        }
        rows
    }

    /// Number of visual rows
    pub fn row_count(&self) -> usize {
        self.lines
            .iter()
            .enumerate()
            .filter(|(i, line)| *i == 0 || !line.continues_prior_line)
            .count()
    }

    /// Wrap one entry and push its display lines
    fn layout(&mut self, entry: &RawEntry) -> usize {
        if !self.is_visible(entry) {
            return 0;
        }

        let width = self.max_line_width;
        let joins_row = entry.same_line && !self.lines.is_empty() && self.row_col < width;
        let start_col = if joins_row { self.row_col } else { 0 };

        let chunks = wrap_text_at(&entry.text, width, start_col);
        let produced = chunks.len();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let continues_prior_line = i == 0 && joins_row;
            let len = chunk.text.chars().count();
            if continues_prior_line {
                self.row_col += len;
            } else {
                self.row_col = len;
            }
            self.lines.push_back(DisplayLine {
                text: chunk.text,
                color: entry.color,
                continues_prior_line,
                wrapped: chunk.wrapped,
                entry_id: entry.id,
            });
        }
        produced
    }

    fn is_visible(&self, entry: &RawEntry) -> bool {
        !entry.stack_trace || self.show_stack_traces
    }

    /// Trim the raw history to the limit, dropping the evicted entries' lines
    ///
    /// Afterwards the queue equals what `reflow` would build from the
    /// remaining entries.
    fn evict(&mut self) {
        let before = self.raw.len();
        while self.raw.len() > self.history_limit {
            let Some(evicted) = self.raw.pop_front() else {
                break;
            };
            while self
                .lines
                .front()
                .is_some_and(|line| line.entry_id == evicted.id)
            {
                self.lines.pop_front();
            }
        }
        if self.raw.len() < before {
            self.relayout_front();
        }
    }

    /// Lay out again the leading entries whose first row was shared with an
    /// evicted entry
    fn relayout_front(&mut self) {
        if !self.lines.front().is_some_and(|line| line.continues_prior_line) {
            return;
        }

        // The next visible entry opening its own row keeps its layout
        let boundary = self
            .raw
            .iter()
            .skip(1)
            .find(|entry| !entry.same_line && self.is_visible(entry))
            .and_then(|entry| {
                let split = self.lines.iter().position(|line| line.entry_id == entry.id)?;
                Some((entry.id, split))
            });

        let tail = match boundary {
            Some((_, split)) => self.lines.split_off(split),
            None => VecDeque::new(),
        };
        let row_col = self.row_col;
        self.lines.clear();
        self.row_col = 0;

        let raw = std::mem::take(&mut self.raw);
        for entry in raw
            .iter()
            .take_while(|entry| boundary.map_or(true, |(id, _)| entry.id != id))
        {
            self.layout(entry);
        }
        self.raw = raw;

        if !tail.is_empty() {
            self.row_col = row_col;
            self.lines.extend(tail);
        }
    }
}
