//! Command history
//!
//! Ordered oldest to newest. Every mutation is written through to the
//! `commandHistoryBackup` slot of an optional key-value store, so a new
//! session can pick up where the last one ended.

use serde::{Deserialize, Serialize};

use crate::core::ColorToken;

use super::store::{KeyValueStore, StoreError};

/// Name of the durable slot holding the JSON-serialized history
pub const HISTORY_BACKUP_KEY: &str = "commandHistoryBackup";

/// Maximum number of commands kept; the oldest are dropped first
pub const HISTORY_BACKUP_LIMIT: usize = 500;

/// A previously submitted command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub text: String,
    pub color: ColorToken,
}

/// Command history with optional write-through persistence
pub struct CommandHistory {
    entries: Vec<HistoryEntry>,
    store: Option<Box<dyn KeyValueStore>>,
    limit: usize,
}

impl std::fmt::Debug for CommandHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHistory")
            .field("entries", &self.entries)
            .field("persistent", &self.store.is_some())
            .field("limit", &self.limit)
            .finish()
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHistory {
    /// In-memory history
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            store: None,
            limit: HISTORY_BACKUP_LIMIT,
        }
    }

    /// History backed by `store`, restoring whatever it already holds
    pub fn with_store(store: Box<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let mut entries: Vec<HistoryEntry> = match store.get(HISTORY_BACKUP_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        if entries.len() > HISTORY_BACKUP_LIMIT {
            entries.drain(..entries.len() - HISTORY_BACKUP_LIMIT);
        }
        tracing::debug!(restored = entries.len(), "command history restored");
        Ok(Self {
            entries,
            store: Some(store),
            limit: HISTORY_BACKUP_LIMIT,
        })
    }

    /// Whether mutations are mirrored to a store
    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Stop mirroring; entries stay in memory
    pub fn detach_store(&mut self) -> Option<Box<dyn KeyValueStore>> {
        self.store.take()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Append a command, dropping the oldest past the limit
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
        if self.entries.len() > self.limit {
            let excess = self.entries.len() - self.limit;
            self.entries.drain(..excess);
        }
        self.persist();
    }

    /// Remove and return the newest command
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        let entry = self.entries.pop();
        if entry.is_some() {
            self.persist();
        }
        entry
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    /// Write the current entries to the store
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let Some(store) = self.store.as_mut() else {
            return Ok(());
        };
        let json = serde_json::to_string(&self.entries)?;
        store.set(HISTORY_BACKUP_KEY, &json)
    }

    fn persist(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to back up command history: {}", e);
        }
    }
}
