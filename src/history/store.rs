use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use super::storage::Storage;
use crate::config::PaletteConfig;
use crate::models::HistoryEntry;

/// Bounded, most-recent-first list of past invocations.
///
/// Queries are unique (exact, case-sensitive). The full list is written to
/// storage after every mutation. Storage failures never surface: reads fall
/// back to an empty history and failed writes are retried by the next
/// mutation.
pub struct HistoryStore {
    storage: Box<dyn Storage>,
    key: String,
    max_entries: usize,
    entries: Vec<HistoryEntry>,
    dirty: bool,
}

impl HistoryStore {
    /// Rehydrate from `storage`.
    ///
    /// A missing or non-array value is an empty history. Array elements that
    /// are not valid entries are skipped; duplicates and overflow are dropped.
    pub fn load(storage: Box<dyn Storage>, key: impl Into<String>, max_entries: usize) -> Self {
        let key = key.into();
        let max_entries = max_entries.max(1);

        let mut entries: Vec<HistoryEntry> = Vec::new();
        match storage.get(&key) {
            Some(Value::Array(items)) => {
                let total = items.len();
                for item in items {
                    match serde_json::from_value::<HistoryEntry>(item) {
                        Ok(entry) if !entries.iter().any(|e| e.query == entry.query) => {
                            entries.push(entry)
                        }
                        Ok(_) => {}
                        Err(e) => debug!(error = %e, "skipping malformed history entry"),
                    }
                }
                entries.truncate(max_entries);
                debug!(stored = total, kept = entries.len(), "history rehydrated");
            }
            Some(_) => warn!(key = key.as_str(), "stored history is not an array, starting empty"),
            None => {}
        }

        Self { storage, key, max_entries, entries, dirty: false }
    }

    pub fn from_config(storage: Box<dyn Storage>, config: &PaletteConfig) -> Self {
        Self::load(storage, config.history_key.clone(), config.max_history)
    }

    /// Entries, most recent first
    pub fn list(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// True while the last write to storage failed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record an invocation. Blank queries are ignored.
    pub fn add(&mut self, entry: HistoryEntry) {
        if entry.query.trim().is_empty() {
            return;
        }
        self.entries.retain(|existing| existing.query != entry.query);
        self.entries.insert(0, entry);
        self.entries.truncate(self.max_entries);
        self.persist();
    }

    /// Remove the entry for `query`, returning whether one existed
    pub fn remove(&mut self, query: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|existing| existing.query != query);
        let removed = self.entries.len() != before;
        if removed || self.dirty {
            self.persist();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        match self.storage.remove(&self.key) {
            Ok(()) => self.dirty = false,
            Err(e) => {
                warn!(key = self.key.as_str(), error = %e, "failed to clear stored history");
                self.dirty = true;
            }
        }
    }

    /// Retry a failed write. Returns true when storage is up to date.
    pub fn flush(&mut self) -> bool {
        if self.dirty {
            self.persist();
        }
        !self.dirty
    }

    fn persist(&mut self) {
        match self.write() {
            Ok(()) => self.dirty = false,
            Err(e) => {
                warn!(key = self.key.as_str(), error = %e, "failed to persist history");
                self.dirty = true;
            }
        }
    }

    fn write(&mut self) -> Result<()> {
        let value = serde_json::to_value(&self.entries).context("Failed to serialize history")?;
        self.storage.set(&self.key, value)
    }
}
