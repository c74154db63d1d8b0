//! Snapshot based undo history
//!
//! Every entry holds a complete, immutable copy of the layout. Undo and redo
//! move an index through the entries; pushing after an undo drops the
//! entries ahead of the index. The oldest entry is evicted once the capacity
//! is reached.

use std::sync::Arc;

use keylayout_engine::{Layout, Result};

/// Trait for types that support undo/redo operations
pub trait UndoState {
    /// Get description of the next undo operation
    fn undo_description(&self) -> Option<String>;

    /// Check if undo is available
    fn can_undo(&self) -> bool;

    /// Perform undo operation
    fn undo(&mut self) -> Result<()>;

    /// Get description of the next redo operation
    fn redo_description(&self) -> Option<String>;

    /// Check if redo is available
    fn can_redo(&self) -> bool;

    /// Perform redo operation
    fn redo(&mut self) -> Result<()>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub layout: Arc<Layout>,
    pub description: String,
}

#[derive(Clone, Debug)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Index of the entry matching the current layout, `None` while empty.
    index: Option<usize>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(50)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: None,
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, layout: Layout, description: impl Into<String>) {
        self.push_shared(Arc::new(layout), description);
    }

    pub fn push_shared(&mut self, layout: Arc<Layout>, description: impl Into<String>) {
        let keep = self.index.map_or(0, |i| i + 1);
        self.entries.truncate(keep);
        self.entries.push(HistoryEntry {
            layout,
            description: description.into(),
        });
        while self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
        self.index = Some(self.entries.len() - 1);
    }

    /// Steps back and returns the snapshot that is now current.
    pub fn undo(&mut self) -> Option<Arc<Layout>> {
        let index = self.index.filter(|i| *i > 0)? - 1;
        self.index = Some(index);
        Some(self.entries[index].layout.clone())
    }

    /// Steps forward and returns the snapshot that is now current.
    pub fn redo(&mut self) -> Option<Arc<Layout>> {
        let index = self.index? + 1;
        let entry = self.entries.get(index)?;
        self.index = Some(index);
        Some(entry.layout.clone())
    }

    pub fn can_undo(&self) -> bool {
        self.index.is_some_and(|i| i > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.index.is_some_and(|i| i + 1 < self.entries.len())
    }

    /// Description of the change that undo would revert.
    pub fn undo_description(&self) -> Option<String> {
        let index = self.index.filter(|i| *i > 0)?;
        Some(self.entries[index].description.clone())
    }

    /// Description of the change that redo would reapply.
    pub fn redo_description(&self) -> Option<String> {
        let index = self.index? + 1;
        self.entries.get(index).map(|e| e.description.clone())
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.index?)
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn undo_len(&self) -> usize {
        self.index.unwrap_or(0)
    }

    pub fn redo_len(&self) -> usize {
        self.index.map_or(0, |i| self.entries.len() - i - 1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index = None;
    }
}
