//! Linear undo/redo history of document snapshots.

use crate::error::{EditorError, EditorResult};
use crate::shapes::{Shape, ShapeId};
use serde::{Deserialize, Serialize};

/// Immutable capture of the shape list and selection at one history point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub shapes: Vec<Shape>,
    pub selected_ids: Vec<ShapeId>,
}

/// Snapshots plus a cursor. `entries[index]` always mirrors the live document
/// right after the last committed change.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: Vec<HistorySnapshot>,
    index: usize,
    limit: Option<usize>,
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HistoryStack {
    /// Start with a single empty snapshot. `limit` caps the retained entries.
    pub fn new(limit: Option<usize>) -> Self {
        Self::with_initial(HistorySnapshot::default(), limit)
    }

    pub fn with_initial(initial: HistorySnapshot, limit: Option<usize>) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            limit: limit.map(|l| l.max(1)),
        }
    }

    /// Drop everything and start again from `initial`.
    pub fn reset(&mut self, initial: HistorySnapshot) {
        self.entries.clear();
        self.entries.push(initial);
        self.index = 0;
    }

    /// Push a snapshot, discarding any redo branch first.
    pub fn save(&mut self, snapshot: HistorySnapshot) {
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);
        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let excess = self.entries.len() - limit;
                self.entries.drain(..excess);
            }
        }
        self.index = self.entries.len() - 1;
        log::debug!("History saved ({}/{})", self.index + 1, self.entries.len());
    }

    /// Step back and return the snapshot to restore.
    pub fn undo(&mut self) -> EditorResult<&HistorySnapshot> {
        if !self.can_undo() {
            return Err(EditorError::HistoryUnderflow);
        }
        self.index -= 1;
        Ok(&self.entries[self.index])
    }

    /// Step forward and return the snapshot to restore.
    pub fn redo(&mut self) -> EditorResult<&HistorySnapshot> {
        if !self.can_redo() {
            return Err(EditorError::HistoryOverflow);
        }
        self.index += 1;
        Ok(&self.entries[self.index])
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn current(&self) -> &HistorySnapshot {
        &self.entries[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
