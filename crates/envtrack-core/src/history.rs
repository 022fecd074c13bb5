//! Delta-based undo/redo history

use std::collections::VecDeque;

use tracing::debug;

use crate::collection::CollectionManager;
use crate::config::HistoryConfig;
use crate::delta::{Delta, DeltaEngine};
use crate::entry::Entry;

/// Manages undo/redo stacks of deltas against a retained copy of the
/// current entry list.
///
/// Every list that enters or leaves the manager is copied; nothing is shared
/// with the caller. History only spans edits made since the last
/// [`reset`](Self::reset).
pub struct HistoryManager {
    /// Oldest delta at the front, most recent at the back
    undo_stack: VecDeque<Delta>,
    redo_stack: Vec<Delta>,
    current: Vec<Entry>,
    max_depth: usize,
}

impl HistoryManager {
    /// Create a history manager retaining the default 50 undo steps
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    /// Create a history manager from configuration.
    ///
    /// A zero depth is raised to one.
    pub fn with_config(config: HistoryConfig) -> Self {
        HistoryManager {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            current: Vec::new(),
            max_depth: config.max_depth.max(1),
        }
    }

    /// Clear both stacks and start over from `initial`
    pub fn reset(&mut self, initial: &[Entry]) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.current = initial.to_vec();
        debug!(entries = self.current.len(), "history reset");
    }

    /// Record the difference between the retained state and `entries`.
    ///
    /// Returns `false`, leaving the history untouched, when nothing changed.
    /// Otherwise the redo stack is discarded and, past the depth limit, the
    /// oldest undo step is dropped.
    pub fn push_state(&mut self, entries: &[Entry]) -> bool {
        let delta = DeltaEngine::compute_delta(&self.current, entries);
        if delta.is_empty() {
            debug!("state unchanged, push suppressed");
            return false;
        }

        self.undo_stack.push_back(delta);
        self.current = entries.to_vec();
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
            debug!(max_depth = self.max_depth, "evicted oldest undo step");
        }
        self.redo_stack.clear();
        debug!(undo = self.undo_stack.len(), "state pushed");
        true
    }

    /// Step back one delta and return a copy of the resulting state, or
    /// `None` when there is nothing to undo
    pub fn undo(&mut self) -> Option<Vec<Entry>> {
        let delta = self.undo_stack.pop_back()?;
        self.current = DeltaEngine::apply_delta(&self.current, &delta.reversed());
        debug!(records = delta.len(), undo = self.undo_stack.len(), "undo applied");
        self.redo_stack.push(delta);
        Some(self.current.clone())
    }

    /// Re-apply the most recently undone delta and return a copy of the
    /// resulting state, or `None` when there is nothing to redo
    pub fn redo(&mut self) -> Option<Vec<Entry>> {
        let delta = self.redo_stack.pop()?;
        self.current = DeltaEngine::apply_delta(&self.current, &delta);
        debug!(records = delta.len(), redo = self.redo_stack.len(), "redo applied");
        self.undo_stack.push_back(delta);
        Some(self.current.clone())
    }

    /// Replace the retained state with a committed copy of `entries`, keeping
    /// both stacks.
    ///
    /// A commit only changes pending flags, which deltas do not compare, so
    /// [`push_state`](Self::push_state) would leave the pre-commit flags in
    /// place and later records would carry them.
    pub fn commit_current(&mut self, entries: &[Entry]) {
        self.current = entries.to_vec();
        let removed = CollectionManager::commit_after_save(&mut self.current);
        debug!(entries = self.current.len(), removed, "history rebased on commit");
    }

    /// Drop all undo and redo steps, keeping the current state
    pub fn clear_history(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undoable steps
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redoable steps
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Maximum number of undo steps retained
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The retained state the next push is compared against
    pub fn current(&self) -> &[Entry] {
        &self.current
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new()
    }
}
