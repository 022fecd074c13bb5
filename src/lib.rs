//! Shared fixtures for envtrack end-to-end tests

use std::collections::BTreeMap;

use envtrack_core::{Entry, EntryKey, EntryStore, Result, TrackerError};

/// In-memory stand-in for the system entry store.
///
/// Applies persisted changes the way a real backend would: pending removals
/// delete, everything else is written with its pending flags cleared.
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: BTreeMap<EntryKey, Entry>,
    /// Every batch passed to `persist`, in order
    pub persisted: Vec<Vec<Entry>>,
    /// When set, `persist` fails without writing
    pub fail_persist: bool,
    /// Number of `load` calls served
    pub loads: usize,
}

impl MemoryStore {
    /// Store seeded with committed entries
    pub fn with_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        MemoryStore {
            committed: entries.into_iter().map(|e| (e.key(), e)).collect(),
            ..Default::default()
        }
    }

    /// Committed entry by scope and name
    pub fn get(&self, scope: envtrack_core::Scope, name: &str) -> Option<&Entry> {
        self.committed.get(&EntryKey::new(scope, name))
    }

    /// Number of committed entries
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    /// True when nothing is committed
    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Change a committed value behind the session's back
    pub fn overwrite(&mut self, entry: Entry) {
        self.committed.insert(entry.key(), entry);
    }
}

impl EntryStore for MemoryStore {
    fn load(&mut self) -> Result<Vec<Entry>> {
        self.loads += 1;
        Ok(self.committed.values().cloned().collect())
    }

    fn persist(&mut self, changes: &[Entry]) -> Result<()> {
        if self.fail_persist {
            return Err(TrackerError::store_error("write access denied"));
        }
        for change in changes {
            if change.is_pending_remove {
                self.committed.remove(&change.key());
            } else {
                let mut stored = change.clone();
                stored.is_pending_add = false;
                self.committed.insert(stored.key(), stored);
            }
        }
        self.persisted.push(changes.to_vec());
        Ok(())
    }
}
