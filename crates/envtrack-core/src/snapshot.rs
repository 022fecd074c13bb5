//! Baseline capture and dirty detection

use std::collections::HashMap;

use tracing::debug;

use crate::entry::{Entry, EntryKey, Scope, ValueKind};

/// Committed state of one entry as seen at capture time
#[derive(Debug, Clone, PartialEq, Eq)]
struct Baseline {
    name: String,
    value: String,
    kind: ValueKind,
}

/// Holds the last committed baseline and compares working lists against it.
///
/// Construct once per editing session and rebind with
/// [`capture_snapshot`](Self::capture_snapshot) after every load or save.
#[derive(Debug, Default)]
pub struct SnapshotService {
    baseline: HashMap<EntryKey, Baseline>,
}

impl SnapshotService {
    /// Create a service with an empty baseline
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the baseline with the active, non-volatile entries of `entries`
    pub fn capture_snapshot(&mut self, entries: &[Entry]) {
        self.baseline = entries
            .iter()
            .filter(|e| e.is_tracked())
            .map(|e| {
                (
                    e.key(),
                    Baseline {
                        name: e.name.clone(),
                        value: e.value.clone(),
                        kind: e.kind,
                    },
                )
            })
            .collect();
        debug!(entries = self.baseline.len(), "captured snapshot");
    }

    /// True if `entries` differs from the baseline in any persisted respect
    pub fn is_dirty(&self, entries: &[Entry]) -> bool {
        self.changes(entries).next().is_some()
    }

    /// The entries that must be written back to bring the store in line with
    /// `entries`: soft-deleted baseline entries, pending adds, and
    /// modifications
    pub fn get_changed_entries(&self, entries: &[Entry]) -> Vec<Entry> {
        self.changes(entries).cloned().collect()
    }

    /// Number of entries in the baseline
    pub fn len(&self) -> usize {
        self.baseline.len()
    }

    /// True when nothing has been captured
    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty()
    }

    /// True if the baseline holds an entry named `name` in `scope`
    pub fn contains(&self, scope: Scope, name: &str) -> bool {
        self.baseline.contains_key(&EntryKey::new(scope, name))
    }

    fn changes<'a>(&'a self, entries: &'a [Entry]) -> impl Iterator<Item = &'a Entry> + 'a {
        entries.iter().filter(move |e| self.is_change(e))
    }

    fn is_change(&self, entry: &Entry) -> bool {
        if entry.is_volatile {
            return false;
        }
        if entry.is_pending_remove {
            return self.baseline.contains_key(&entry.key());
        }
        if entry.is_pending_add {
            return true;
        }
        // Identity is case-insensitive but the comparison is ordinal, so a
        // case-only rename counts as a modification.
        match self.baseline.get(&entry.key()) {
            Some(base) => base.name != entry.name || base.value != entry.value || base.kind != entry.kind,
            None => false,
        }
    }
}
