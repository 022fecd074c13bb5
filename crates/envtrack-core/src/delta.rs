//! Minimal differences between entry lists, and their replay and inversion

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::entry::{names_equal, sort_by_name, Entry, EntryKey, Scope, ValueKind};

/// One tagged difference between two entry lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeRecord {
    /// Entry present only in the target state; carries all of its fields
    Added(Entry),
    /// Entry present only in the source state; carries all of its fields
    Removed(Entry),
    /// Entry present in both states with a different value or kind
    Modified {
        /// Scope of the entry
        scope: Scope,
        /// Name of the entry
        name: String,
        /// Value in the source state
        old_value: String,
        /// Value in the target state
        new_value: String,
        /// Kind in the source state
        old_kind: ValueKind,
        /// Kind in the target state
        new_kind: ValueKind,
    },
}

impl ChangeRecord {
    /// Scope of the affected entry
    pub fn scope(&self) -> Scope {
        match self {
            ChangeRecord::Added(e) | ChangeRecord::Removed(e) => e.scope,
            ChangeRecord::Modified { scope, .. } => *scope,
        }
    }

    /// Name of the affected entry
    pub fn name(&self) -> &str {
        match self {
            ChangeRecord::Added(e) | ChangeRecord::Removed(e) => &e.name,
            ChangeRecord::Modified { name, .. } => name,
        }
    }

    /// Case-folded identity of the affected entry
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.scope(), self.name())
    }

    /// The record that undoes this one
    pub fn reversed(&self) -> ChangeRecord {
        match self {
            ChangeRecord::Added(e) => ChangeRecord::Removed(e.clone()),
            ChangeRecord::Removed(e) => ChangeRecord::Added(e.clone()),
            ChangeRecord::Modified {
                scope,
                name,
                old_value,
                new_value,
                old_kind,
                new_kind,
            } => ChangeRecord::Modified {
                scope: *scope,
                name: name.clone(),
                old_value: new_value.clone(),
                new_value: old_value.clone(),
                old_kind: *new_kind,
                new_kind: *old_kind,
            },
        }
    }

    fn targets(&self, entry: &Entry) -> bool {
        entry.scope == self.scope() && names_equal(&entry.name, self.name())
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeRecord::Added(e) => write!(f, "+ {}:{} = {:?}", e.scope, e.name, e.value),
            ChangeRecord::Removed(e) => write!(f, "- {}:{} = {:?}", e.scope, e.name, e.value),
            ChangeRecord::Modified {
                scope,
                name,
                old_value,
                new_value,
                old_kind,
                new_kind,
            } => {
                write!(f, "~ {}:{} {:?} -> {:?}", scope, name, old_value, new_value)?;
                if old_kind != new_kind {
                    write!(f, " ({} -> {})", old_kind, new_kind)?;
                }
                Ok(())
            }
        }
    }
}

/// Ordered list of change records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    records: Vec<ChangeRecord>,
}

impl Delta {
    /// Create a delta from records, keeping their order
    pub fn new(records: Vec<ChangeRecord>) -> Self {
        Delta { records }
    }

    /// True when the delta has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// The records in order
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Iterate over the records in order
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.records.iter()
    }

    /// Number of `Added` records
    pub fn added_count(&self) -> usize {
        self.iter().filter(|r| matches!(r, ChangeRecord::Added(_))).count()
    }

    /// Number of `Removed` records
    pub fn removed_count(&self) -> usize {
        self.iter().filter(|r| matches!(r, ChangeRecord::Removed(_))).count()
    }

    /// Number of `Modified` records
    pub fn modified_count(&self) -> usize {
        self.iter().filter(|r| matches!(r, ChangeRecord::Modified { .. })).count()
    }

    /// Per-record inverse; record order is unchanged
    pub fn reversed(&self) -> Delta {
        Delta::new(self.iter().map(ChangeRecord::reversed).collect())
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Computes, applies and inverts deltas
pub struct DeltaEngine;

impl DeltaEngine {
    /// Minimal delta turning `from` into `to`.
    ///
    /// Soft-deleted and volatile entries take no part in either side. Added
    /// and modified records follow the order of `to`, then removed records
    /// follow the order of `from`.
    pub fn compute_delta(from: &[Entry], to: &[Entry]) -> Delta {
        let from_map = Self::index(from);
        let to_map = Self::index(to);
        let mut records = Vec::new();

        for entry in to.iter().filter(|e| e.is_tracked()) {
            match from_map.get(&entry.key()) {
                None => records.push(ChangeRecord::Added(entry.clone())),
                Some(old) if old.value != entry.value || old.kind != entry.kind => {
                    records.push(ChangeRecord::Modified {
                        scope: entry.scope,
                        name: entry.name.clone(),
                        old_value: old.value.clone(),
                        new_value: entry.value.clone(),
                        old_kind: old.kind,
                        new_kind: entry.kind,
                    });
                }
                Some(_) => {}
            }
        }

        for entry in from.iter().filter(|e| e.is_tracked()) {
            if !to_map.contains_key(&entry.key()) {
                records.push(ChangeRecord::Removed(entry.clone()));
            }
        }

        let delta = Delta::new(records);
        if !delta.is_empty() {
            debug!(
                added = delta.added_count(),
                removed = delta.removed_count(),
                modified = delta.modified_count(),
                "computed delta"
            );
        }
        delta
    }

    /// Apply `delta` to a copy of `state` and return the result sorted by name.
    ///
    /// Applying the same `Added` record twice leaves a single entry.
    pub fn apply_delta(state: &[Entry], delta: &Delta) -> Vec<Entry> {
        let mut result = state.to_vec();

        for record in delta {
            match record {
                ChangeRecord::Added(entry) => {
                    result.retain(|e| !record.targets(e));
                    result.push(entry.clone());
                }
                ChangeRecord::Removed(_) => {
                    result.retain(|e| !record.targets(e));
                }
                ChangeRecord::Modified {
                    new_value, new_kind, ..
                } => {
                    let position = result
                        .iter()
                        .position(|e| e.is_active() && record.targets(e))
                        .or_else(|| result.iter().position(|e| record.targets(e)));
                    match position {
                        Some(index) => {
                            result[index].value = new_value.clone();
                            result[index].kind = *new_kind;
                        }
                        None => warn!(record = %record, "no entry to modify"),
                    }
                }
            }
        }

        sort_by_name(&mut result);
        result
    }

    /// Inverse of `delta`
    pub fn reverse_delta(delta: &Delta) -> Delta {
        delta.reversed()
    }

    fn index(entries: &[Entry]) -> HashMap<EntryKey, &Entry> {
        entries
            .iter()
            .filter(|e| e.is_tracked())
            .map(|e| (e.key(), e))
            .collect()
    }
}
