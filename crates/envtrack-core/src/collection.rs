//! Sorted, case-insensitive, soft-delete-aware list operations

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::entry::{compare_names, names_equal, Entry, EntryKey, Scope, ValueKind};

/// Result of [`CollectionManager::add_or_update`].
///
/// Every variant except `NoAction` carries the index of the affected entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Nothing changed: the entry is volatile or already holds the value
    NoAction,
    /// An active entry received a new value
    Updated(usize),
    /// A soft-deleted entry was brought back
    Restored(usize),
    /// A new pending-add entry was inserted
    Added(usize),
}

impl AddOutcome {
    /// Index of the affected entry, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            AddOutcome::NoAction => None,
            AddOutcome::Updated(i) | AddOutcome::Restored(i) | AddOutcome::Added(i) => Some(*i),
        }
    }

    /// True when the list was mutated
    pub fn is_change(&self) -> bool {
        !matches!(self, AddOutcome::NoAction)
    }
}

/// Stateless operations over a caller-owned entry list.
///
/// The list is kept ordered by case-insensitive name. Within a scope, at most
/// one entry per name is active (not pending removal).
pub struct CollectionManager;

impl CollectionManager {
    /// Add a new entry, update an active one, or restore a soft-deleted one.
    ///
    /// An existing entry keeps its `kind`; `kind` only applies to new entries.
    pub fn add_or_update(
        list: &mut Vec<Entry>,
        name: &str,
        value: &str,
        kind: ValueKind,
        scope: Scope,
    ) -> AddOutcome {
        if let Some(index) = Self::find_in_scope(list, name, scope) {
            let entry = &mut list[index];
            if entry.is_volatile {
                debug!(name = %entry.name, "ignoring update to volatile entry");
                return AddOutcome::NoAction;
            }
            if entry.value == value {
                return AddOutcome::NoAction;
            }
            entry.value = value.to_string();
            return AddOutcome::Updated(index);
        }

        let removed = list
            .iter()
            .position(|e| e.is_pending_remove && e.scope == scope && names_equal(&e.name, name));
        if let Some(index) = removed {
            let entry = &mut list[index];
            entry.is_pending_remove = false;
            if entry.value != value {
                entry.value = value.to_string();
            }
            debug!(name = %entry.name, scope = %scope, "restored soft-deleted entry");
            return AddOutcome::Restored(index);
        }

        let index = Self::find_insertion_index(list, name);
        list.insert(index, Entry::pending(name, value, kind, scope));
        debug!(name, scope = %scope, index, "added entry");
        AddOutcome::Added(index)
    }

    /// Remove the entry at `index`.
    ///
    /// An uncommitted entry is deleted outright and `true` is returned. A
    /// committed entry is soft-deleted and stays in the list (`false`).
    /// Volatile entries and out-of-range indices are left alone.
    pub fn remove_entry(list: &mut Vec<Entry>, index: usize) -> bool {
        let Some(entry) = list.get_mut(index) else {
            warn!(index, len = list.len(), "remove_entry index out of range");
            return false;
        };
        if entry.is_volatile {
            debug!(name = %entry.name, "ignoring removal of volatile entry");
            return false;
        }
        if entry.is_pending_add {
            list.remove(index);
            return true;
        }
        entry.is_pending_remove = true;
        false
    }

    /// Remove every active, non-volatile entry in `scope` whose name is not
    /// in `names_to_keep` (compared case-insensitively).
    ///
    /// Returns the number of entries removed or soft-deleted.
    pub fn remove_entries_not_in<I, S>(list: &mut Vec<Entry>, names_to_keep: I, scope: Scope) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keep: HashSet<EntryKey> = names_to_keep
            .into_iter()
            .map(|name| EntryKey::new(scope, name.as_ref()))
            .collect();

        let mut count = 0;
        // Walk backwards so deleting an uncommitted entry does not shift
        // indices that are still to be visited.
        for index in (0..list.len()).rev() {
            let entry = &list[index];
            if entry.scope != scope || entry.is_pending_remove || entry.is_volatile {
                continue;
            }
            if keep.contains(&entry.key()) {
                continue;
            }
            Self::remove_entry(list, index);
            count += 1;
        }

        if count > 0 {
            debug!(scope = %scope, count, "removed entries not in keep set");
        }
        count
    }

    /// Finalize the list after a successful save: drop soft-deleted entries
    /// and clear the pending-add flag on the rest.
    ///
    /// Returns the number of entries dropped.
    pub fn commit_after_save(list: &mut Vec<Entry>) -> usize {
        let before = list.len();
        list.retain(|e| !e.is_pending_remove);
        for entry in list.iter_mut() {
            entry.is_pending_add = false;
        }
        let removed = before - list.len();
        debug!(removed, remaining = list.len(), "committed entries after save");
        removed
    }

    /// Index of the first entry whose name sorts after `name`, or the list
    /// length when there is none
    pub fn find_insertion_index(list: &[Entry], name: &str) -> usize {
        list.iter()
            .position(|e| compare_names(name, &e.name).is_lt())
            .unwrap_or(list.len())
    }

    /// Index of the first active entry named `name`, in any scope
    pub fn find_by_name(list: &[Entry], name: &str) -> Option<usize> {
        list.iter()
            .position(|e| e.is_active() && names_equal(&e.name, name))
    }

    /// Index of the active entry named `name` in `scope`
    pub fn find_in_scope(list: &[Entry], name: &str, scope: Scope) -> Option<usize> {
        list.iter()
            .position(|e| e.is_active() && e.scope == scope && names_equal(&e.name, name))
    }
}
