//! Editing session tying the working list to its baseline and history

use tracing::{debug, info, warn};

use crate::collection::{AddOutcome, CollectionManager};
use crate::config::TrackerConfig;
use crate::entry::{sort_by_name, Entry, Scope, ValueKind};
use crate::error::{Result, TrackerError};
use crate::history::HistoryManager;
use crate::snapshot::SnapshotService;

/// Backing store the session loads from and persists to
pub trait EntryStore {
    /// Load the committed entries
    fn load(&mut self) -> Result<Vec<Entry>>;

    /// Write back the given changed entries.
    ///
    /// Entries flagged `is_pending_remove` are to be deleted from the store;
    /// all others are to be created or overwritten.
    fn persist(&mut self, changes: &[Entry]) -> Result<()>;
}

/// One editing session over a store.
///
/// Every edit is pushed onto the undo history immediately. Dirty state is
/// measured against the baseline captured at the last load or save.
pub struct EditSession<S: EntryStore> {
    store: S,
    entries: Vec<Entry>,
    snapshot: SnapshotService,
    history: HistoryManager,
}

impl<S: EntryStore> EditSession<S> {
    /// Load from `store` and start tracking
    pub fn open(store: S, config: &TrackerConfig) -> Result<Self> {
        let mut session = EditSession {
            store,
            entries: Vec::new(),
            snapshot: SnapshotService::new(),
            history: HistoryManager::with_config(config.history.clone()),
        };
        session.reload()?;
        Ok(session)
    }

    /// Discard all edits and history and load the store again
    pub fn reload(&mut self) -> Result<()> {
        let mut entries = self.store.load()?;
        sort_by_name(&mut entries);
        self.snapshot.capture_snapshot(&entries);
        self.history.reset(&entries);
        info!(entries = entries.len(), "session loaded");
        self.entries = entries;
        Ok(())
    }

    /// The working list
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The store backing this session
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Add, update or restore an entry by name
    pub fn add_or_update(&mut self, name: &str, value: &str, kind: ValueKind, scope: Scope) -> AddOutcome {
        let outcome = CollectionManager::add_or_update(&mut self.entries, name, value, kind, scope);
        if outcome.is_change() {
            self.history.push_state(&self.entries);
        }
        outcome
    }

    /// Remove the entry at `index`; returns whether it left the list
    pub fn remove(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let removed = CollectionManager::remove_entry(&mut self.entries, index);
        self.history.push_state(&self.entries);
        Ok(removed)
    }

    /// Remove every entry in `scope` whose name is not in `names_to_keep`
    pub fn remove_not_in<I, T>(&mut self, names_to_keep: I, scope: Scope) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let count = CollectionManager::remove_entries_not_in(&mut self.entries, names_to_keep, scope);
        if count > 0 {
            self.history.push_state(&self.entries);
        }
        count
    }

    /// Overwrite the value of the entry at `index`.
    ///
    /// Volatile entries accept the edit, but it is neither undoable nor
    /// reported as a change.
    pub fn set_value(&mut self, index: usize, value: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        let entry = &mut self.entries[index];
        if entry.is_volatile {
            debug!(name = %entry.name, "editing volatile entry");
        }
        entry.value = value.into();
        self.history.push_state(&self.entries);
        Ok(())
    }

    /// Rename the entry at `index`.
    ///
    /// Renaming onto another active entry of the same scope is rejected.
    pub fn rename(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        let name = name.into();
        let scope = self.entries[index].scope;
        if let Some(existing) = CollectionManager::find_in_scope(&self.entries, &name, scope) {
            if existing != index {
                return Err(TrackerError::validation_error(format!(
                    "an entry named {} already exists in scope {}",
                    name, scope
                )));
            }
        }
        self.entries[index].name = name;
        self.history.push_state(&self.entries);
        Ok(())
    }

    /// True when the working list differs from the last load or save
    pub fn is_dirty(&self) -> bool {
        self.snapshot.is_dirty(&self.entries)
    }

    /// Entries a save would write back
    pub fn changed_entries(&self) -> Vec<Entry> {
        self.snapshot.get_changed_entries(&self.entries)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Step back one edit; returns `false` when there was nothing to undo
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(entries) => {
                self.entries = entries;
                true
            }
            None => false,
        }
    }

    /// Re-apply one undone edit; returns `false` when there was nothing to redo
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(entries) => {
                self.entries = entries;
                true
            }
            None => false,
        }
    }

    /// Persist changed entries, then commit and re-baseline.
    ///
    /// Returns the number of entries written. When the store fails, the
    /// working list, baseline and history are left as they were. Undo
    /// history survives a save.
    pub fn save(&mut self) -> Result<usize> {
        let changes = self.snapshot.get_changed_entries(&self.entries);
        if changes.is_empty() {
            debug!("nothing to save");
            return Ok(0);
        }

        if let Err(err) = self.store.persist(&changes) {
            warn!(error = %err, changes = changes.len(), "save failed");
            return Err(err);
        }

        let removed = CollectionManager::commit_after_save(&mut self.entries);
        self.snapshot.capture_snapshot(&self.entries);
        self.history.push_state(&self.entries);
        self.history.commit_current(&self.entries);
        info!(written = changes.len(), removed, "session saved");
        Ok(changes.len())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(TrackerError::validation_error(format!(
                "entry index {} out of range (len {})",
                index,
                self.entries.len()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serves a fixed list and records every batch it is asked to persist
    #[derive(Default)]
    struct RecordingStore {
        seed: Vec<Entry>,
        batches: Vec<Vec<Entry>>,
        fail_persist: bool,
    }

    impl EntryStore for RecordingStore {
        fn load(&mut self) -> Result<Vec<Entry>> {
            Ok(self.seed.clone())
        }

        fn persist(&mut self, changes: &[Entry]) -> Result<()> {
            if self.fail_persist {
                return Err(TrackerError::store_error("access denied"));
            }
            self.batches.push(changes.to_vec());
            Ok(())
        }
    }

    fn user(name: &str, value: &str) -> Entry {
        Entry::new(name, value, ValueKind::PlainString, Scope::User)
    }

    fn open(entries: Vec<Entry>) -> EditSession<RecordingStore> {
        let store = RecordingStore {
            seed: entries,
            ..Default::default()
        };
        EditSession::open(store, &TrackerConfig::default()).unwrap()
    }

    #[test]
    fn test_open_sorts_and_is_clean() {
        let session = open(vec![user("b", "2"), user("A", "1")]);
        assert_eq!(session.entries()[0].name, "A");
        assert!(!session.is_dirty());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_edit_then_undo_is_clean() {
        let mut session = open(vec![user("A", "1")]);
        session.set_value(0, "2").unwrap();
        assert!(session.is_dirty());

        assert!(session.undo());
        assert!(!session.is_dirty());
        assert_eq!(session.entries()[0].value, "1");
    }

    #[test]
    fn test_no_action_does_not_push() {
        let mut session = open(vec![user("A", "1")]);
        let outcome = session.add_or_update("a", "1", ValueKind::PlainString, Scope::User);
        assert_eq!(outcome, AddOutcome::NoAction);
        assert!(!session.can_undo());
    }

    #[test]
    fn test_out_of_range_index() {
        let mut session = open(vec![user("A", "1")]);
        assert!(matches!(session.remove(3), Err(TrackerError::Validation(_))));
        assert!(matches!(session.set_value(3, "x"), Err(TrackerError::Validation(_))));
    }

    #[test]
    fn test_rename_onto_existing_is_rejected() {
        let mut session = open(vec![user("A", "1"), user("B", "2")]);
        assert!(session.rename(1, "a").is_err());
        assert!(session.rename(0, "a").is_ok());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_save_failure_keeps_state() {
        let mut session = open(vec![user("A", "1")]);
        session.remove(0).unwrap();
        session.store.fail_persist = true;

        assert!(matches!(session.save(), Err(TrackerError::Store(_))));
        assert!(session.is_dirty());
        assert!(session.entries()[0].is_pending_remove);
    }

    #[test]
    fn test_save_when_clean_skips_store() {
        let mut session = open(vec![user("A", "1")]);
        assert_eq!(session.save().unwrap(), 0);
        assert!(session.store().batches.is_empty());
    }

    #[test]
    fn test_remove_after_save_and_undo_is_persisted() {
        let mut session = open(vec![user("A", "1")]);
        let added = session
            .add_or_update("C", "3", ValueKind::PlainString, Scope::User)
            .index()
            .unwrap();
        assert_eq!(session.save().unwrap(), 1);

        assert!(!session.remove(added).unwrap());
        assert!(session.undo());
        assert!(!session.entries()[added].is_pending_add);
        assert!(!session.is_dirty());

        assert!(!session.remove(added).unwrap());
        assert!(session.entries()[added].is_pending_remove);
        assert!(session.is_dirty());

        assert_eq!(session.save().unwrap(), 1);
        let last = session.store().batches.last().unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].name, "C");
        assert!(last[0].is_pending_remove);
        assert!(session.entries().iter().all(|e| e.name != "C"));
    }
}
