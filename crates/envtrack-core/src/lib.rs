#![warn(missing_docs)]

//! Change tracking for scoped environment entries
//!
//! Detects whether a working set of entries differs from its last committed
//! baseline, computes minimal deltas between snapshots of the set, and
//! replays them for bounded undo/redo.

pub mod collection;
pub mod config;
pub mod delta;
pub mod entry;
pub mod error;
pub mod history;
pub mod session;
pub mod snapshot;

// Re-export public API
pub use collection::{AddOutcome, CollectionManager};
pub use config::{ConfigLoader, HistoryConfig, TrackerConfig, DEFAULT_MAX_DEPTH};
pub use delta::{ChangeRecord, Delta, DeltaEngine};
pub use entry::{compare_names, names_equal, sort_by_name, Entry, EntryKey, Scope, ValueKind};
pub use error::{Result, TrackerError};
pub use history::HistoryManager;
pub use session::{EditSession, EntryStore};
pub use snapshot::SnapshotService;
