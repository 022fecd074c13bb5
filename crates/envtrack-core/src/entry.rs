//! Entry data model and case-insensitive identity helpers

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// How an entry's value is stored by the backing system.
///
/// Opaque to the tracking core: it is compared and copied, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    /// Plain string value
    PlainString,
    /// String whose value is expanded (and often split into a list) by consumers
    ExpandableString,
    /// Multi-value string
    MultiValue,
    /// Integer value
    Integer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::PlainString => write!(f, "PlainString"),
            ValueKind::ExpandableString => write!(f, "ExpandableString"),
            ValueKind::MultiValue => write!(f, "MultiValue"),
            ValueKind::Integer => write!(f, "Integer"),
        }
    }
}

/// Partition within which entry names are unique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Scope {
    /// Per-user entries
    User,
    /// Machine-wide entries
    System,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User => write!(f, "User"),
            Scope::System => write!(f, "System"),
        }
    }
}

/// One scoped key/value record under management
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Identifier; case-insensitive for identity, ordinal for change detection
    pub name: String,
    /// Payload
    pub value: String,
    /// Storage kind of the value
    pub kind: ValueKind,
    /// Scope the entry belongs to
    pub scope: Scope,
    /// Sourced from ephemeral external state; never tracked or persisted
    pub is_volatile: bool,
    /// Created since the last commit
    pub is_pending_add: bool,
    /// Soft-deleted, awaiting commit
    pub is_pending_remove: bool,
}

impl Entry {
    /// Create a committed entry, as supplied by the load collaborator
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        kind: ValueKind,
        scope: Scope,
    ) -> Self {
        Entry {
            name: name.into(),
            value: value.into(),
            kind,
            scope,
            is_volatile: false,
            is_pending_add: false,
            is_pending_remove: false,
        }
    }

    /// Create an uncommitted entry
    pub fn pending(
        name: impl Into<String>,
        value: impl Into<String>,
        kind: ValueKind,
        scope: Scope,
    ) -> Self {
        Entry {
            is_pending_add: true,
            ..Entry::new(name, value, kind, scope)
        }
    }

    /// Create a volatile entry
    pub fn volatile(
        name: impl Into<String>,
        value: impl Into<String>,
        kind: ValueKind,
        scope: Scope,
    ) -> Self {
        Entry {
            is_volatile: true,
            ..Entry::new(name, value, kind, scope)
        }
    }

    /// Case-folded `(scope, name)` identity of this entry
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.scope, &self.name)
    }

    /// True unless the entry is soft-deleted
    pub fn is_active(&self) -> bool {
        !self.is_pending_remove
    }

    /// True when the entry takes part in snapshots, dirty checks and deltas
    pub fn is_tracked(&self) -> bool {
        !self.is_volatile && !self.is_pending_remove
    }
}

/// Case-insensitive identity of an entry within its scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    scope: Scope,
    folded: String,
}

impl EntryKey {
    /// Build a key, folding `name` to lower case
    pub fn new(scope: Scope, name: &str) -> Self {
        EntryKey {
            scope,
            folded: folded(name).collect(),
        }
    }

    /// Scope component
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Case-folded name component
    pub fn folded_name(&self) -> &str {
        &self.folded
    }
}

fn folded(name: &str) -> impl Iterator<Item = char> + '_ {
    name.chars().flat_map(char::to_lowercase)
}

/// Case-insensitive ordering of two names
pub fn compare_names(a: &str, b: &str) -> Ordering {
    folded(a).cmp(folded(b))
}

/// Case-insensitive equality of two names
pub fn names_equal(a: &str, b: &str) -> bool {
    folded(a).eq(folded(b))
}

/// Sort entries by name, case-insensitively; ties keep their relative order
pub fn sort_by_name(entries: &mut [Entry]) {
    entries.sort_by(|a, b| compare_names(&a.name, &b.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_flags() {
        let committed = Entry::new("PATH", "/bin", ValueKind::ExpandableString, Scope::User);
        assert!(!committed.is_pending_add);
        assert!(!committed.is_volatile);
        assert!(committed.is_active());
        assert!(committed.is_tracked());

        let pending = Entry::pending("TEMP", "/tmp", ValueKind::PlainString, Scope::User);
        assert!(pending.is_pending_add);
        assert!(!pending.is_pending_remove);

        let volatile = Entry::volatile("SESSIONNAME", "Console", ValueKind::PlainString, Scope::User);
        assert!(volatile.is_volatile);
        assert!(!volatile.is_tracked());
    }

    #[test]
    fn test_key_is_case_insensitive_within_scope() {
        let upper = Entry::new("PATH", "a", ValueKind::PlainString, Scope::User);
        let lower = Entry::new("path", "b", ValueKind::PlainString, Scope::User);
        let system = Entry::new("PATH", "a", ValueKind::PlainString, Scope::System);

        assert_eq!(upper.key(), lower.key());
        assert_ne!(upper.key(), system.key());
        assert_eq!(upper.key().folded_name(), "path");
        assert_eq!(system.key().scope(), Scope::System);
    }

    #[test]
    fn test_compare_names() {
        assert_eq!(compare_names("alpha", "BETA"), Ordering::Less);
        assert_eq!(compare_names("Gamma", "beta"), Ordering::Greater);
        assert_eq!(compare_names("Path", "PATH"), Ordering::Equal);
        assert!(names_equal("JAVA_HOME", "java_home"));
        assert!(!names_equal("JAVA_HOME", "JAVA_HOME2"));
    }

    #[test]
    fn test_sort_by_name_is_stable() {
        let mut entries = vec![
            Entry::new("b", "1", ValueKind::PlainString, Scope::User),
            Entry::new("A", "2", ValueKind::PlainString, Scope::System),
            Entry::new("a", "3", ValueKind::PlainString, Scope::User),
        ];
        sort_by_name(&mut entries);
        let values: Vec<_> = entries.iter().map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueKind::ExpandableString.to_string(), "ExpandableString");
        assert_eq!(Scope::System.to_string(), "System");
    }
}
