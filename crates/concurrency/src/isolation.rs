//! Isolation guarantees for one attempt
//!
//! The guarantee is explicit per call instead of ambient session state:
//! the coordinator passes it to `begin`, and nothing outside the call can
//! change it mid-attempt.

use serde::{Deserialize, Serialize};

/// Visibility contract for one transaction attempt
///
/// Semantics follow the standard definitions:
///
/// - `ReadCommitted`: no dirty reads.
/// - `RepeatableRead`: rows read during the attempt do not change under it.
/// - `Serializable`: additionally, no phantom rows matching a previously
///   evaluated predicate appear between validation and the corresponding
///   write. Required whenever a capacity or duplicate check feeds an
///   insert.
/// - `SnapshotVersioned`: consistent point-in-time view with writer-side
///   conflict detection instead of blocking (first committer wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IsolationGuarantee {
    /// No dirty reads
    ReadCommitted,
    /// No dirty or non-repeatable reads
    RepeatableRead,
    /// Full range protection: no phantoms across validate-then-write
    Serializable,
    /// Point-in-time snapshot with write-set conflict detection
    SnapshotVersioned,
}

impl IsolationGuarantee {
    /// Whether rows read during the attempt are re-validated at commit
    pub fn validates_reads(&self) -> bool {
        matches!(
            self,
            IsolationGuarantee::RepeatableRead | IsolationGuarantee::Serializable
        )
    }

    /// Whether predicate ranges read during the attempt are protected
    /// against phantom inserts
    pub fn protects_ranges(&self) -> bool {
        matches!(self, IsolationGuarantee::Serializable)
    }

    /// Whether commit performs write-set first-committer-wins validation
    pub fn validates_writes(&self) -> bool {
        matches!(self, IsolationGuarantee::SnapshotVersioned)
    }
}

impl std::fmt::Display for IsolationGuarantee {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IsolationGuarantee::ReadCommitted => "read-committed",
            IsolationGuarantee::RepeatableRead => "repeatable-read",
            IsolationGuarantee::Serializable => "serializable",
            IsolationGuarantee::SnapshotVersioned => "snapshot-versioned",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarantee_ladder() {
        assert!(!IsolationGuarantee::ReadCommitted.validates_reads());
        assert!(IsolationGuarantee::RepeatableRead.validates_reads());
        assert!(IsolationGuarantee::Serializable.validates_reads());
        assert!(IsolationGuarantee::Serializable.protects_ranges());
        assert!(!IsolationGuarantee::RepeatableRead.protects_ranges());
        assert!(IsolationGuarantee::SnapshotVersioned.validates_writes());
    }
}
