//! Conflict detection: packages declared at more than one version string.
//!
//! Detection uses the merged effective view of each workspace. A package that
//! a single workspace declares in two slots at different versions is therefore
//! seen through its winning slot only; syncing later edits the first slot that
//! declares it. This mismatch is a known limitation.

use crate::index::WorkspaceIndex;
use crate::ledger::{VersionGroup, VersionLedger};

/// Finds conflicting packages in a [`WorkspaceIndex`].
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector<'a> {
    ledger: VersionLedger<'a>,
}

impl<'a> ConflictDetector<'a> {
    /// Creates a detector over `index`.
    #[must_use]
    pub const fn new(index: &'a WorkspaceIndex) -> Self {
        Self {
            ledger: VersionLedger::new(index),
        }
    }

    /// Every package with more than one distinct version string, ordered by
    /// package name (byte-wise, case-sensitive).
    #[must_use]
    pub fn all_conflicts(&self) -> Vec<(String, VersionGroup)> {
        let conflicts: Vec<_> = self
            .ledger
            .all_groups()
            .into_iter()
            .filter(VersionGroup::is_conflict)
            .map(|group| (group.package().to_string(), group))
            .collect();
        tracing::debug!("Detected {} conflicting package(s)", conflicts.len());
        conflicts
    }

    /// Whether `package` is declared at more than one version.
    #[must_use]
    pub fn is_conflicting(&self, package: &str) -> bool {
        self.ledger
            .versions_of(package)
            .is_some_and(|group| group.is_conflict())
    }
}
