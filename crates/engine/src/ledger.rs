//! Package → version → workspace grouping.
//!
//! Groups are computed over each workspace's merged effective declarations
//! and keyed by the exact version string. `^1.0.0` and `1.0.0` are distinct
//! groups; nothing here interprets semver.

use crate::core::Workspace;
use crate::index::WorkspaceIndex;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Identity and display name of a workspace inside a [`VersionGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WorkspaceRef {
    /// Workspace directory.
    pub path: PathBuf,
    /// Workspace display name.
    pub name: String,
}

impl From<&Workspace> for WorkspaceRef {
    fn from(workspace: &Workspace) -> Self {
        Self {
            path: workspace.path.clone(),
            name: workspace.name.clone(),
        }
    }
}

/// Workspaces grouped by the exact version string they declare for one
/// package. Versions and workspaces keep discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionGroup {
    package: String,
    versions: IndexMap<String, Vec<WorkspaceRef>>,
}

impl VersionGroup {
    /// An empty group for `package`.
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            versions: IndexMap::new(),
        }
    }

    /// Records that `workspace` declares `version`.
    pub fn insert(&mut self, version: impl Into<String>, workspace: WorkspaceRef) {
        self.versions
            .entry(version.into())
            .or_default()
            .push(workspace);
    }

    /// Package this group describes.
    #[must_use]
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Number of distinct version strings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Whether no workspace declares the package.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Whether more than one version string is in use.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.versions.len() > 1
    }

    /// Version strings in discovery order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }

    /// `(version, workspaces)` pairs in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[WorkspaceRef])> {
        self.versions.iter().map(|(v, ws)| (v.as_str(), ws.as_slice()))
    }

    /// Workspaces declaring exactly `version`.
    #[must_use]
    pub fn workspaces_for(&self, version: &str) -> &[WorkspaceRef] {
        self.versions.get(version).map_or(&[], Vec::as_slice)
    }

    /// Total number of workspaces across all versions.
    #[must_use]
    pub fn total_workspaces(&self) -> usize {
        self.versions.values().map(Vec::len).sum()
    }

    /// The version declared by the most workspaces.
    ///
    /// Ties go to the version seen first during discovery.
    #[must_use]
    pub fn most_common(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (version, workspaces) in &self.versions {
            if best.is_none_or(|(_, count)| workspaces.len() > count) {
                best = Some((version.as_str(), workspaces.len()));
            }
        }
        best
    }
}

/// Read-only grouping queries over a [`WorkspaceIndex`].
#[derive(Debug, Clone, Copy)]
pub struct VersionLedger<'a> {
    index: &'a WorkspaceIndex,
}

impl<'a> VersionLedger<'a> {
    /// Creates a ledger over `index`.
    #[must_use]
    pub const fn new(index: &'a WorkspaceIndex) -> Self {
        Self { index }
    }

    /// Groups the workspaces declaring `package` by version.
    ///
    /// Returns `None` when no workspace declares it.
    #[must_use]
    pub fn versions_of(&self, package: &str) -> Option<VersionGroup> {
        let mut group = VersionGroup::new(package);
        for workspace in self.index.workspaces() {
            if let Some(version) = workspace.version_of(package) {
                group.insert(version, WorkspaceRef::from(workspace));
            }
        }
        (!group.is_empty()).then_some(group)
    }

    /// Groups for every declared package, ordered by package name.
    #[must_use]
    pub fn all_groups(&self) -> Vec<VersionGroup> {
        let mut groups: BTreeMap<&str, VersionGroup> = BTreeMap::new();
        for workspace in self.index.workspaces() {
            for (package, version) in workspace.manifest.effective_declarations() {
                groups
                    .entry(package)
                    .or_insert_with(|| VersionGroup::new(package))
                    .insert(version, WorkspaceRef::from(workspace));
            }
        }
        groups.into_values().collect()
    }
}
