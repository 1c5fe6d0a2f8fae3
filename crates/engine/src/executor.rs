//! Applies change plans to manifests.
//!
//! Records are batched per workspace: each manifest is read once, every
//! record for it is applied in memory, and the result is written once. A
//! workspace that fails to read or write has its records marked failed while
//! the remaining workspaces are still processed.
//!
//! The executor never refreshes the [`crate::WorkspaceIndex`]; callers do that
//! after a successful non-dry-run apply.

use crate::core::{ChangeRecord, ManifestStore};
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RecordStatus {
    /// Persisted.
    Applied,
    /// Dry run: computed but not persisted.
    Skipped,
    /// The workspace's manifest could not be read or written.
    Failed {
        /// Why the workspace failed.
        reason: String,
    },
}

impl RecordStatus {
    /// Whether this record failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// A [`ChangeRecord`] together with what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutedChange {
    /// The planned edit.
    #[serde(flatten)]
    pub record: ChangeRecord,
    /// Its outcome.
    #[serde(flatten)]
    pub status: RecordStatus,
}

/// Per-record results of one [`ChangeExecutor::apply`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Records in plan order.
    pub changes: Vec<ExecutedChange>,
}

impl ExecutionReport {
    /// `true` when no record failed.
    #[must_use]
    pub fn success(&self) -> bool {
        !self.changes.iter().any(|c| c.status.is_failed())
    }

    /// The records, stripped of status, in plan order.
    pub fn records(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.changes.iter().map(|c| &c.record)
    }

    /// Failed records.
    pub fn failures(&self) -> impl Iterator<Item = &ExecutedChange> {
        self.changes.iter().filter(|c| c.status.is_failed())
    }

    /// Number of applied records.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.status == RecordStatus::Applied)
            .count()
    }

    /// Unique workspace paths that appear in the report, in plan order.
    #[must_use]
    pub fn workspaces(&self) -> Vec<PathBuf> {
        self.changes
            .iter()
            .map(|c| c.record.workspace.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether the plan was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Serialized shape of [`ExecutionReport`] including the derived flag.
#[derive(Serialize)]
struct ReportSummary<'a> {
    success: bool,
    #[serde(flatten)]
    report: &'a ExecutionReport,
}

impl ExecutionReport {
    /// JSON value with an explicit `success` field.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(ReportSummary {
            success: self.success(),
            report: self,
        })
    }
}

/// Applies plans through a [`ManifestStore`].
#[derive(Debug)]
pub struct ChangeExecutor<'s, S: ManifestStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: ManifestStore + ?Sized> ChangeExecutor<'s, S> {
    /// Creates an executor writing through `store`.
    pub const fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Applies `plan`, or previews it when `dry_run` is set.
    ///
    /// A dry run reads each manifest to surface read failures but never writes.
    /// The returned records are identical in both modes; only their statuses
    /// differ.
    pub fn apply(&self, plan: &[ChangeRecord], dry_run: bool) -> ExecutionReport {
        let mut batches: IndexMap<&Path, Vec<usize>> = IndexMap::new();
        for (position, record) in plan.iter().enumerate() {
            batches
                .entry(record.workspace.as_path())
                .or_default()
                .push(position);
        }

        let mut statuses: Vec<Option<RecordStatus>> = vec![None; plan.len()];
        for (workspace, positions) in &batches {
            let status = match self.apply_batch(workspace, plan, positions, dry_run) {
                Ok(()) if dry_run => RecordStatus::Skipped,
                Ok(()) => RecordStatus::Applied,
                Err(e) => {
                    tracing::warn!("Failed to update {}: {}", workspace.display(), e);
                    RecordStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            for &position in positions {
                statuses[position] = Some(status.clone());
            }
        }

        let changes: Vec<_> = plan
            .iter()
            .cloned()
            .zip(statuses)
            .map(|(record, status)| ExecutedChange {
                record,
                status: status.unwrap_or(RecordStatus::Skipped),
            })
            .collect();

        let report = ExecutionReport { dry_run, changes };
        if dry_run {
            tracing::debug!(
                "Previewed {} change(s) across {} workspace(s)",
                report.changes.len(),
                batches.len()
            );
        } else {
            tracing::info!(
                "Applied {} of {} change(s) across {} workspace(s)",
                report.applied_count(),
                report.changes.len(),
                batches.len()
            );
        }
        report
    }

    fn apply_batch(
        &self,
        workspace: &Path,
        plan: &[ChangeRecord],
        positions: &[usize],
        dry_run: bool,
    ) -> crate::Result<()> {
        let mut manifest = self.store.read(workspace)?;
        for &position in positions {
            plan[position].apply_to(&mut manifest);
        }
        if dry_run {
            return Ok(());
        }
        self.store.write(workspace, &manifest)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::{ChangeAction, DependencySlot};
    use crate::store::JsonManifestStore;
    use std::fs;
    use tempfile::TempDir;

    fn record(
        workspace: &Path,
        slot: DependencySlot,
        package: &str,
        before: Option<&str>,
        after: Option<&str>,
        action: ChangeAction,
    ) -> ChangeRecord {
        ChangeRecord {
            workspace: workspace.to_path_buf(),
            workspace_name: workspace
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned(),
            package: package.to_string(),
            slot,
            before: before.map(str::to_string),
            after: after.map(str::to_string),
            action,
        }
    }

    fn write_manifest(dir: &Path, content: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("package.json"), content).unwrap();
    }

    fn read_raw(dir: &Path) -> String {
        fs::read_to_string(dir.join("package.json")).unwrap()
    }

    #[test]
    fn test_apply_batches_records_per_workspace() {
        let temp_dir = TempDir::new().unwrap();
        let web = temp_dir.path().join("web");
        write_manifest(
            &web,
            r#"{"name": "web", "scripts": {"dev": "vite"}, "dependencies": {"react": "^17.0.0"},
                "peerDependencies": {"react": "^17.0.0"}}"#,
        );

        let plan = vec![
            record(
                &web,
                DependencySlot::Dependencies,
                "react",
                Some("^17.0.0"),
                Some("^18.0.0"),
                ChangeAction::Update,
            ),
            record(
                &web,
                DependencySlot::PeerDependencies,
                "react",
                Some("^17.0.0"),
                None,
                ChangeAction::Remove,
            ),
            record(
                &web,
                DependencySlot::DevDependencies,
                "vitest",
                None,
                Some("^1.0.0"),
                ChangeAction::Add,
            ),
        ];

        let report = ChangeExecutor::new(&JsonManifestStore).apply(&plan, false);
        assert!(report.success());
        assert_eq!(report.applied_count(), 3);
        assert_eq!(report.workspaces(), vec![web.clone()]);

        let manifest = JsonManifestStore.read(&web).unwrap();
        assert_eq!(
            manifest.get(DependencySlot::Dependencies, "react"),
            Some("^18.0.0")
        );
        assert_eq!(manifest.get(DependencySlot::PeerDependencies, "react"), None);
        assert_eq!(
            manifest.get(DependencySlot::DevDependencies, "vitest"),
            Some("^1.0.0")
        );
        assert!(manifest.extra.contains_key("scripts"));
    }

    #[test]
    fn test_apply_keeps_null_fields() {
        let temp_dir = TempDir::new().unwrap();
        let api = temp_dir.path().join("api");
        write_manifest(
            &api,
            r#"{"name": null, "peerDependencies": null, "dependencies": {"zod": "^3.0.0"}}"#,
        );

        let plan = vec![record(
            &api,
            DependencySlot::Dependencies,
            "zod",
            Some("^3.0.0"),
            Some("^3.23.0"),
            ChangeAction::Update,
        )];
        let report = ChangeExecutor::new(&JsonManifestStore).apply(&plan, false);
        assert!(report.success());

        let written: serde_json::Value = serde_json::from_str(&read_raw(&api)).unwrap();
        let object = written.as_object().unwrap();
        assert_eq!(object.get("peerDependencies"), Some(&serde_json::Value::Null));
        assert_eq!(object.get("name"), Some(&serde_json::Value::Null));
        assert_eq!(written["dependencies"]["zod"], "^3.23.0");
    }

    #[test]
    fn test_dry_run_leaves_bytes_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let lib = temp_dir.path().join("lib");
        let original = "{\"name\":\"lib\",\"dependencies\":{\"zod\":\"^3.0.0\"}}";
        write_manifest(&lib, original);

        let plan = vec![record(
            &lib,
            DependencySlot::Dependencies,
            "zod",
            Some("^3.0.0"),
            Some("^3.22.0"),
            ChangeAction::Update,
        )];

        let executor = ChangeExecutor::new(&JsonManifestStore);
        let preview = executor.apply(&plan, true);
        assert_eq!(read_raw(&lib), original);
        assert!(preview.dry_run);
        assert!(preview.success());
        assert_eq!(preview.changes[0].status, RecordStatus::Skipped);
        assert_eq!(preview.applied_count(), 0);

        let applied = executor.apply(&plan, false);
        assert_eq!(
            preview.records().collect::<Vec<_>>(),
            applied.records().collect::<Vec<_>>()
        );
        assert_ne!(read_raw(&lib), original);
    }

    #[test]
    fn test_failed_workspace_does_not_abort_batch() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good");
        let bad = temp_dir.path().join("bad");
        write_manifest(&good, r#"{"dependencies": {"zod": "^3.0.0"}}"#);
        write_manifest(&bad, "{ corrupted");

        let plan = vec![
            record(
                &bad,
                DependencySlot::Dependencies,
                "zod",
                Some("^3.0.0"),
                Some("^3.22.0"),
                ChangeAction::Update,
            ),
            record(
                &good,
                DependencySlot::Dependencies,
                "zod",
                Some("^3.0.0"),
                Some("^3.22.0"),
                ChangeAction::Update,
            ),
        ];

        let report = ChangeExecutor::new(&JsonManifestStore).apply(&plan, false);
        assert!(!report.success());
        assert!(report.changes[0].status.is_failed());
        assert_eq!(report.changes[1].status, RecordStatus::Applied);
        assert_eq!(report.failures().count(), 1);

        let manifest = JsonManifestStore.read(&good).unwrap();
        assert_eq!(
            manifest.get(DependencySlot::Dependencies, "zod"),
            Some("^3.22.0")
        );
    }

    #[test]
    fn test_missing_manifest_is_reported_in_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let gone = temp_dir.path().join("gone");

        let plan = vec![record(
            &gone,
            DependencySlot::Dependencies,
            "zod",
            None,
            Some("^3.0.0"),
            ChangeAction::Add,
        )];

        let report = ChangeExecutor::new(&JsonManifestStore).apply(&plan, true);
        assert!(!report.success());
        match &report.changes[0].status {
            RecordStatus::Failed { reason } => assert!(reason.contains("not found")),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_plan() {
        let report = ChangeExecutor::new(&JsonManifestStore).apply(&[], false);
        assert!(report.is_empty());
        assert!(report.success());
    }

    #[test]
    fn test_report_json_has_success_flag() {
        let report = ExecutionReport {
            dry_run: true,
            changes: Vec::new(),
        };
        let value = report.to_json().unwrap();
        assert_eq!(value["success"], serde_json::Value::Bool(true));
        assert_eq!(value["dry_run"], serde_json::Value::Bool(true));
    }
}
