//! Pure change planning.
//!
//! Every operation reads the [`WorkspaceIndex`] and returns an ordered list of
//! [`ChangeRecord`]s. Nothing here touches storage; hand the plan to
//! [`crate::ChangeExecutor`] to preview or persist it.

use crate::core::{ChangeAction, ChangeRecord, DependencySlot, Workspace};
use crate::error::{Error, Result};
use crate::index::WorkspaceIndex;
use crate::ledger::VersionGroup;
use std::path::PathBuf;

/// Computes edits against a [`WorkspaceIndex`].
#[derive(Debug, Clone, Copy)]
pub struct ChangePlanner<'a> {
    index: &'a WorkspaceIndex,
}

fn resolve_targets<'t>(
    index: &'t WorkspaceIndex,
    targets: &'t [PathBuf],
) -> impl Iterator<Item = &'t Workspace> + 't {
    targets.iter().filter_map(move |path| {
        let workspace = index.by_path(path);
        if workspace.is_none() {
            tracing::warn!("Skipping unknown workspace {}", path.display());
        }
        workspace
    })
}

fn validate_non_empty(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{what} must not be empty")));
    }
    Ok(())
}

impl<'a> ChangePlanner<'a> {
    /// Creates a planner over `index`.
    #[must_use]
    pub const fn new(index: &'a WorkspaceIndex) -> Self {
        Self { index }
    }

    /// Sets `package` to `version` in `slot` of every target workspace.
    ///
    /// Records come out in target order. The action is `update` when the slot
    /// already declares the package and `add` otherwise. Unknown target paths
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty package name or version.
    pub fn plan_add_or_update(
        &self,
        package: &str,
        version: &str,
        slot: DependencySlot,
        targets: &[PathBuf],
    ) -> Result<Vec<ChangeRecord>> {
        validate_non_empty("package name", package)?;
        validate_non_empty("version", version)?;

        let plan: Vec<_> = resolve_targets(self.index, targets)
            .map(|workspace| {
                let before = workspace.manifest.get(slot, package).map(str::to_string);
                let action = if before.is_some() {
                    ChangeAction::Update
                } else {
                    ChangeAction::Add
                };
                ChangeRecord {
                    workspace: workspace.path.clone(),
                    workspace_name: workspace.name.clone(),
                    package: package.to_string(),
                    slot,
                    before,
                    after: Some(version.to_string()),
                    action,
                }
            })
            .collect();

        tracing::debug!(package, version, %slot, "Planned {} add/update change(s)", plan.len());
        Ok(plan)
    }

    /// Removes `package` from every slot of every target workspace that
    /// declares it, one record per slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty package name.
    pub fn plan_remove(&self, package: &str, targets: &[PathBuf]) -> Result<Vec<ChangeRecord>> {
        validate_non_empty("package name", package)?;

        let plan: Vec<_> = resolve_targets(self.index, targets)
            .flat_map(|workspace| {
                workspace
                    .manifest
                    .slots_declaring(package)
                    .into_iter()
                    .map(move |(slot, version)| ChangeRecord {
                        workspace: workspace.path.clone(),
                        workspace_name: workspace.name.clone(),
                        package: package.to_string(),
                        slot,
                        before: Some(version.to_string()),
                        after: None,
                        action: ChangeAction::Remove,
                    })
            })
            .collect();

        tracing::debug!(package, "Planned {} removal(s)", plan.len());
        Ok(plan)
    }

    /// Converges every workspace in `group` onto `target_version`.
    ///
    /// Workspaces whose group key already equals the target are skipped. For
    /// the rest, only the first slot declaring the package (dependencies, then
    /// devDependencies, then peerDependencies) is edited. Re-planning after the
    /// plan has been applied yields an empty plan.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty package name or version.
    pub fn plan_sync(
        &self,
        package: &str,
        target_version: &str,
        group: &VersionGroup,
    ) -> Result<Vec<ChangeRecord>> {
        validate_non_empty("package name", package)?;
        validate_non_empty("target version", target_version)?;

        let mut plan = Vec::new();
        for (version, members) in group.iter() {
            if version == target_version {
                continue;
            }

            for member in members {
                let Some(workspace) = self.index.by_path(&member.path) else {
                    tracing::warn!("Skipping unknown workspace {}", member.path.display());
                    continue;
                };
                let Some(slot) = workspace.manifest.first_slot_declaring(package) else {
                    tracing::warn!(
                        "Workspace {} no longer declares {}, skipping",
                        workspace.name,
                        package
                    );
                    continue;
                };

                let before = workspace.manifest.get(slot, package).map(str::to_string);
                if before.as_deref() == Some(target_version) {
                    continue;
                }

                plan.push(ChangeRecord {
                    workspace: workspace.path.clone(),
                    workspace_name: workspace.name.clone(),
                    package: package.to_string(),
                    slot,
                    before,
                    after: Some(target_version.to_string()),
                    action: ChangeAction::Update,
                });
            }
        }

        tracing::debug!(
            package,
            target_version,
            "Planned {} sync change(s)",
            plan.len()
        );
        Ok(plan)
    }

    /// Paths of every workspace in the index, for "all workspaces" targets.
    #[must_use]
    pub fn all_targets(&self) -> Vec<PathBuf> {
        self.index
            .workspaces()
            .iter()
            .map(|w| w.path.clone())
            .collect()
    }

    /// Paths of the workspaces declaring `package` in any slot.
    #[must_use]
    pub fn targets_declaring(&self, package: &str) -> Vec<PathBuf> {
        self.index
            .workspaces()
            .iter()
            .filter(|w| w.has_package(package))
            .map(|w| w.path.clone())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::{Manifest, WorkspaceKind};
    use crate::ledger::VersionLedger;

    fn workspace(dir: &str, json: &str) -> Workspace {
        Workspace::new(
            format!("/repo/{dir}"),
            dir,
            WorkspaceKind::App,
            dir,
            Manifest::from_json(json).unwrap(),
        )
    }

    fn path(dir: &str) -> PathBuf {
        PathBuf::from(format!("/repo/{dir}"))
    }

    fn index() -> WorkspaceIndex {
        WorkspaceIndex::from_workspaces(
            "/repo",
            vec![
                workspace(
                    "a",
                    r#"{"dependencies": {"lodash": "^4.17.0", "react": "^18.0.0"},
                        "peerDependencies": {"react": "^18.0.0"}}"#,
                ),
                workspace("b", r#"{"devDependencies": {"lodash": "4.16.0"}}"#),
                workspace("c", r#"{"name": "c"}"#),
            ],
        )
    }

    #[test]
    fn test_add_to_workspace_without_package() {
        let index = index();
        let plan = ChangePlanner::new(&index)
            .plan_add_or_update("react", "^18.0.0", DependencySlot::Dependencies, &[path("c")])
            .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].action, ChangeAction::Add);
        assert_eq!(plan[0].before, None);
        assert_eq!(plan[0].after.as_deref(), Some("^18.0.0"));
        assert_eq!(plan[0].slot, DependencySlot::Dependencies);
    }

    #[test]
    fn test_update_only_looks_at_requested_slot() {
        let index = index();
        let plan = ChangePlanner::new(&index)
            .plan_add_or_update(
                "lodash",
                "^4.17.21",
                DependencySlot::Dependencies,
                &[path("b"), path("a")],
            )
            .unwrap();

        // b declares lodash only in devDependencies, so dependencies gets an add.
        assert_eq!(plan[0].workspace, path("b"));
        assert_eq!(plan[0].action, ChangeAction::Add);
        assert_eq!(plan[1].workspace, path("a"));
        assert_eq!(plan[1].action, ChangeAction::Update);
        assert_eq!(plan[1].before.as_deref(), Some("^4.17.0"));
    }

    #[test]
    fn test_add_skips_unknown_targets() {
        let index = index();
        let plan = ChangePlanner::new(&index)
            .plan_add_or_update(
                "zod",
                "^3.0.0",
                DependencySlot::Dependencies,
                &[path("missing"), path("c")],
            )
            .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].workspace, path("c"));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let index = index();
        let planner = ChangePlanner::new(&index);

        let err = planner
            .plan_add_or_update("", "1.0.0", DependencySlot::Dependencies, &[path("a")])
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = planner
            .plan_add_or_update("zod", "  ", DependencySlot::Dependencies, &[path("a")])
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        assert!(planner.plan_remove(" ", &[path("a")]).is_err());
    }

    #[test]
    fn test_remove_emits_one_record_per_slot() {
        let index = index();
        let plan = ChangePlanner::new(&index)
            .plan_remove("react", &[path("a"), path("b"), path("c")])
            .unwrap();

        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|r| r.workspace == path("a")));
        assert_eq!(plan[0].slot, DependencySlot::Dependencies);
        assert_eq!(plan[1].slot, DependencySlot::PeerDependencies);
        assert!(plan.iter().all(|r| r.action == ChangeAction::Remove));
        assert!(plan.iter().all(|r| r.after.is_none()));
    }

    #[test]
    fn test_sync_edits_only_out_of_date_workspaces() {
        let index = index();
        let group = VersionLedger::new(&index).versions_of("lodash").unwrap();
        let plan = ChangePlanner::new(&index)
            .plan_sync("lodash", "^4.17.0", &group)
            .unwrap();

        assert_eq!(plan.len(), 1);
        let record = &plan[0];
        assert_eq!(record.workspace, path("b"));
        assert_eq!(record.slot, DependencySlot::DevDependencies);
        assert_eq!(record.before.as_deref(), Some("4.16.0"));
        assert_eq!(record.after.as_deref(), Some("^4.17.0"));
        assert_eq!(record.action, ChangeAction::Update);
    }

    #[test]
    fn test_sync_to_new_version_touches_everyone() {
        let index = index();
        let group = VersionLedger::new(&index).versions_of("lodash").unwrap();
        let plan = ChangePlanner::new(&index)
            .plan_sync("lodash", "latest", &group)
            .unwrap();

        let touched: Vec<_> = plan.iter().map(|r| r.workspace.clone()).collect();
        assert_eq!(touched, vec![path("a"), path("b")]);
    }

    #[test]
    fn test_sync_uses_first_declaring_slot() {
        let index = WorkspaceIndex::from_workspaces(
            "/repo",
            vec![
                workspace(
                    "x",
                    r#"{"devDependencies": {"react": "^17.0.0"}, "peerDependencies": {"react": "^16.0.0"}}"#,
                ),
                workspace("y", r#"{"dependencies": {"react": "^18.0.0"}}"#),
            ],
        );
        let group = VersionLedger::new(&index).versions_of("react").unwrap();
        let plan = ChangePlanner::new(&index)
            .plan_sync("react", "^18.0.0", &group)
            .unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].slot, DependencySlot::DevDependencies);
        assert_eq!(plan[0].before.as_deref(), Some("^17.0.0"));
    }

    #[test]
    fn test_target_helpers() {
        let index = index();
        let planner = ChangePlanner::new(&index);

        assert_eq!(planner.all_targets().len(), 3);
        assert_eq!(planner.targets_declaring("lodash"), vec![path("a"), path("b")]);
    }
}
