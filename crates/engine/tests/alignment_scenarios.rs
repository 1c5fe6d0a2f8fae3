//! End-to-end alignment scenarios against real `package.json` files.
//!
//! Each test builds a throwaway monorepo, scans it, plans, applies and
//! rescans, checking the manifests on disk along the way.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wsalign_engine::{
    AlignerConfig, ChangeAction, ChangeExecutor, ChangePlanner, ConflictDetector, DependencySlot,
    JsonManifestStore, RecordStatus, VersionLedger, WorkspaceIndex,
};

fn write_manifest(dir: &Path, content: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("package.json"), content).unwrap();
}

fn read_manifest(dir: &Path) -> String {
    fs::read_to_string(dir.join("package.json")).unwrap()
}

fn scan(root: &Path) -> WorkspaceIndex {
    WorkspaceIndex::scan(root, &JsonManifestStore, AlignerConfig::default()).unwrap()
}

/// A: lodash ^4.17.0 in dependencies. B: lodash 4.16.0 in devDependencies.
fn lodash_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_manifest(
        root,
        r#"{"name": "monorepo", "private": true, "workspaces": ["apps/*", "packages/*"]}"#,
    );
    write_manifest(
        &root.join("apps/a"),
        r#"{
  "name": "a",
  "version": "0.1.0",
  "scripts": { "dev": "vite" },
  "dependencies": { "lodash": "^4.17.0" }
}
"#,
    );
    write_manifest(
        &root.join("packages/b"),
        r#"{
  "name": "b",
  "devDependencies": { "lodash": "4.16.0", "typescript": "^5.4.0" }
}
"#,
    );
    temp_dir
}

#[test]
fn test_lodash_conflict_sync_converges() {
    let repo = lodash_repo();
    let root = repo.path();
    let store = JsonManifestStore;
    let mut index = scan(root);

    let conflicts = ConflictDetector::new(&index).all_conflicts();
    assert_eq!(conflicts.len(), 1);
    let (package, group) = &conflicts[0];
    assert_eq!(package, "lodash");
    assert_eq!(group.len(), 2);

    let plan = ChangePlanner::new(&index)
        .plan_sync("lodash", "^4.17.0", group)
        .unwrap();
    assert_eq!(plan.len(), 1);
    let record = &plan[0];
    assert_eq!(record.workspace, root.join("packages/b"));
    assert_eq!(record.slot, DependencySlot::DevDependencies);
    assert_eq!(record.before.as_deref(), Some("4.16.0"));
    assert_eq!(record.after.as_deref(), Some("^4.17.0"));

    let report = ChangeExecutor::new(&store).apply(&plan, false);
    assert!(report.success());
    assert_eq!(report.applied_count(), 1);

    index.refresh(&store).unwrap();
    let group = VersionLedger::new(&index).versions_of("lodash").unwrap();
    assert_eq!(group.len(), 1);
    let names: Vec<_> = group
        .workspaces_for("^4.17.0")
        .iter()
        .map(|w| w.name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "b"]);

    // Untouched fields survive the rewrite.
    let b: serde_json::Value = serde_json::from_str(&read_manifest(&root.join("packages/b"))).unwrap();
    assert_eq!(b["devDependencies"]["typescript"], "^5.4.0");
    assert!(read_manifest(&root.join("packages/b")).ends_with("}\n"));
}

#[test]
fn test_sync_is_idempotent() {
    let repo = lodash_repo();
    let store = JsonManifestStore;
    let mut index = scan(repo.path());

    let group = VersionLedger::new(&index).versions_of("lodash").unwrap();
    let plan = ChangePlanner::new(&index)
        .plan_sync("lodash", "4.17.21", &group)
        .unwrap();
    assert_eq!(plan.len(), 2);
    assert!(ChangeExecutor::new(&store).apply(&plan, false).success());

    index.refresh(&store).unwrap();
    let group = VersionLedger::new(&index).versions_of("lodash").unwrap();
    assert_eq!(group.versions().collect::<Vec<_>>(), vec!["4.17.21"]);
    assert_eq!(group.total_workspaces(), 2);

    let again = ChangePlanner::new(&index)
        .plan_sync("lodash", "4.17.21", &group)
        .unwrap();
    assert!(again.is_empty());
}

#[test]
fn test_add_react_to_workspace_without_it() {
    let repo = lodash_repo();
    let root = repo.path();
    let index = scan(root);

    let plan = ChangePlanner::new(&index)
        .plan_add_or_update(
            "react",
            "^18.0.0",
            DependencySlot::Dependencies,
            &[root.join("apps/a")],
        )
        .unwrap();

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].action, ChangeAction::Add);
    assert_eq!(plan[0].before, None);
    assert_eq!(plan[0].after.as_deref(), Some("^18.0.0"));
}

#[test]
fn test_remove_react_from_every_slot() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_manifest(
        &root.join("packages/ui"),
        r#"{
  "name": "ui",
  "dependencies": { "react": "^18.2.0", "clsx": "^2.0.0" },
  "peerDependencies": { "react": "^18.0.0" }
}
"#,
    );
    let store = JsonManifestStore;
    let mut index = scan(root);
    assert!(index.all_packages_declared().contains("react"));

    let plan = ChangePlanner::new(&index)
        .plan_remove("react", &[root.join("packages/ui")])
        .unwrap();
    assert_eq!(plan.len(), 2);
    assert_eq!(plan[0].slot, DependencySlot::Dependencies);
    assert_eq!(plan[1].slot, DependencySlot::PeerDependencies);
    assert!(plan.iter().all(|r| r.action == ChangeAction::Remove));

    assert!(ChangeExecutor::new(&store).apply(&plan, false).success());
    index.refresh(&store).unwrap();

    let declared = index.all_packages_declared();
    assert!(!declared.contains("react"));
    assert!(declared.contains("clsx"));

    // The emptied peer slot is kept as an empty object.
    let ui: serde_json::Value = serde_json::from_str(&read_manifest(&root.join("packages/ui"))).unwrap();
    assert_eq!(ui["peerDependencies"], serde_json::json!({}));
}

#[test]
fn test_dry_run_matches_real_run_and_leaves_bytes() {
    let repo = lodash_repo();
    let root = repo.path();
    let store = JsonManifestStore;
    let index = scan(root);

    let plan = ChangePlanner::new(&index)
        .plan_add_or_update(
            "zod",
            "^3.23.0",
            DependencySlot::Dependencies,
            &ChangePlanner::new(&index).all_targets(),
        )
        .unwrap();

    let dirs: Vec<PathBuf> = vec![root.to_path_buf(), root.join("apps/a"), root.join("packages/b")];
    let before: Vec<String> = dirs.iter().map(|d| read_manifest(d)).collect();

    let dry = ChangeExecutor::new(&store).apply(&plan, true);
    let after_dry: Vec<String> = dirs.iter().map(|d| read_manifest(d)).collect();
    assert_eq!(before, after_dry);
    assert!(dry.changes.iter().all(|c| c.status == RecordStatus::Skipped));

    let real = ChangeExecutor::new(&store).apply(&plan, false);
    assert_eq!(
        dry.records().collect::<Vec<_>>(),
        real.records().collect::<Vec<_>>()
    );
    assert_ne!(before[1], read_manifest(&dirs[1]));
}

#[test]
fn test_partial_failure_keeps_other_workspaces() {
    let repo = lodash_repo();
    let root = repo.path();
    let store = JsonManifestStore;
    let mut index = scan(root);

    let group = VersionLedger::new(&index).versions_of("lodash").unwrap();
    let plan = ChangePlanner::new(&index)
        .plan_sync("lodash", "4.17.21", &group)
        .unwrap();

    // Corrupt one manifest between planning and applying.
    fs::write(root.join("apps/a/package.json"), "{ not json").unwrap();

    let report = ChangeExecutor::new(&store).apply(&plan, false);
    assert!(!report.success());
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.applied_count(), 1);

    // The healthy workspace was still written; the broken one is skipped on rescan.
    index.refresh(&store).unwrap();
    assert_eq!(index.warnings().len(), 1);
    let b = index.find("b").unwrap();
    assert_eq!(
        b.manifest.get(DependencySlot::DevDependencies, "lodash"),
        Some("4.17.21")
    );
}

#[test]
fn test_malformed_root_aborts_scan() {
    let temp_dir = TempDir::new().unwrap();
    write_manifest(temp_dir.path(), "{ nope");

    let result = WorkspaceIndex::scan(temp_dir.path(), &JsonManifestStore, AlignerConfig::default());
    assert!(matches!(result, Err(wsalign_engine::Error::Scan { .. })));
}
