// Transitive dependencies bring in multiple versions of some crates
#![allow(clippy::multiple_crate_versions)]

//! Version alignment for `package.json` monorepos.
//!
//! The engine discovers the workspaces of a monorepo (the root plus the
//! members under `apps/` and `packages/`), groups every declared dependency by
//! the exact version string each workspace uses, reports packages declared at
//! more than one version, and rewrites manifests to converge them.
//!
//! # Architecture
//!
//! Each stage is a small component over a shared, read-only
//! [`WorkspaceIndex`]:
//!
//! - [`WorkspaceIndex`] - discovered workspaces and their parsed manifests
//! - [`VersionLedger`] - package → version → workspaces grouping
//! - [`ConflictDetector`] - packages with more than one version string
//! - [`ChangePlanner`] - pure planning of [`ChangeRecord`]s
//! - [`ChangeExecutor`] - batched read-modify-write of manifests
//! - [`strategies`] - batch conflict resolution policies
//!
//! I/O goes through two collaborator traits, [`ManifestStore`] and
//! [`RegistryLookup`]. The index is never mutated in place by planning or
//! applying; callers run [`WorkspaceIndex::refresh`] after a successful apply.
//!
//! # Example
//!
//! ```no_run
//! use wsalign_engine::{
//!     AlignerConfig, ChangeExecutor, ChangePlanner, ConflictDetector, JsonManifestStore,
//!     WorkspaceIndex,
//! };
//!
//! let store = JsonManifestStore;
//! let mut index = WorkspaceIndex::scan("/path/to/monorepo", &store, AlignerConfig::default())?;
//!
//! for (package, group) in ConflictDetector::new(&index).all_conflicts() {
//!     let plan = ChangePlanner::new(&index).plan_sync(&package, "^4.17.21", &group)?;
//!     let report = ChangeExecutor::new(&store).apply(&plan, false);
//!     println!("{package}: {} record(s) applied", report.applied_count());
//! }
//!
//! index.refresh(&store)?;
//! # Ok::<(), wsalign_engine::Error>(())
//! ```

pub mod config;
pub mod conflicts;
pub mod core;
pub mod detection;
pub mod error;
pub mod executor;
pub mod index;
pub mod installer;
pub mod ledger;
pub mod planner;
pub mod registry;
pub mod store;
pub mod strategies;

pub use config::{AlignerConfig, CONFIG_FILE};
pub use conflicts::ConflictDetector;
pub use core::{
    ChangeAction, ChangeRecord, DependencyMap, DependencySlot, Manifest, ManifestStore,
    PackageManager, RegistryLookup, Workspace, WorkspaceKind,
};
pub use detection::detect_package_manager;
pub use error::{Error, Result};
pub use executor::{ChangeExecutor, ExecutedChange, ExecutionReport, RecordStatus};
pub use index::{ScanOutcome, ScanWarning, WorkspaceIndex};
pub use installer::{InstallOutcome, InstallReport, Installer};
pub use ledger::{VersionGroup, VersionLedger, WorkspaceRef};
pub use planner::ChangePlanner;
pub use registry::NpmRegistry;
pub use store::{JsonManifestStore, MANIFEST_FILE};
pub use strategies::{
    Interactive, LatestRegistry, MostCommon, PackageResolution, Resolution, ResolutionPolicy,
    ResolutionReport, resolve_conflicts,
};
