//! Workspace discovery and the in-memory index of discovered workspaces.
//!
//! The index is an owned value: callers hold one, lend it to the ledger and
//! planner by reference, and replace its contents through
//! [`WorkspaceIndex::refresh`] after applying changes.
//!
//! # Discovery rules
//!
//! - The root manifest sits directly in the root directory. A missing root
//!   manifest is tolerated; a malformed one aborts the scan with
//!   [`Error::Scan`].
//! - Members are the immediate subdirectories of the apps and packages
//!   directories that contain a manifest, visited in file-name order.
//! - A malformed member manifest is skipped and recorded as a
//!   [`ScanWarning`], so one bad member never hides the others.

use crate::config::AlignerConfig;
use crate::core::{ManifestStore, Workspace, WorkspaceKind};
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Fallback name of a root manifest without a `name` field.
pub const ROOT_FALLBACK_NAME: &str = "root";

/// A member manifest that was skipped during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    /// Directory of the skipped workspace.
    pub path: PathBuf,
    /// Why it was skipped.
    pub message: String,
}

/// Result of one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Discovered workspaces: root first, then apps, then libraries.
    pub workspaces: Vec<Workspace>,
    /// Members that could not be read.
    pub warnings: Vec<ScanWarning>,
}

/// Discovers the workspaces of the monorepo rooted at `root`.
///
/// # Errors
///
/// Returns [`Error::Scan`] if the root manifest exists but cannot be read or
/// parsed.
pub fn scan<S: ManifestStore + ?Sized>(
    root: &Path,
    store: &S,
    config: &AlignerConfig,
) -> Result<ScanOutcome> {
    tracing::debug!("Scanning workspaces in: {}", root.display());
    let mut outcome = ScanOutcome::default();

    if store.contains_manifest(root) {
        let manifest = store.read(root).map_err(|e| Error::Scan {
            path: root.to_path_buf(),
            message: e.to_string(),
        })?;
        outcome.workspaces.push(Workspace::new(
            root,
            ".",
            WorkspaceKind::Root,
            ROOT_FALLBACK_NAME,
            manifest,
        ));
    } else {
        tracing::debug!("No root manifest in {}", root.display());
    }

    let member_dirs = [
        (config.apps_dir.as_str(), WorkspaceKind::App),
        (config.packages_dir.as_str(), WorkspaceKind::Library),
    ];

    for (member_dir, kind) in member_dirs {
        let base = root.join(member_dir);
        if !base.is_dir() {
            continue;
        }

        let walker = WalkDir::new(&base)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker.into_iter().filter_map(std::result::Result::ok) {
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if !store.contains_manifest(path) {
                continue;
            }

            let dir_name = entry.file_name().to_string_lossy().into_owned();
            match store.read(path) {
                Ok(manifest) => {
                    outcome.workspaces.push(Workspace::new(
                        path,
                        Path::new(member_dir).join(&dir_name),
                        kind,
                        &dir_name,
                        manifest,
                    ));
                }
                Err(e) => {
                    tracing::warn!("Skipping workspace {}: {}", path.display(), e);
                    outcome.warnings.push(ScanWarning {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    tracing::debug!(
        "Found {} workspace(s), skipped {}",
        outcome.workspaces.len(),
        outcome.warnings.len()
    );
    Ok(outcome)
}

/// The current set of discovered workspaces.
#[derive(Debug, Clone)]
pub struct WorkspaceIndex {
    root: PathBuf,
    config: AlignerConfig,
    workspaces: Vec<Workspace>,
    warnings: Vec<ScanWarning>,
}

impl WorkspaceIndex {
    /// Scans `root` and builds an index from the result.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Scan`] from [`scan`].
    pub fn scan<S: ManifestStore + ?Sized>(
        root: impl Into<PathBuf>,
        store: &S,
        config: AlignerConfig,
    ) -> Result<Self> {
        let root = root.into();
        let outcome = scan(&root, store, &config)?;
        Ok(Self {
            root,
            config,
            workspaces: outcome.workspaces,
            warnings: outcome.warnings,
        })
    }

    /// Builds an index from already-discovered workspaces.
    #[must_use]
    pub fn from_workspaces(root: impl Into<PathBuf>, workspaces: Vec<Workspace>) -> Self {
        Self {
            root: root.into(),
            config: AlignerConfig::default(),
            workspaces,
            warnings: Vec::new(),
        }
    }

    /// Re-scans the root and swaps in the new set.
    ///
    /// The held set is replaced only once the scan has completed; on error
    /// the previous set stays in place.
    ///
    /// # Errors
    ///
    /// Propagates [`Error::Scan`] from [`scan`].
    pub fn refresh<S: ManifestStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        let outcome = scan(&self.root, store, &self.config)?;
        self.workspaces = outcome.workspaces;
        self.warnings = outcome.warnings;
        Ok(())
    }

    /// Monorepo root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration used for discovery.
    #[must_use]
    pub const fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// All workspaces in discovery order.
    #[must_use]
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    /// Members skipped during the last scan.
    #[must_use]
    pub fn warnings(&self) -> &[ScanWarning] {
        &self.warnings
    }

    /// Number of workspaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    /// Whether no workspace was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    /// Workspace at `path`.
    #[must_use]
    pub fn by_path(&self, path: &Path) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.is_at(path))
    }

    /// Workspaces of `kind`, in discovery order.
    #[must_use]
    pub fn by_kind(&self, kind: WorkspaceKind) -> Vec<&Workspace> {
        self.workspaces.iter().filter(|w| w.kind == kind).collect()
    }

    /// Looks a workspace up by absolute path, path relative to the root, or
    /// declared name.
    #[must_use]
    pub fn find(&self, spec: &str) -> Option<&Workspace> {
        let as_path = Path::new(spec);
        self.by_path(as_path)
            .or_else(|| self.by_path(&self.root.join(as_path)))
            .or_else(|| self.workspaces.iter().find(|w| w.relative_path == as_path))
            .or_else(|| self.workspaces.iter().find(|w| w.name == spec))
    }

    /// The root workspace, if the root has a manifest.
    #[must_use]
    pub fn root_workspace(&self) -> Option<&Workspace> {
        self.workspaces
            .iter()
            .find(|w| w.kind == WorkspaceKind::Root)
    }

    /// Whether the root manifest declares a `workspaces` field.
    #[must_use]
    pub fn declares_workspaces(&self) -> bool {
        self.root_workspace()
            .is_some_and(|w| w.manifest.declares_workspaces())
    }

    /// Every package declared in any slot of any workspace.
    #[must_use]
    pub fn all_packages_declared(&self) -> BTreeSet<String> {
        self.workspaces
            .iter()
            .flat_map(|w| w.manifest.effective_declarations().into_keys())
            .map(str::to_string)
            .collect()
    }
}
