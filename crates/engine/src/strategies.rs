//! Batch conflict resolution policies.
//!
//! A policy picks a target version (or skips) for each conflicting package;
//! [`resolve_conflicts`] then plans and applies one sync per package. A
//! package whose planning or apply fails is reported and the batch moves on.
//!
//! Three policies ship:
//!
//! - [`Interactive`] defers every decision to a caller-supplied closure.
//! - [`MostCommon`] picks the version declared by the most workspaces. Ties go
//!   to the version seen first during discovery; this tie-break is
//!   implementation-defined.
//! - [`LatestRegistry`] converges everything on the literal `"latest"` tag without
//!   consulting any registry.

use crate::core::ManifestStore;
use crate::error::Error;
use crate::executor::{ChangeExecutor, ExecutionReport};
use crate::index::WorkspaceIndex;
use crate::ledger::VersionGroup;
use crate::planner::ChangePlanner;
use indexmap::IndexSet;
use serde::Serialize;
use std::path::PathBuf;

/// Dist-tag used by [`LatestRegistry`].
pub const LATEST_TAG: &str = "latest";

/// A decision for one conflicting package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "version", rename_all = "lowercase")]
pub enum Resolution {
    /// One of the versions already declared somewhere.
    Existing(String),
    /// A version fetched from the registry.
    Latest(String),
    /// A free-form version typed by the operator.
    Custom(String),
    /// Leave the package alone.
    Skip,
}

impl Resolution {
    /// Target version, or `None` for [`Resolution::Skip`].
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Existing(v) | Self::Latest(v) | Self::Custom(v) => Some(v),
            Self::Skip => None,
        }
    }
}

/// Chooses a [`Resolution`] per conflicting package.
pub trait ResolutionPolicy {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Decides what to do with `package`.
    fn resolve(&mut self, package: &str, group: &VersionGroup) -> Resolution;
}

/// Delegates every decision to a closure.
pub struct Interactive<F> {
    decide: F,
}

impl<F> Interactive<F>
where
    F: FnMut(&str, &VersionGroup) -> Resolution,
{
    /// Wraps `decide`.
    pub const fn new(decide: F) -> Self {
        Self { decide }
    }
}

impl<F> ResolutionPolicy for Interactive<F>
where
    F: FnMut(&str, &VersionGroup) -> Resolution,
{
    fn name(&self) -> &'static str {
        "interactive"
    }

    fn resolve(&mut self, package: &str, group: &VersionGroup) -> Resolution {
        (self.decide)(package, group)
    }
}

/// Picks the version with the largest workspace count.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostCommon;

impl ResolutionPolicy for MostCommon {
    fn name(&self) -> &'static str {
        "most-common"
    }

    fn resolve(&mut self, _package: &str, group: &VersionGroup) -> Resolution {
        group
            .most_common()
            .map_or(Resolution::Skip, |(version, _)| {
                Resolution::Existing(version.to_string())
            })
    }
}

/// Converges every package on the `"latest"` dist-tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestRegistry;

impl ResolutionPolicy for LatestRegistry {
    fn name(&self) -> &'static str {
        "latest"
    }

    fn resolve(&mut self, _package: &str, _group: &VersionGroup) -> Resolution {
        Resolution::Latest(LATEST_TAG.to_string())
    }
}

/// What happened to one conflicting package.
#[derive(Debug, Clone, Serialize)]
pub struct PackageResolution {
    /// Package name.
    pub package: String,
    /// The policy's decision.
    pub resolution: Resolution,
    /// Apply results; empty when skipped or when planning failed.
    pub report: ExecutionReport,
    /// Planning error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PackageResolution {
    /// Whether the package was skipped by the policy.
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.resolution == Resolution::Skip
    }

    /// Whether planning and every applied record succeeded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.error.is_none() && self.report.success()
    }
}

/// Outcome of a whole resolution batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    /// Policy that produced the decisions.
    pub policy: String,
    /// Whether changes were only previewed.
    pub dry_run: bool,
    /// One entry per conflicting package, in input order.
    pub packages: Vec<PackageResolution>,
}

impl ResolutionReport {
    /// `true` when every package succeeded or was skipped.
    #[must_use]
    pub fn success(&self) -> bool {
        self.packages.iter().all(PackageResolution::success)
    }

    /// Packages that received a target version.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.packages.iter().filter(|p| !p.is_skipped()).count()
    }

    /// Packages the policy skipped.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.packages.iter().filter(|p| p.is_skipped()).count()
    }

    /// Unique workspaces touched by any package, in first-seen order.
    #[must_use]
    pub fn affected_workspaces(&self) -> Vec<PathBuf> {
        self.packages
            .iter()
            .flat_map(|p| p.report.workspaces())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Runs `policy` over `conflicts`, planning and applying one sync per package.
///
/// The index is not refreshed; do that after a successful non-dry run.
pub fn resolve_conflicts<S, P>(
    index: &WorkspaceIndex,
    store: &S,
    conflicts: &[(String, VersionGroup)],
    policy: &mut P,
    dry_run: bool,
) -> ResolutionReport
where
    S: ManifestStore + ?Sized,
    P: ResolutionPolicy + ?Sized,
{
    let planner = ChangePlanner::new(index);
    let executor = ChangeExecutor::new(store);
    let mut report = ResolutionReport {
        policy: policy.name().to_string(),
        dry_run,
        packages: Vec::with_capacity(conflicts.len()),
    };

    for (package, group) in conflicts {
        let resolution = policy.resolve(package, group);
        let mut outcome = PackageResolution {
            package: package.clone(),
            resolution: resolution.clone(),
            report: ExecutionReport {
                dry_run,
                changes: Vec::new(),
            },
            error: None,
        };

        let Some(target) = resolution.target() else {
            tracing::debug!(package = %package, "Skipped by {} policy", policy.name());
            report.packages.push(outcome);
            continue;
        };

        if let Resolution::Existing(version) = &resolution
            && group.workspaces_for(version).is_empty()
        {
            let error = Error::validation(format!(
                "'{version}' is not a version currently declared for {package}"
            ));
            tracing::warn!("{}", error);
            outcome.error = Some(error.to_string());
            report.packages.push(outcome);
            continue;
        }

        match planner.plan_sync(package, target, group) {
            Ok(plan) => {
                outcome.report = executor.apply(&plan, dry_run);
                if !outcome.report.success() {
                    tracing::warn!(package = %package, "Some workspaces failed to update");
                }
            }
            Err(e) => {
                tracing::warn!(package = %package, "Could not plan sync: {}", e);
                outcome.error = Some(e.to_string());
            }
        }
        report.packages.push(outcome);
    }

    tracing::info!(
        policy = policy.name(),
        "Resolved {} package(s), skipped {}",
        report.resolved_count(),
        report.skipped_count()
    );
    report
}
