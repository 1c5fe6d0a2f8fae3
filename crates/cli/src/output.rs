//! Text rendering of engine results.
//!
//! JSON output serializes the engine types directly; these helpers only cover
//! the human-readable form.

use std::fmt::Write as _;
use wsalign_engine::{
    ExecutionReport, InstallReport, RecordStatus, ResolutionReport, ScanWarning, VersionGroup,
    Workspace,
};

pub fn workspaces(workspaces: &[Workspace], warnings: &[ScanWarning]) -> String {
    let mut out = String::new();
    if workspaces.is_empty() {
        out.push_str("No workspaces found.\n");
    }
    let width = workspaces.iter().map(|w| w.name.len()).max().unwrap_or(0);
    for workspace in workspaces {
        let _ = writeln!(
            out,
            "{:<width$}  {:<7}  {}",
            workspace.name,
            workspace.kind.to_string(),
            workspace.relative_path.display(),
        );
    }
    for warning in warnings {
        let _ = writeln!(
            out,
            "warning: skipped {}: {}",
            warning.path.display(),
            warning.message
        );
    }
    out
}

pub fn version_group(group: &VersionGroup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", group.package());
    for (version, members) in group.iter() {
        let names: Vec<_> = members.iter().map(|w| w.name.as_str()).collect();
        let _ = writeln!(out, "  {version}: {}", names.join(", "));
    }
    out
}

pub fn conflicts(groups: &[(String, VersionGroup)]) -> String {
    if groups.is_empty() {
        return "No version conflicts found.\n".to_string();
    }
    let mut out = format!("{} conflicting package(s)\n", groups.len());
    for (_, group) in groups {
        out.push_str(&version_group(group));
    }
    out
}

pub fn execution(report: &ExecutionReport) -> String {
    if report.is_empty() {
        return "Nothing to change.\n".to_string();
    }

    let mut out = String::new();
    if report.dry_run {
        out.push_str("Dry run, no files written:\n");
    }
    for change in &report.changes {
        let marker = match &change.status {
            RecordStatus::Applied => "applied".to_string(),
            RecordStatus::Skipped => "planned".to_string(),
            RecordStatus::Failed { reason } => format!("FAILED ({reason})"),
        };
        let _ = writeln!(out, "  {}  [{marker}]", change.record);
    }

    let failed = report.failures().count();
    if !report.dry_run {
        let _ = writeln!(
            out,
            "{} change(s) applied, {failed} failed",
            report.applied_count()
        );
    }
    out
}

pub fn install(report: &InstallReport) -> String {
    if report.outcomes.is_empty() {
        return "Nothing to install.\n".to_string();
    }
    let mut out = String::new();
    for outcome in &report.outcomes {
        if outcome.success {
            let _ = writeln!(
                out,
                "Installed with {} in {}",
                report.manager,
                outcome.location.display()
            );
        } else {
            let _ = writeln!(
                out,
                "Install failed in {}: {}",
                outcome.location.display(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    let manual = report.manual_instructions();
    if !manual.is_empty() {
        out.push_str("Run manually:\n");
        for line in manual {
            let _ = writeln!(out, "  {line}");
        }
    }
    out
}

pub fn resolution(report: &ResolutionReport) -> String {
    let mut out = String::new();
    for package in &report.packages {
        match (package.resolution.target(), &package.error) {
            (None, _) => {
                let _ = writeln!(out, "{}: skipped", package.package);
            }
            (Some(target), Some(error)) => {
                let _ = writeln!(out, "{} -> {target}: {error}", package.package);
            }
            (Some(target), None) => {
                let _ = writeln!(out, "{} -> {target}", package.package);
                for line in execution(&package.report).lines() {
                    let _ = writeln!(out, "  {line}");
                }
            }
        }
    }
    let _ = writeln!(
        out,
        "{} package(s) resolved, {} skipped",
        report.resolved_count(),
        report.skipped_count()
    );
    out
}
