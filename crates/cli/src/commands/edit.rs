//! Manifest-editing commands: `add`, `remove`, `sync`.

use super::{Context, packages};
use crate::cli::ApplyArgs;
use crate::errors::CliResult;
use crate::output;
use serde_json::json;
use std::path::PathBuf;
use tracing::instrument;
use wsalign_engine::{ChangeExecutor, ChangePlanner, ChangeRecord, DependencySlot, VersionLedger};

#[instrument(skip(ctx, targets), fields(targets = targets.len()))]
pub async fn add(
    ctx: &mut Context,
    package: &str,
    version: &str,
    slot: DependencySlot,
    targets: &[PathBuf],
    apply: ApplyArgs,
) -> CliResult<bool> {
    let plan = ChangePlanner::new(&ctx.index).plan_add_or_update(package, version, slot, targets)?;
    apply_plan(ctx, &plan, apply).await
}

#[instrument(skip(ctx, targets), fields(targets = targets.len()))]
pub async fn remove(
    ctx: &mut Context,
    package: &str,
    targets: &[PathBuf],
    apply: ApplyArgs,
) -> CliResult<bool> {
    let plan = ChangePlanner::new(&ctx.index).plan_remove(package, targets)?;
    apply_plan(ctx, &plan, apply).await
}

#[instrument(skip(ctx))]
pub async fn sync(
    ctx: &mut Context,
    package: &str,
    version: &str,
    apply: ApplyArgs,
) -> CliResult<bool> {
    let Some(group) = VersionLedger::new(&ctx.index).versions_of(package) else {
        let text = format!("{package} is not declared in any workspace\n");
        ctx.emit(&text, &json!({ "package": package, "changes": [] }))?;
        return Ok(true);
    };

    let plan = ChangePlanner::new(&ctx.index).plan_sync(package, version, &group)?;
    apply_plan(ctx, &plan, apply).await
}

/// Applies `plan`, refreshes the index after a real write and optionally
/// installs in the touched workspaces.
async fn apply_plan(ctx: &mut Context, plan: &[ChangeRecord], apply: ApplyArgs) -> CliResult<bool> {
    let report = ChangeExecutor::new(&ctx.store).apply(plan, apply.dry_run);
    let mut success = report.success();

    if !apply.dry_run && report.applied_count() > 0 && !ctx.refresh_after_write() {
        success = false;
    }

    let mut text = output::execution(&report);
    let mut value = json!({ "changes": report.to_json()? });

    if apply.install && !apply.dry_run && success && !report.is_empty() {
        let install = packages::run_install(ctx, &report.workspaces()).await;
        success &= install.success();
        text.push_str(&output::install(&install));
        value["install"] = serde_json::to_value(&install)?;
    }

    ctx.emit(&text, &value)?;
    Ok(success)
}
