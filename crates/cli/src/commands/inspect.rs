//! Read-only commands: `list`, `versions`, `conflicts`.

use super::Context;
use crate::errors::CliResult;
use crate::output;
use serde_json::json;
use wsalign_engine::{ConflictDetector, VersionLedger};

pub fn list(ctx: &Context) -> CliResult<bool> {
    let index = &ctx.index;
    let text = output::workspaces(index.workspaces(), index.warnings());
    let value = json!({
        "root": index.root(),
        "workspaces": index.workspaces(),
        "warnings": index.warnings(),
    });
    ctx.emit(&text, &value)?;
    Ok(true)
}

pub fn versions(ctx: &Context, package: &str) -> CliResult<bool> {
    match VersionLedger::new(&ctx.index).versions_of(package) {
        Some(group) => {
            let value = serde_json::to_value(&group)?;
            ctx.emit(&output::version_group(&group), &value)?;
        }
        None => {
            let text = format!("{package} is not declared in any workspace\n");
            ctx.emit(&text, &json!({ "package": package, "versions": {} }))?;
        }
    }
    Ok(true)
}

pub fn conflicts(ctx: &Context) -> CliResult<bool> {
    let conflicts = ConflictDetector::new(&ctx.index).all_conflicts();
    let groups: Vec<_> = conflicts.iter().map(|(_, group)| group).collect();
    let value = serde_json::to_value(&groups)?;
    ctx.emit(&output::conflicts(&conflicts), &value)?;
    Ok(true)
}
