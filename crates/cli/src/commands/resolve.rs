//! `resolve`: batch conflict resolution.

use super::{Context, packages};
use crate::cli::{ApplyArgs, Strategy};
use crate::errors::{CliError, CliResult};
use crate::output;
use serde_json::json;
use std::collections::HashMap;
use tracing::instrument;
use wsalign_engine::{
    ConflictDetector, Interactive, LatestRegistry, MostCommon, NpmRegistry, RegistryLookup,
    Resolution, ResolutionReport, VersionGroup, resolve_conflicts,
};

/// Value of `--pick PACKAGE=CHOICE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick {
    Version(String),
    Skip,
    Registry,
}

const REGISTRY_PICK: &str = "@registry";

/// Parses `--pick` values. The last pick for a package wins.
pub fn parse_picks(raw: &[String]) -> CliResult<HashMap<String, Pick>> {
    let mut picks = HashMap::new();
    for value in raw {
        let Some((package, choice)) = value.split_once('=') else {
            return Err(CliError::invalid_argument(
                "--pick",
                format!("'{value}' is not PACKAGE=CHOICE"),
            ));
        };
        let (package, choice) = (package.trim(), choice.trim());
        if package.is_empty() || choice.is_empty() {
            return Err(CliError::invalid_argument(
                "--pick",
                format!("'{value}' needs both a package and a choice"),
            ));
        }

        let pick = match choice {
            "skip" => Pick::Skip,
            REGISTRY_PICK => Pick::Registry,
            version => Pick::Version(version.to_string()),
        };
        picks.insert(package.to_string(), pick);
    }
    Ok(picks)
}

/// Turns a pick into a decision for `group`. A version already declared
/// somewhere counts as existing; anything else is custom.
fn decide(pick: &Pick, group: &VersionGroup, latest: Option<&String>) -> Resolution {
    match pick {
        Pick::Skip => Resolution::Skip,
        Pick::Version(version) if !group.workspaces_for(version).is_empty() => {
            Resolution::Existing(version.clone())
        }
        Pick::Version(version) => Resolution::Custom(version.clone()),
        Pick::Registry => latest.map_or(Resolution::Skip, |v| Resolution::Latest(v.clone())),
    }
}

#[instrument(skip(ctx, picks))]
pub async fn resolve(
    ctx: &mut Context,
    strategy: Strategy,
    picks: &[String],
    apply: ApplyArgs,
) -> CliResult<bool> {
    let picks = parse_picks(picks)?;
    if strategy != Strategy::Pick && !picks.is_empty() {
        return Err(CliError::invalid_argument(
            "--pick",
            "only valid with --strategy pick",
        ));
    }

    let conflicts = ConflictDetector::new(&ctx.index).all_conflicts();
    for package in picks.keys() {
        if !conflicts.iter().any(|(name, _)| name == package) {
            tracing::warn!("{} has no version conflict, ignoring its pick", package);
        }
    }

    let mut success = true;
    let report: ResolutionReport = match strategy {
        Strategy::MostCommon => resolve_conflicts(
            &ctx.index,
            &ctx.store,
            &conflicts,
            &mut MostCommon,
            apply.dry_run,
        ),
        Strategy::Latest => resolve_conflicts(
            &ctx.index,
            &ctx.store,
            &conflicts,
            &mut LatestRegistry,
            apply.dry_run,
        ),
        Strategy::Pick => {
            let mut latest: HashMap<String, String> = HashMap::new();
            let registry = NpmRegistry::new(ctx.index.config().registry_timeout());
            for (package, pick) in &picks {
                if *pick != Pick::Registry {
                    continue;
                }
                match registry.latest_version(package).await {
                    Some(version) => {
                        latest.insert(package.clone(), version);
                    }
                    None => {
                        tracing::warn!("Could not fetch the latest version of {}, skipping", package);
                        success = false;
                    }
                }
            }

            let mut policy = Interactive::new(|package: &str, group: &VersionGroup| {
                picks.get(package).map_or(Resolution::Skip, |pick| {
                    decide(pick, group, latest.get(package))
                })
            });
            resolve_conflicts(&ctx.index, &ctx.store, &conflicts, &mut policy, apply.dry_run)
        }
    };
    success &= report.success();

    let touched = report.affected_workspaces();
    let wrote = !apply.dry_run
        && report
            .packages
            .iter()
            .any(|p| p.report.applied_count() > 0);
    if wrote && !ctx.refresh_after_write() {
        success = false;
    }

    let mut text = if conflicts.is_empty() {
        "No version conflicts found.\n".to_string()
    } else {
        output::resolution(&report)
    };
    let mut value = json!({ "resolution": report, "success": success });

    if apply.install && wrote && success {
        let install = packages::run_install(ctx, &touched).await;
        success &= install.success();
        text.push_str(&output::install(&install));
        value["install"] = serde_json::to_value(&install)?;
        value["success"] = json!(success);
    }

    ctx.emit(&text, &value)?;
    Ok(success)
}
