//! Commands that shell out to the package manager: `latest`, `install`.

use super::Context;
use crate::cli::OutputFormat;
use crate::errors::CliResult;
use crate::output;
use serde_json::json;
use std::path::PathBuf;
use tracing::instrument;
use wsalign_engine::{AlignerConfig, InstallReport, Installer, NpmRegistry, RegistryLookup};

#[instrument(skip(config, format))]
#[allow(clippy::print_stdout)]
pub async fn latest(package: &str, config: &AlignerConfig, format: OutputFormat) -> CliResult<bool> {
    let registry = NpmRegistry::new(config.registry_timeout());
    let version = registry.latest_version(package).await;

    match format {
        OutputFormat::Text => match &version {
            Some(version) => println!("{package}@{version}"),
            None => println!("Could not fetch the latest version of {package}"),
        },
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "package": package, "version": version }))?
        ),
    }
    Ok(version.is_some())
}

/// Runs the detected package manager for `targets` without printing.
pub async fn run_install(ctx: &Context, targets: &[PathBuf]) -> InstallReport {
    let installer = Installer::detect(&ctx.index);
    tracing::info!(manager = %installer.manager(), "Installing dependencies");
    installer.install(&ctx.index, targets).await
}

#[instrument(skip(ctx, targets), fields(targets = targets.len()))]
pub async fn install(ctx: &Context, targets: &[PathBuf]) -> CliResult<bool> {
    let report = run_install(ctx, targets).await;
    let mut value = serde_json::to_value(&report)?;
    value["success"] = json!(report.success());
    ctx.emit(&output::install(&report), &value)?;
    Ok(report.success())
}
