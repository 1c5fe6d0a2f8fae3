pub mod edit;
pub mod inspect;
pub mod packages;
pub mod resolve;

use crate::cli::{Cli, Commands, OutputFormat};
use crate::errors::{CliError, CliResult};
use std::path::{Path, PathBuf};
use tracing::instrument;
use wsalign_engine::{AlignerConfig, ChangePlanner, Error, JsonManifestStore, WorkspaceIndex};

/// Everything a command needs: the scanned index, the store it came from and
/// how to print.
pub struct Context {
    pub index: WorkspaceIndex,
    pub store: JsonManifestStore,
    pub output: OutputFormat,
}

/// Loads `.wsalign.toml` from `root` and applies command-line overrides.
pub fn load_config(cli: &Cli) -> CliResult<AlignerConfig> {
    let mut config = AlignerConfig::load(&cli.root)?;
    if let Some(seconds) = cli.registry_timeout {
        config.registry_timeout_secs = seconds;
    }
    if let Some(seconds) = cli.install_timeout {
        config.install_timeout_secs = seconds;
    }
    Ok(config)
}

impl Context {
    #[instrument(skip_all, fields(root = %root.display()))]
    pub fn load(root: &Path, config: AlignerConfig, output: OutputFormat) -> CliResult<Self> {
        if !root.is_dir() {
            return Err(Error::Scan {
                path: root.to_path_buf(),
                message: "not a directory".to_string(),
            }
            .into());
        }

        let store = JsonManifestStore;
        let index = WorkspaceIndex::scan(root, &store, config)?;
        for warning in index.warnings() {
            tracing::warn!(
                "Skipped workspace {}: {}",
                warning.path.display(),
                warning.message
            );
        }

        Ok(Self {
            index,
            store,
            output,
        })
    }

    /// Maps `--workspace` values (names or paths) to workspace directories.
    pub fn resolve_workspaces(&self, specs: &[String]) -> CliResult<Vec<PathBuf>> {
        specs
            .iter()
            .map(|spec| {
                self.index
                    .find(spec)
                    .map(|w| w.path.clone())
                    .ok_or_else(|| {
                        Error::WorkspaceNotFound {
                            path: Path::new(spec).to_path_buf(),
                        }
                        .into()
                    })
            })
            .collect()
    }

    /// Rescans after manifests were written. On failure the previous index
    /// stays in place and the error is logged, so the caller can still print
    /// what changed.
    pub fn refresh_after_write(&mut self) -> bool {
        match self.index.refresh(&self.store) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!("Could not rescan workspaces after writing: {}", error);
                false
            }
        }
    }

    /// Writes `text` or `json` to stdout depending on `--output`.
    #[allow(clippy::print_stdout)]
    pub fn emit(&self, text: &str, json: &serde_json::Value) -> CliResult<()> {
        match self.output {
            OutputFormat::Text => print!("{text}"),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(json)?),
        }
        Ok(())
    }
}

/// Runs the parsed command.
///
/// Returns `Ok(false)` when the command ran but some item failed (a record,
/// a package, an install location or a registry lookup).
#[instrument(skip(cli))]
pub async fn execute(cli: Cli) -> CliResult<bool> {
    let config = load_config(&cli)?;
    let Cli {
        command,
        root,
        output,
        ..
    } = cli;

    let load = || Context::load(&root, config.clone(), output);

    match command {
        // Registry lookups need no scan.
        Commands::Latest { package } => packages::latest(&package, &config, output).await,
        Commands::List => inspect::list(&load()?),
        Commands::Versions { package } => inspect::versions(&load()?, &package),
        Commands::Conflicts => inspect::conflicts(&load()?),
        Commands::Add {
            package,
            version,
            slot,
            workspaces,
            all,
            apply,
        } => {
            let mut ctx = load()?;
            let targets = if all {
                ChangePlanner::new(&ctx.index).all_targets()
            } else if workspaces.is_empty() {
                return Err(CliError::invalid_argument(
                    "--workspace",
                    "name at least one workspace or pass --all",
                ));
            } else {
                ctx.resolve_workspaces(&workspaces)?
            };
            edit::add(&mut ctx, &package, &version, slot, &targets, apply).await
        }
        Commands::Remove {
            package,
            workspaces,
            apply,
        } => {
            let mut ctx = load()?;
            let targets = if workspaces.is_empty() {
                ChangePlanner::new(&ctx.index).targets_declaring(&package)
            } else {
                ctx.resolve_workspaces(&workspaces)?
            };
            edit::remove(&mut ctx, &package, &targets, apply).await
        }
        Commands::Sync {
            package,
            version,
            apply,
        } => edit::sync(&mut load()?, &package, &version, apply).await,
        Commands::Resolve {
            strategy,
            picks,
            apply,
        } => resolve::resolve(&mut load()?, strategy, &picks, apply).await,
        Commands::Install { workspaces } => {
            let ctx = load()?;
            let targets = if workspaces.is_empty() {
                ChangePlanner::new(&ctx.index).all_targets()
            } else {
                ctx.resolve_workspaces(&workspaces)?
            };
            packages::install(&ctx, &targets).await
        }
    }
}
