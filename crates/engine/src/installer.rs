//! Dependency installation after manifests change.
//!
//! The installer runs the detected package manager's `install` command. When
//! the root manifest declares `workspaces` the package manager links every
//! member from the root, so a single run there is enough; otherwise each
//! unique target directory gets its own run.
//!
//! Every child process is bounded by a timeout and killed when the bound is
//! hit.

use crate::core::PackageManager;
use crate::detection::detect_package_manager;
use crate::error::{Error, Result};
use crate::index::WorkspaceIndex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// Captured output of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Exit code, if the process was not killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

/// Runs `program` with `args`, bounded by `limit`.
///
/// # Errors
///
/// Returns [`Error::Timeout`] when the bound is hit (the child is killed) and
/// [`Error::Io`] when the process cannot be spawned.
pub async fn run_command(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    limit: Duration,
) -> Result<CommandOutput> {
    tracing::debug!("Running: {} {}", program, args.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd.kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let operation = format!("{program} {}", args.join(" "));
    match timeout(limit, cmd.output()).await {
        Ok(Ok(output)) => Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }),
        Ok(Err(source)) => Err(Error::Io {
            source,
            path: cwd.map(Path::to_path_buf),
            operation: format!("spawning '{}'", operation.trim_end()),
        }),
        Err(_elapsed) => {
            tracing::warn!("'{}' timed out after {:?}", operation.trim_end(), limit);
            Err(Error::Timeout {
                operation: operation.trim_end().to_string(),
                seconds: limit.as_secs(),
            })
        }
    }
}

/// Result of one install run.
#[derive(Debug, Clone, Serialize)]
pub struct InstallOutcome {
    /// Directory the command ran in.
    pub location: PathBuf,
    /// Whether the command exited successfully.
    pub success: bool,
    /// Captured stdout.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
    /// Failure description (stderr, spawn error or timeout).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Per-location outcomes of an [`Installer::install`] call.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    /// Manager that was used.
    pub manager: PackageManager,
    /// The command line, program first.
    pub command: Vec<String>,
    /// One entry per location, in run order.
    pub outcomes: Vec<InstallOutcome>,
}

impl InstallReport {
    /// `true` when every run succeeded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }

    /// Runs that failed.
    pub fn failures(&self) -> impl Iterator<Item = &InstallOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// Shell lines an operator can paste to retry each failed location.
    #[must_use]
    pub fn manual_instructions(&self) -> Vec<String> {
        let command = self.command.join(" ");
        self.failures()
            .map(|o| format!("cd {} && {}", o.location.display(), command))
            .collect()
    }
}

/// Runs the package manager's install command.
#[derive(Debug, Clone)]
pub struct Installer {
    manager: PackageManager,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl Installer {
    /// Installer for `manager` using its standard `install` command.
    #[must_use]
    pub fn new(manager: PackageManager, timeout: Duration) -> Self {
        let [program, arg] = manager.install_command();
        Self {
            manager,
            program: program.to_string(),
            args: vec![arg.to_string()],
            timeout,
        }
    }

    /// Installer for the manager detected at the index root, bounded by the
    /// configured install timeout.
    #[must_use]
    pub fn detect(index: &WorkspaceIndex) -> Self {
        Self::new(
            detect_package_manager(index.root()),
            index.config().install_timeout(),
        )
    }

    /// Replaces the command line while keeping the manager label.
    #[cfg(test)]
    #[must_use]
    fn with_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.args = args;
        self
    }

    /// The manager this installer drives.
    #[must_use]
    pub const fn manager(&self) -> PackageManager {
        self.manager
    }

    /// Directories the install command will run in for `targets`.
    #[must_use]
    pub fn locations(index: &WorkspaceIndex, targets: &[PathBuf]) -> Vec<PathBuf> {
        if index.declares_workspaces() {
            return vec![index.root().to_path_buf()];
        }
        let mut locations: Vec<PathBuf> = Vec::new();
        for target in targets {
            if !locations.contains(target) {
                locations.push(target.clone());
            }
        }
        locations
    }

    /// Installs dependencies for `targets`, sequentially.
    ///
    /// Failures are recorded per location and never abort the remaining
    /// runs.
    pub async fn install(&self, index: &WorkspaceIndex, targets: &[PathBuf]) -> InstallReport {
        let mut command = vec![self.program.clone()];
        command.extend(self.args.iter().cloned());
        let mut report = InstallReport {
            manager: self.manager,
            command,
            outcomes: Vec::new(),
        };

        for location in Self::locations(index, targets) {
            let outcome = self.run_at(&location).await;
            if outcome.success {
                tracing::info!("Installed dependencies in {}", location.display());
            } else {
                tracing::warn!(
                    "Install failed in {}: {}",
                    location.display(),
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
            report.outcomes.push(outcome);
        }
        report
    }

    async fn run_at(&self, location: &Path) -> InstallOutcome {
        let start = Instant::now();
        let result = run_command(&self.program, &self.args, Some(location), self.timeout).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(output) if output.success => InstallOutcome {
                location: location.to_path_buf(),
                success: true,
                output: output.stdout,
                error: None,
                duration_ms,
            },
            Ok(output) => {
                let error = if output.stderr.trim().is_empty() {
                    format!("Installation failed with exit code {:?}", output.code)
                } else {
                    output.stderr.trim().to_string()
                };
                InstallOutcome {
                    location: location.to_path_buf(),
                    success: false,
                    output: output.stdout,
                    error: Some(error),
                    duration_ms,
                }
            }
            Err(e) => InstallOutcome {
                location: location.to_path_buf(),
                success: false,
                output: String::new(),
                error: Some(e.to_string()),
                duration_ms,
            },
        }
    }
}
