//! Error types for alignment operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for alignment operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while scanning, planning, or applying changes.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The monorepo root could not be scanned.
    #[error("Failed to scan workspaces at {path}: {message}")]
    #[diagnostic(
        code(wsalign::scan::failed),
        help("Check that the root package.json is valid JSON and readable")
    )]
    Scan {
        /// Root directory that was scanned.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Manifest file not found.
    #[error("Manifest file not found at path: {path}")]
    #[diagnostic(
        code(wsalign::manifest::not_found),
        help("Ensure a package.json exists in the workspace directory")
    )]
    ManifestNotFound {
        /// The path where the manifest was expected.
        path: PathBuf,
    },

    /// A workspace path passed by the caller is not part of the index.
    #[error("Workspace not found at path: {path}")]
    #[diagnostic(
        code(wsalign::workspace::not_found),
        help("Run 'wsalign list' to see the discovered workspaces")
    )]
    WorkspaceNotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// Caller supplied input rejected before planning.
    #[error("Invalid input: {message}")]
    #[diagnostic(
        code(wsalign::validation),
        help("Package names and versions must be non-empty")
    )]
    Validation {
        /// Description of what is invalid.
        message: String,
    },

    /// An external process exceeded its time bound.
    #[error("{operation} timed out after {seconds} seconds")]
    #[diagnostic(
        code(wsalign::process::timeout),
        help("Increase the timeout in .wsalign.toml or check network connectivity")
    )]
    Timeout {
        /// What was running when the bound was hit.
        operation: String,
        /// The bound in seconds.
        seconds: u64,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(wsalign::io_error),
        help(
            "Check that the referenced paths exist and that you have permission to read or write them"
        )
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON parsing error.
    #[error("JSON parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(wsalign::json_error),
        help("Ensure the package.json has valid JSON syntax")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },

    /// Configuration file error.
    #[error("Invalid configuration{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(wsalign::config_error),
        help("Check .wsalign.toml for syntax errors or unknown keys")
    )]
    Config {
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
        /// Optional path to the configuration file.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Builds a [`Error::Validation`] from any displayable message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source, path: None }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Self::Config { source, path: None }
    }
}
