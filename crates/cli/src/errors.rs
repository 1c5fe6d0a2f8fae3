//! CLI-specific error types
//!
//! Engine errors pass through unchanged so their diagnostic codes and help
//! text reach the terminal.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Engine(#[from] wsalign_engine::Error),

    #[error("Invalid argument {argument}: {message}")]
    #[diagnostic(
        code(wsalign::cli::invalid_argument),
        help("Run 'wsalign --help' to see available options")
    )]
    InvalidArgument { argument: String, message: String },

    #[error("Failed to render output")]
    #[diagnostic(code(wsalign::cli::output))]
    Output {
        #[source]
        source: serde_json::Error,
    },
}

impl CliError {
    pub fn invalid_argument(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(source: serde_json::Error) -> Self {
        Self::Output { source }
    }
}

pub type CliResult<T> = Result<T, CliError>;
