mod cli;
mod commands;
mod errors;
mod output;
mod tracing;

use crate::tracing::{TracingConfig, TracingFormat};

/// Exit status when a command ran but some workspace, package or install
/// location failed.
const PARTIAL_FAILURE_EXIT: i32 = 2;

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(PARTIAL_FAILURE_EXIT),
        Err(error) => {
            eprintln!("{error:?}");
            std::process::exit(1);
        }
    }
}

async fn run() -> miette::Result<bool> {
    let cli = cli::parse();

    let format = if cli.json {
        TracingFormat::Json
    } else {
        cli.log_format
    };
    crate::tracing::init_tracing(TracingConfig {
        format,
        level: cli.level.into(),
    })?;

    Ok(commands::execute(cli).await?)
}
