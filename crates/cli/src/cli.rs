use crate::tracing::{LogLevel, TracingFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use wsalign_engine::DependencySlot;

#[derive(Parser, Debug)]
#[command(name = "wsalign")]
#[command(about = "Find and fix dependency version drift across monorepo workspaces")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        long,
        global = true,
        env = "WSALIGN_ROOT",
        default_value = ".",
        help = "Monorepo root directory"
    )]
    pub root: PathBuf,

    #[arg(
        short = 'o',
        long,
        global = true,
        default_value = "text",
        value_enum,
        help = "Command output format"
    )]
    pub output: OutputFormat,

    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        help = "Bound for registry lookups (overrides .wsalign.toml)"
    )]
    pub registry_timeout: Option<u64>,

    #[arg(
        long,
        global = true,
        value_name = "SECONDS",
        help = "Bound for install runs (overrides .wsalign.toml)"
    )]
    pub install_timeout: Option<u64>,

    #[arg(
        short = 'l',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: LogLevel,

    #[arg(long, global = true, help = "Log format", default_value = "compact", value_enum)]
    pub log_format: TracingFormat,

    #[arg(long, global = true, help = "Output logs in JSON format")]
    pub json: bool,
}

/// How command results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Flags shared by every command that rewrites manifests.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ApplyArgs {
    #[arg(long, help = "Show the planned changes without writing them")]
    pub dry_run: bool,

    #[arg(long, help = "Run the package manager's install after a successful apply")]
    pub install: bool,
}

/// Batch resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Strategy {
    /// Align on the version declared by the most workspaces
    MostCommon,
    /// Align everything on the "latest" tag
    Latest,
    /// Use explicit --pick decisions, skipping unlisted packages
    Pick,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "List discovered workspaces")]
    List,
    #[command(about = "Show which workspaces declare which version of a package")]
    Versions {
        #[arg(help = "Package name")]
        package: String,
    },
    #[command(about = "List packages declared at more than one version")]
    Conflicts,
    #[command(about = "Add or update a dependency in selected workspaces")]
    Add {
        #[arg(help = "Package name")]
        package: String,
        #[arg(help = "Version or range to declare")]
        version: String,
        #[arg(
            long,
            short = 's',
            default_value = "dependencies",
            help = "Dependency slot (dependencies, devDependencies, peerDependencies)"
        )]
        slot: DependencySlot,
        #[arg(
            long = "workspace",
            short = 'w',
            value_name = "WORKSPACE",
            help = "Target workspace by name or path (repeatable)"
        )]
        workspaces: Vec<String>,
        #[arg(long, conflicts_with = "workspaces", help = "Target every workspace")]
        all: bool,
        #[command(flatten)]
        apply: ApplyArgs,
    },
    #[command(about = "Remove a dependency from every slot of selected workspaces")]
    Remove {
        #[arg(help = "Package name")]
        package: String,
        #[arg(
            long = "workspace",
            short = 'w',
            value_name = "WORKSPACE",
            help = "Target workspace (defaults to every workspace declaring the package)"
        )]
        workspaces: Vec<String>,
        #[command(flatten)]
        apply: ApplyArgs,
    },
    #[command(about = "Align every workspace declaring a package on one version")]
    Sync {
        #[arg(help = "Package name")]
        package: String,
        #[arg(help = "Target version")]
        version: String,
        #[command(flatten)]
        apply: ApplyArgs,
    },
    #[command(about = "Resolve every conflict with a batch strategy")]
    Resolve {
        #[arg(long, value_enum, default_value = "most-common", help = "Resolution strategy")]
        strategy: Strategy,
        #[arg(
            long = "pick",
            value_name = "PACKAGE=CHOICE",
            help = "Decision for --strategy pick: a version, 'skip', or '@registry'"
        )]
        picks: Vec<String>,
        #[command(flatten)]
        apply: ApplyArgs,
    },
    #[command(about = "Look up the latest published version of a package")]
    Latest {
        #[arg(help = "Package name")]
        package: String,
    },
    #[command(about = "Run the detected package manager's install")]
    Install {
        #[arg(
            long = "workspace",
            short = 'w',
            value_name = "WORKSPACE",
            help = "Target workspace (defaults to every workspace)"
        )]
        workspaces: Vec<String>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["wsalign", "list"]).unwrap();

        assert!(matches!(cli.level, LogLevel::Warn));
        assert_eq!(cli.output, OutputFormat::Text);
        assert_eq!(cli.log_format, TracingFormat::Compact);
        assert!(!cli.json);
        assert!(cli.registry_timeout.is_none());
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_cli_log_level_parsing() {
        let cli = Cli::try_parse_from(["wsalign", "--level", "debug", "list"]).unwrap();
        assert!(matches!(cli.level, LogLevel::Debug));

        let cli_short = Cli::try_parse_from(["wsalign", "-l", "error", "list"]).unwrap();
        assert!(matches!(cli_short.level, LogLevel::Error));

        assert!(Cli::try_parse_from(["wsalign", "--level", "loud", "list"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "wsalign",
            "conflicts",
            "--root",
            "/tmp/repo",
            "--output",
            "json",
            "--json",
        ])
        .unwrap();

        assert_eq!(cli.root, PathBuf::from("/tmp/repo"));
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(cli.json);
    }

    #[test]
    fn test_add_parses_slot_and_targets() {
        let cli = Cli::try_parse_from([
            "wsalign", "add", "react", "^18.0.0", "--slot", "dev", "-w", "web", "-w", "ui",
            "--dry-run",
        ])
        .unwrap();

        let Commands::Add {
            package,
            version,
            slot,
            workspaces,
            all,
            apply,
        } = cli.command
        else {
            panic!("Expected Add command");
        };
        assert_eq!(package, "react");
        assert_eq!(version, "^18.0.0");
        assert_eq!(slot, DependencySlot::DevDependencies);
        assert_eq!(workspaces, vec!["web", "ui"]);
        assert!(!all);
        assert!(apply.dry_run);
        assert!(!apply.install);
    }

    #[test]
    fn test_add_all_conflicts_with_workspace() {
        let result = Cli::try_parse_from([
            "wsalign", "add", "react", "^18.0.0", "--all", "-w", "web",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_add_rejects_unknown_slot() {
        let result = Cli::try_parse_from([
            "wsalign",
            "add",
            "react",
            "^18.0.0",
            "--slot",
            "optionalDependencies",
            "--all",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_defaults_and_picks() {
        let cli = Cli::try_parse_from(["wsalign", "resolve"]).unwrap();
        let Commands::Resolve { strategy, picks, .. } = cli.command else {
            panic!("Expected Resolve command");
        };
        assert_eq!(strategy, Strategy::MostCommon);
        assert!(picks.is_empty());

        let cli = Cli::try_parse_from([
            "wsalign",
            "resolve",
            "--strategy",
            "pick",
            "--pick",
            "lodash=^4.17.21",
            "--pick",
            "zod=skip",
            "--install",
        ])
        .unwrap();
        let Commands::Resolve {
            strategy,
            picks,
            apply,
        } = cli.command
        else {
            panic!("Expected Resolve command");
        };
        assert_eq!(strategy, Strategy::Pick);
        assert_eq!(picks, vec!["lodash=^4.17.21", "zod=skip"]);
        assert!(apply.install);
    }

    #[test]
    fn test_missing_subcommand() {
        assert!(Cli::try_parse_from(["wsalign"]).is_err());
    }

    #[test]
    fn test_help_flag() {
        let err = Cli::try_parse_from(["wsalign", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
