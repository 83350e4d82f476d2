//! Command-line interface definitions for glide.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use logging::LogArgs;

/// Command-line interface for the `glide` binary.
#[derive(Parser, Debug)]
#[command(
    name = "glide",
    about = "Replay window-effect scenarios against the animation lifecycle controller",
    version
)]
pub struct Cli {
    /// Logging controls shared across glide binaries.
    #[command(flatten)]
    pub log: LogArgs,

    /// Which command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario file through a controller backed by the timeline engine.
    Replay(ReplayArgs),
    /// Load and validate an effects configuration file.
    Check(CheckArgs),
    /// Print the built-in effect configuration as RON.
    Defaults,
}

/// Arguments for the `replay` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Scenario file (RON).
    #[arg(value_name = "SCENARIO")]
    pub scenario: PathBuf,

    /// Effects configuration (RON). Falls back to ~/.glide/effects.ron, then
    /// to the built-in effects.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable a configured effect before the scenario starts. Repeatable.
    #[arg(long = "enable", value_name = "EFFECT")]
    pub enable: Vec<String>,

    /// Emit the report as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Effects configuration (RON).
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn replay_flags_parse() {
        let cli = Cli::try_parse_from([
            "glide",
            "--debug",
            "replay",
            "demo.ron",
            "--enable",
            "minimize",
            "--json",
        ])
        .unwrap();
        assert!(cli.log.debug);
        let Commands::Replay(args) = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(args.scenario, PathBuf::from("demo.ron"));
        assert_eq!(args.enable, vec!["minimize".to_string()]);
        assert!(args.json);
    }
}
