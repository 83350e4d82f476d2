#![warn(missing_docs)]

//! Entry point for the `glide` binary.

mod cli;
mod error;
mod replay;
mod scenario;

use std::{io, process};

use clap::Parser;
use config::EffectsConfig;
use logging::fmt::LogfmtLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, registry};

use crate::{
    cli::{CheckArgs, Cli, Commands, ReplayArgs},
    error::Result,
    replay::Replay,
    scenario::Scenario,
};

fn main() {
    if let Err(err) = run() {
        error!("{err}");
        eprintln!("error: {err}");
        process::exit(1);
    }
}

/// Parse CLI arguments, install logging, and dispatch to the chosen subcommand.
fn run() -> Result<()> {
    let Cli { log, command } = Cli::parse();
    let env_filter = logging::env_filter_from_spec(&log.spec());
    registry()
        .with(env_filter)
        .with(log.logfmt.then(LogfmtLayer::stderr))
        .with((!log.logfmt).then(|| fmt::layer().without_time().with_writer(io::stderr)))
        .try_init()
        .ok();

    match command {
        Commands::Replay(args) => replay(&args),
        Commands::Check(args) => check(&args),
        Commands::Defaults => {
            print!("{}", config::to_ron_string(&EffectsConfig::builtin())?);
            Ok(())
        }
    }
}

/// Run a scenario and print its report.
fn replay(args: &ReplayArgs) -> Result<()> {
    let config = config::load_or_builtin(args.config.as_deref())?;
    let scenario = Scenario::load(&args.scenario)?;
    let mut replay = Replay::new(config);
    for effect in &args.enable {
        replay.enable(effect)?;
    }
    let report = replay.run(&scenario)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

/// Validate a configuration file, printing a located diagnostic on failure.
fn check(args: &CheckArgs) -> Result<()> {
    match config::load_from_path(&args.path) {
        Ok(config) => {
            info!(path = %args.path.display(), "configuration ok");
            println!(
                "{}: {} effect(s), {} enabled",
                args.path.display(),
                config.effects.len(),
                config.enabled().count()
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.pretty());
            Err(err.into())
        }
    }
}
