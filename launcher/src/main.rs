//! Trading system launcher.
//!
//! Runs the trading program through its dependency manager with a fixed
//! ticker list, appending its output between timestamped markers in
//! `trading_log.txt` next to the launcher.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use launcher::exit_codes;
use launcher::history::{format_run, read_history};
use launcher::io::config::load_config;
use launcher::io::program::DependencyManagerRunner;
use launcher::io::workdir;
use launcher::launch::{LaunchOptions, launch, resolve_config_path};
use launcher::logging;

#[derive(Parser)]
#[command(
    name = "launcher",
    version,
    about = "Run the trading system and record it in trading_log.txt"
)]
struct Cli {
    /// Launcher directory (defaults to the directory containing this executable).
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Config file, relative to the launcher directory (defaults to `launcher.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize past runs recorded in the trading log.
    History,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let options = LaunchOptions {
        dir: cli.dir,
        config: cli.config,
    };
    match cli.command {
        None => cmd_launch(&options),
        Some(Command::History) => cmd_history(&options),
    }
}

fn cmd_launch(options: &LaunchOptions) -> Result<i32> {
    let outcome = launch(options, &DependencyManagerRunner)?;
    Ok(outcome.exit_code())
}

fn cmd_history(options: &LaunchOptions) -> Result<i32> {
    let root = workdir::launcher_dir(options.dir.as_deref())?;
    let config_path = resolve_config_path(&root, options.config.as_deref());
    let config = load_config(&config_path).context("load launcher config")?;
    let runs = read_history(&root.join(&config.log_file))?;
    for (idx, run) in runs.iter().enumerate() {
        println!("{}", format_run(idx + 1, run));
    }
    Ok(exit_codes::OK)
}
