mod cli;
mod commands;
mod context;
mod progress;
mod render;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Commands};
use context::ProjectContext;
use std::io;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = ProjectContext {
        config: cli.config,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Diff => commands::diff::run(&ctx),
        Commands::Sync(args) => commands::sync::run(&ctx, &args),
        Commands::Import(args) => commands::import::run(&ctx, &args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "tarifa", &mut io::stdout());
            Ok(())
        }
    }
}
