use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tarifa")]
#[command(version)]
#[command(about = "Keep a billing provider's catalog in sync with a local file", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the local catalog file
    #[arg(short, long, default_value = "billing.json", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what sync would change, without touching anything
    Diff,

    /// Push the local catalog to the provider
    Sync(SyncArgs),

    /// Overwrite the local catalog with the provider's current state
    Import(ImportArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser)]
pub struct SyncArgs {
    /// Apply without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Overwrite the local file without asking for confirmation
    #[arg(short, long)]
    pub yes: bool,
}
