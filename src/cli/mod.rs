//! Command-line interface definitions.

pub mod banner;

use clap::{Parser, Subcommand};

/// Edgelord-arb - cross-exchange and triangular arbitrage detector.
#[derive(Parser, Debug)]
#[command(name = "edgelord-arb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the arbitrage detector (foreground).
    Run(RunArgs),

    /// Validate configuration without connecting to anything.
    Check {
        #[command(subcommand)]
        target: CheckTarget,
    },

    /// Print a status note for this version.
    Status,
}

#[derive(Subcommand, Debug)]
pub enum CheckTarget {
    /// Load and validate configuration from the environment, then exit.
    Config,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Detect opportunities but suppress notifier delivery.
    #[arg(long)]
    pub dry_run: bool,

    /// Override `LOG_FORMAT` (pretty or json).
    #[arg(long)]
    pub log_format: Option<String>,

    /// Skip the startup banner.
    #[arg(long)]
    pub no_banner: bool,
}
