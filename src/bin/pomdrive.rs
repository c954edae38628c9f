//! pomdrive CLI - online planning for driver-assisted lane keeping
//!
//! This CLI provides a unified interface for:
//! - Running planner, driver-only and optimal experiments
//! - Sweeping planner hyper-parameters
//! - Summarising recorded telemetry
//! - Writing starter configuration files

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pomdrive")]
#[command(version, about = "Online POMDP planning for assisted steering", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one experiment
    Run(Box<pomdrive::cli::commands::run::RunArgs>),

    /// Run a hyper-parameter grid search
    Grid(Box<pomdrive::cli::commands::grid::GridArgs>),

    /// Summarise telemetry CSV files
    Summarize(pomdrive::cli::commands::summarize::SummarizeArgs),

    /// Write a default configuration file
    InitConfig(pomdrive::cli::commands::init_config::InitConfigArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pomdrive=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => pomdrive::cli::commands::run::execute(*args),
        Commands::Grid(args) => pomdrive::cli::commands::grid::execute(*args),
        Commands::Summarize(args) => pomdrive::cli::commands::summarize::execute(args),
        Commands::InitConfig(args) => pomdrive::cli::commands::init_config::execute(args),
    }
}
