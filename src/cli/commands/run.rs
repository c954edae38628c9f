//! Run command - Drive one experiment and record its telemetry

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    app::App,
    cli::{config::ExperimentArgs, output},
    pipeline::{
        CsvTelemetryObserver, MetricsObserver, ProgressObserver, SharedObserver, TracingObserver,
    },
};

#[derive(Parser, Debug)]
#[command(about = "Run a driving experiment", allow_negative_numbers = true)]
pub struct RunArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// CSV file receiving one row per real decision
    #[arg(long, short = 'o')]
    pub telemetry: Option<PathBuf>,

    /// JSON file receiving the aggregate result
    #[arg(long)]
    pub result: Option<PathBuf>,

    /// Show progress bar
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub progress: bool,

    /// Log every run start and end
    #[arg(long, default_value_t = false)]
    pub log_runs: bool,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let config = args.experiment.resolve()?;

    output::print_section(&format!("Experiment '{}'", config.name));
    output::print_kv("Agent", &config.agent.to_string());
    output::print_kv("Runs", &config.runs.to_string());
    output::print_kv("Target decisions", &config.target_actions.to_string());
    output::print_kv("Budget", &format!("{:?}", config.planner.budget));
    output::print_kv("Exploration", &config.planner.exploration.to_string());
    output::print_kv("Discount", &format!("{:.4}", config.planner.discount));
    if let Some(seed) = config.seed {
        output::print_kv("Seed", &seed.to_string());
    }

    let app = App::new();
    let (metrics, metrics_handle) = SharedObserver::new(MetricsObserver::new());
    let mut runner = app
        .create_runner(&config)
        .context("Failed to set up experiment")?
        .with_observer(Box::new(metrics));

    if let Some(path) = &args.telemetry {
        let observer = CsvTelemetryObserver::new(path)
            .with_context(|| format!("Failed to create telemetry file {}", path.display()))?;
        runner = runner.with_observer(Box::new(observer));
    }
    if args.progress {
        runner = runner.with_observer(Box::new(ProgressObserver::new()));
    }
    if args.log_runs {
        runner = runner.with_observer(Box::new(TracingObserver));
    }

    let result = runner.run().context("Experiment failed")?;

    output::print_section("Results");
    let metrics = metrics_handle
        .lock()
        .map(|m| m.summary())
        .unwrap_or_else(|poisoned| poisoned.into_inner().summary());
    output::print_result(&result, Some(&metrics));

    if let Some(path) = &args.telemetry {
        println!("\nTelemetry written to {}", path.display());
    }
    if let Some(path) = &args.result {
        result
            .save(path)
            .with_context(|| format!("Failed to write result {}", path.display()))?;
        println!("Result written to {}", path.display());
    }
    Ok(())
}
