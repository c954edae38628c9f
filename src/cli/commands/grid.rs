//! Grid command - Sweep planner hyper-parameters

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::{
    analysis::TelemetrySummary,
    app::App,
    cli::{config::ExperimentArgs, output},
    pipeline::{CsvTelemetryObserver, GridSearch},
};

#[derive(Parser, Debug)]
#[command(about = "Run a hyper-parameter grid search")]
pub struct GridArgs {
    #[command(flatten)]
    pub experiment: ExperimentArgs,

    /// Directory receiving one telemetry CSV per scenario and summary.csv
    #[arg(long, short = 'o', default_value = "grid")]
    pub output_dir: PathBuf,

    /// Simulation budgets (comma separated)
    #[arg(long = "grid-simulations", value_delimiter = ',')]
    pub grid_simulations: Option<Vec<u32>>,

    /// Exploration constants (comma separated)
    #[arg(long = "grid-exploration", value_delimiter = ',')]
    pub grid_exploration: Option<Vec<f64>>,

    /// Discount horizons (comma separated)
    #[arg(long = "grid-horizons", value_delimiter = ',')]
    pub grid_horizons: Option<Vec<u32>>,

    /// Also run the driver-only and optimal baselines
    #[arg(long, default_value_t = false)]
    pub baselines: bool,
}

pub fn execute(args: GridArgs) -> Result<()> {
    let base = args.experiment.resolve()?;
    let mut grid = GridSearch::new(base).with_baselines(args.baselines);
    if let Some(simulations) = args.grid_simulations {
        grid = grid.with_simulations(simulations);
    }
    if let Some(exploration) = args.grid_exploration {
        grid = grid.with_exploration(exploration);
    }
    if let Some(horizons) = args.grid_horizons {
        grid = grid.with_horizons(horizons);
    }

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    output::print_section(&format!("Grid search: {} scenarios", grid.len()));
    let app = App::new();
    let mut summaries = Vec::with_capacity(grid.len());

    for (index, config) in grid.scenarios().enumerate() {
        let path = args.output_dir.join(format!("{}.csv", config.name));
        info!(scenario = %config.name, index = index + 1, total = grid.len(), "scenario started");

        let observer = CsvTelemetryObserver::new(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut runner = app
            .create_runner(&config)
            .with_context(|| format!("Failed to set up scenario {}", config.name))?
            .with_observer(Box::new(observer));
        let result = runner
            .run()
            .with_context(|| format!("Scenario {} failed", config.name))?;
        println!(
            "[{}/{}] {:32} mean reward {:>10.4}  off-lane {}/{}",
            index + 1,
            grid.len(),
            config.name,
            result.mean_reward,
            result.terminal_runs,
            result.runs
        );

        summaries.push(TelemetrySummary::from_csv(&path)?);
    }

    let summary_path = args.output_dir.join("summary.csv");
    let mut writer = csv::Writer::from_path(&summary_path)
        .with_context(|| format!("Failed to create {}", summary_path.display()))?;
    for summary in &summaries {
        writer.serialize(summary)?;
    }
    writer.flush()?;

    output::print_section("Summary");
    output::print_summary_table(&summaries);
    println!("\nSummary written to {}", summary_path.display());
    Ok(())
}
