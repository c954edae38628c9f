//! Init-config command - Write a starter experiment configuration

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::{
    app::ExperimentConfig,
    pipeline::AgentKind,
    vehicle::{Dynamics, LateralDrift},
};

#[derive(Parser, Debug)]
#[command(about = "Write a default experiment configuration")]
pub struct InitConfigArgs {
    /// Destination JSON file
    #[arg(default_value = "experiment.json")]
    pub path: PathBuf,

    /// Agent scenario (planner, driver, optimal)
    #[arg(long, default_value = "planner")]
    pub agent: String,

    /// Use the lateral-drift vehicle model instead of the kinematic bicycle
    #[arg(long, default_value_t = false)]
    pub lateral: bool,

    /// Overwrite an existing file
    #[arg(long, short = 'f', default_value_t = false)]
    pub force: bool,
}

pub fn execute(args: InitConfigArgs) -> Result<()> {
    if args.path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.path.display()
        );
    }

    let mut config = ExperimentConfig::default().with_agent(args.agent.parse::<AgentKind>()?);
    if args.lateral {
        let interval = config.simulator.integration.decision_interval;
        config = config.with_dynamics(Dynamics::LateralDrift(LateralDrift::new(0.1, interval)));
    }

    config
        .save(&args.path)
        .with_context(|| format!("Failed to write {}", args.path.display()))?;
    println!("Configuration written to {}", args.path.display());
    Ok(())
}
