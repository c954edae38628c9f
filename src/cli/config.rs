//! Shared configuration arguments for CLI commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::{
    app::ExperimentConfig,
    pipeline::AgentKind,
    planner::ActionPolicy,
    reward::RewardKernel,
    vehicle::{Dynamics, LateralDrift},
};

/// Configuration file plus command-line overrides
#[derive(Args, Debug, Clone, Default)]
pub struct ExperimentArgs {
    /// JSON experiment configuration (defaults are used when omitted)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Agent scenario (planner, driver, optimal)
    #[arg(long, short = 'a')]
    pub agent: Option<String>,

    /// Number of runs
    #[arg(long, short = 'r')]
    pub runs: Option<usize>,

    /// Decisions per run
    #[arg(long, short = 't')]
    pub target_actions: Option<u32>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Simulations per decision
    #[arg(long, short = 'n')]
    pub simulations: Option<u32>,

    /// Planning deadline per decision in milliseconds (replaces --simulations)
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// UCB1 exploration constant
    #[arg(long)]
    pub exploration: Option<f64>,

    /// Discount horizon; sets the discount to threshold^(1/(horizon-1))
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Particles per belief node
    #[arg(long)]
    pub particles: Option<usize>,

    /// Rollout policy (uniform, preferred)
    #[arg(long)]
    pub rollout: Option<String>,

    /// Reward kernel (exponential, linear, cosine, distance)
    #[arg(long)]
    pub reward: Option<String>,

    /// Warm up to cruise speed for at most this many decisions before planning
    #[arg(long)]
    pub warm_up: Option<u32>,

    /// Replace the vehicle model with lateral drift of this many metres per
    /// unit steer per decision
    #[arg(long)]
    pub lateral_drift: Option<f64>,
}

impl ExperimentArgs {
    /// Load the configuration file (or defaults) and apply every override.
    pub fn resolve(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ExperimentConfig::default(),
        };

        if let Some(agent) = &self.agent {
            config.agent = agent.parse::<AgentKind>()?;
        }
        if let Some(runs) = self.runs {
            config.runs = runs;
        }
        if let Some(target) = self.target_actions {
            config.target_actions = target;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(simulations) = self.simulations {
            config.planner = config.planner.with_simulations(simulations);
        }
        if let Some(ms) = self.deadline_ms {
            config.planner = config
                .planner
                .with_deadline(std::time::Duration::from_millis(ms));
        }
        if let Some(exploration) = self.exploration {
            config.planner = config.planner.with_exploration(exploration);
        }
        if let Some(horizon) = self.horizon {
            config.planner = config.planner.with_horizon(horizon);
        }
        if let Some(particles) = self.particles {
            config.planner = config.planner.with_particles(particles);
        }
        if let Some(rollout) = &self.rollout {
            config.planner = config.planner.with_rollout(rollout.parse::<ActionPolicy>()?);
        }
        if let Some(kernel) = &self.reward {
            config.simulator.reward.kernel = kernel.parse::<RewardKernel>()?;
        }
        if let Some(max) = self.warm_up {
            config.warm_up = Some(max);
        }
        if let Some(gain) = self.lateral_drift {
            config.dynamics = Dynamics::LateralDrift(LateralDrift::new(
                gain,
                config.simulator.integration.decision_interval,
            ));
        }

        config.validate().context("Invalid experiment configuration")?;
        Ok(config)
    }
}
