//! Experiment configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    pipeline::{AgentKind, RunnerConfig},
    planner::PlannerConfig,
    simulator::SimulatorConfig,
    vehicle::{CruiseConfig, Dynamics, VehicleState},
};

/// Everything needed to run one experiment.
///
/// The value is immutable once handed to [`App`](super::App); every stochastic
/// component derives its generator from `seed`.
///
/// # Examples
///
/// ```
/// use pomdrive::app::ExperimentConfig;
/// use pomdrive::pipeline::AgentKind;
///
/// let config = ExperimentConfig::default()
///     .with_agent(AgentKind::DriverOnly)
///     .with_runs(3)
///     .with_target_actions(200)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Label used for output file names
    pub name: String,
    pub agent: AgentKind,
    pub runs: usize,
    /// Decisions after which a run stops
    pub target_actions: u32,
    /// Seed for the planner and environment generators
    pub seed: Option<u64>,
    /// Maximum warm-up decisions before planning; `None` starts planning at once
    pub warm_up: Option<u32>,
    pub simulator: SimulatorConfig,
    pub planner: PlannerConfig,
    pub dynamics: Dynamics,
    pub cruise: CruiseConfig,
    /// Vehicle configuration at the start line
    pub start: VehicleState,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "experiment".to_string(),
            agent: AgentKind::Planner,
            runs: 10,
            target_actions: 1000,
            seed: None,
            warm_up: None,
            simulator: SimulatorConfig::default(),
            planner: PlannerConfig::default(),
            dynamics: Dynamics::default(),
            cruise: CruiseConfig::default(),
            start: VehicleState::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_agent(mut self, agent: AgentKind) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    pub fn with_target_actions(mut self, target_actions: u32) -> Self {
        self.target_actions = target_actions;
        self
    }

    /// Set the random seed for deterministic runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_warm_up(mut self, max_decisions: u32) -> Self {
        self.warm_up = Some(max_decisions);
        self
    }

    pub fn with_simulator(mut self, simulator: SimulatorConfig) -> Self {
        self.simulator = simulator;
        self
    }

    pub fn with_planner(mut self, planner: PlannerConfig) -> Self {
        self.planner = planner;
        self
    }

    pub fn with_dynamics(mut self, dynamics: Dynamics) -> Self {
        self.dynamics = dynamics;
        self
    }

    pub fn with_cruise(mut self, cruise: CruiseConfig) -> Self {
        self.cruise = cruise;
        self
    }

    pub fn with_start(mut self, start: VehicleState) -> Self {
        self.start = start;
        self
    }

    /// Harness settings derived from this configuration.
    pub fn runner(&self) -> RunnerConfig {
        RunnerConfig {
            agent: self.agent,
            runs: self.runs,
            target_actions: self.target_actions,
            warm_up: self.warm_up,
            warm_up_speed: self.cruise.target_speed,
        }
    }

    /// Check every nested section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] (or a menu error) for the first
    /// malformed value.
    pub fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(Error::config("runs must be positive"));
        }
        if self.target_actions == 0 {
            return Err(Error::config("target actions must be positive"));
        }
        if !(self.start.lane_width.is_finite() && self.start.lane_width > 0.0) {
            return Err(Error::config(format!(
                "lane width must be positive, got {}",
                self.start.lane_width
            )));
        }
        if !(self.cruise.target_speed.is_finite() && self.cruise.target_speed >= 0.0) {
            return Err(Error::config(format!(
                "target speed must be non-negative, got {}",
                self.cruise.target_speed
            )));
        }
        self.simulator.validate()?;
        self.planner.validate()
    }

    /// Parse a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| Error::io(format!("open {}", path.display()), e))?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .map_err(|e| Error::io(format!("create {}", path.display()), e))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ExperimentConfig::default().validate().is_ok());
    }

    #[test]
    fn test_runner_uses_cruise_speed_for_warm_up() {
        let config = ExperimentConfig::default().with_warm_up(50);
        let runner = config.runner();
        assert_eq!(runner.warm_up, Some(50));
        assert_eq!(runner.warm_up_speed, 13.9);
    }

    #[test]
    fn test_validate_rejects_zero_runs() {
        let config = ExperimentConfig::default().with_runs(0);
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{"name": "short", "runs": 2, "agent": "driver_only"}"#)
                .unwrap();
        assert_eq!(config.name, "short");
        assert_eq!(config.runs, 2);
        assert_eq!(config.agent, AgentKind::DriverOnly);
        assert_eq!(config.target_actions, 1000);
    }
}
