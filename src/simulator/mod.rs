//! Generative model of the car, its driver and the lane.
//!
//! [`DrivingSimulator`] composes the driver model, the decision stepper, the
//! reward model and the observation discretiser into the single forward step
//! the planner searches over. The same step advances the real environment in
//! the experiment harness, so both worlds share one definition of a decision.

mod driving;
mod state;

use serde::{Deserialize, Serialize};

pub use driving::{DrivingSimulator, Transition};
pub use state::State;

use crate::{
    Error, Result,
    discretizer::validate_sorted,
    driver::DriverConfig,
    observation::ObservationConfig,
    reward::RewardConfig,
    vehicle::IntegrationConfig,
};

/// Default agent steering menu.
pub const DEFAULT_AGENT_ACTIONS: [f64; 11] = [
    -2.0, -1.0, -0.5, -0.25, -0.1, 0.0, 0.1, 0.25, 0.5, 1.0, 2.0,
];

/// Driver menu derived from an agent menu: the agent's extreme corrections
/// are out of a human's reach, so the first and last entries are dropped.
pub fn driver_menu(agent_actions: &[f64]) -> Vec<f64> {
    if agent_actions.len() > 2 {
        agent_actions[1..agent_actions.len() - 1].to_vec()
    } else {
        agent_actions.to_vec()
    }
}

/// Rollout bias and prior values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreferredActionConfig {
    /// Standard deviation of the zero-mean Gaussian rollout steer
    pub std_dev: f64,
    /// Prior value floor; priors lie in `[base, 1]`
    pub reward_base: f64,
    /// Scale of the normal CDF shaping the prior
    pub cdf_scale: f64,
}

impl Default for PreferredActionConfig {
    fn default() -> Self {
        Self {
            std_dev: 0.25,
            reward_base: 0.5,
            cdf_scale: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Agent steering increments, sorted ascending
    pub actions: Vec<f64>,
    pub driver: DriverConfig,
    pub reward: RewardConfig,
    pub observation: ObservationConfig,
    pub integration: IntegrationConfig,
    /// `|2d/w|` at which an episode terminates
    pub terminal_ratio: f64,
    pub preferred: PreferredActionConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let actions = DEFAULT_AGENT_ACTIONS.to_vec();
        let driver = DriverConfig {
            actions: driver_menu(&actions),
            ..DriverConfig::default()
        };
        Self {
            actions,
            driver,
            reward: RewardConfig::default(),
            observation: ObservationConfig::default(),
            integration: IntegrationConfig::default(),
            terminal_ratio: 1.05,
            preferred: PreferredActionConfig::default(),
        }
    }
}

impl SimulatorConfig {
    /// Replace the agent menu and derive the driver menu from it.
    pub fn with_actions(mut self, actions: Vec<f64>) -> Self {
        self.driver.actions = driver_menu(&actions);
        self.actions = actions;
        self
    }

    pub fn with_driver(mut self, driver: DriverConfig) -> Self {
        self.driver = driver;
        self
    }

    pub fn with_reward(mut self, reward: RewardConfig) -> Self {
        self.reward = reward;
        self
    }

    pub fn with_observation(mut self, observation: ObservationConfig) -> Self {
        self.observation = observation;
        self
    }

    pub fn with_integration(mut self, integration: IntegrationConfig) -> Self {
        self.integration = integration;
        self
    }

    pub fn with_terminal_ratio(mut self, ratio: f64) -> Self {
        self.terminal_ratio = ratio;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_sorted("agent action menu", &self.actions)?;
        self.driver.validate()?;
        self.reward.validate()?;
        self.observation.validate()?;
        self.integration.step_counts()?;
        if !(self.terminal_ratio.is_finite() && self.terminal_ratio > 0.0) {
            return Err(Error::config(format!(
                "terminal ratio must be positive, got {}",
                self.terminal_ratio
            )));
        }
        let p = &self.preferred;
        if !(p.std_dev.is_finite() && p.std_dev > 0.0) {
            return Err(Error::config("preferred-action std_dev must be positive"));
        }
        if !(p.cdf_scale.is_finite() && p.cdf_scale > 0.0) {
            return Err(Error::config("preferred-action cdf_scale must be positive"));
        }
        if !(0.0..=1.0).contains(&p.reward_base) {
            return Err(Error::config("preferred-action reward_base must lie in [0, 1]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_menu_drops_extremes() {
        assert_eq!(driver_menu(&[-2.0, -1.0, 0.0, 1.0, 2.0]), vec![-1.0, 0.0, 1.0]);
        assert_eq!(driver_menu(&[-1.0, 1.0]), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_default_config_is_valid() {
        SimulatorConfig::default().validate().unwrap();
    }

    #[test]
    fn test_unsorted_agent_menu_rejected() {
        let config = SimulatorConfig::default().with_actions(vec![0.0, -1.0, 1.0]);
        assert!(matches!(
            config.validate(),
            Err(Error::UnsortedMenu { .. })
        ));
    }
}
