use rand::{Rng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use statrs::distribution::{ContinuousCDF, Normal as NormalCdf};

use super::{SimulatorConfig, State};
use crate::{
    Error, Result,
    discretizer,
    driver::{DriverModel, DriverState},
    observation::{Observation, ObservationConfig},
    ports::{
        ActionStats, GroundTruth, LowLevelController, Simulator, Step, Transformed,
        VehicleDynamics,
    },
    reward::RewardModel,
    vehicle::{CruiseController, DecisionStepper, TruthCell},
};

/// Everything one decision produced, including the raw steering values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: State,
    pub observation: Observation,
    pub reward: f64,
    pub terminal: bool,
    pub agent_action: f64,
    pub driver_action: f64,
    /// Steering actually applied, `clamp(driver + agent, -1, 1)`
    pub combined_action: f64,
}

/// Forward model of a driver-assisted car on a lane.
pub struct DrivingSimulator<D, C = CruiseController, T = TruthCell> {
    actions: Vec<f64>,
    driver: DriverModel,
    reward: RewardModel,
    observation: ObservationConfig,
    stepper: DecisionStepper,
    terminal_ratio: f64,
    rollout_steer: Normal<f64>,
    prior_cdf: NormalCdf,
    prior_base: f64,
    dynamics: D,
    controller: C,
    truth: T,
}

impl<D, C, T> DrivingSimulator<D, C, T>
where
    D: VehicleDynamics,
    C: LowLevelController,
    T: GroundTruth,
{
    /// Build a simulator from validated configuration and its collaborators.
    ///
    /// # Errors
    ///
    /// Returns the first validation error in `config`.
    pub fn new(config: &SimulatorConfig, dynamics: D, controller: C, truth: T) -> Result<Self> {
        config.validate()?;
        let p = &config.preferred;
        let rollout_steer = Normal::new(0.0, p.std_dev)
            .map_err(|e| Error::config(format!("preferred-action std_dev: {e}")))?;
        let prior_cdf = NormalCdf::new(0.0, p.cdf_scale)
            .map_err(|e| Error::config(format!("preferred-action cdf_scale: {e}")))?;
        Ok(Self {
            actions: config.actions.clone(),
            driver: DriverModel::new(config.driver.clone())?,
            reward: RewardModel::new(config.reward)?,
            observation: config.observation.clone(),
            stepper: DecisionStepper::new(&config.integration)?,
            terminal_ratio: config.terminal_ratio,
            rollout_steer,
            prior_cdf,
            prior_base: p.reward_base,
            dynamics,
            controller,
            truth,
        })
    }

    pub fn actions(&self) -> &[f64] {
        &self.actions
    }

    pub fn driver(&self) -> &DriverModel {
        &self.driver
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn stepper(&self) -> &DecisionStepper {
        &self.stepper
    }

    pub fn terminal_ratio(&self) -> f64 {
        self.terminal_ratio
    }

    /// Steering increment of menu entry `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ActionOutOfRange`] for an index outside the menu.
    pub fn action_value(&self, index: usize) -> Result<f64> {
        self.actions
            .get(index)
            .copied()
            .ok_or(Error::ActionOutOfRange {
                index,
                len: self.actions.len(),
            })
    }

    /// Menu index closest to a continuous steering increment.
    pub fn nearest_action(&self, value: f64) -> usize {
        discretizer::nearest_index(&self.actions, value).unwrap_or(0)
    }

    /// Discretise a configuration reached after the driver applied
    /// `driver_action`.
    pub fn observe(&self, state: &State, driver_action: f64) -> Observation {
        Observation::new(
            &self.observation,
            &state.vehicle,
            driver_action,
            self.driver.actions(),
            state.decisions,
        )
    }

    /// Particle built from the published ground truth and a fresh driver.
    /// The decision counter is taken from the real episode.
    pub fn sample_from_truth(&self, rng: &mut StdRng, initial: bool) -> State {
        State {
            decisions: self.truth.read_decisions(),
            ..State::new(
                self.truth.read_ground_truth(),
                self.driver.sample_state(rng, initial),
            )
        }
    }

    /// Advance one decision with the driver's contribution fixed.
    ///
    /// `next_driver` becomes the driver state of the successor.
    pub fn step_with_driver(
        &self,
        state: &State,
        agent_action: f64,
        driver_action: f64,
        next_driver: DriverState,
    ) -> Transition {
        let combined_action = (driver_action + agent_action).clamp(-1.0, 1.0);
        let vehicle = self.stepper.step(
            &self.dynamics,
            &self.controller,
            &state.vehicle,
            combined_action,
        );
        let next = State {
            vehicle,
            driver: next_driver,
            decisions: state.decisions + 1,
        };
        let reward = self.reward.reward(&next.vehicle, agent_action);
        let terminal = next.vehicle.is_beyond(self.terminal_ratio);
        Transition {
            state: next,
            observation: self.observe(&next, driver_action),
            reward,
            terminal,
            agent_action,
            driver_action,
            combined_action,
        }
    }

    /// Advance one decision: the driver reacts to the current configuration,
    /// its output is combined with `agent_action` and the vehicle integrates
    /// across the decision interval.
    pub fn step(&self, state: &State, agent_action: f64, rng: &mut StdRng) -> Transition {
        let mut driver = state.driver;
        let driver_action = self.driver.update(&mut driver, &state.vehicle, rng);
        self.step_with_driver(state, agent_action, driver_action, driver)
    }

    /// Interval `[low, high]` around driver-menu entry `index`,
    /// reaching halfway to each neighbour.
    fn driver_cell(&self, index: usize) -> (f64, f64) {
        let menu = self.driver.actions();
        let value = menu[index];
        let low = if index > 0 {
            value - (value - menu[index - 1]) / 2.0
        } else {
            value
        };
        let high = if index + 1 < menu.len() {
            value + (menu[index + 1] - value) / 2.0
        } else {
            value
        };
        (low, high)
    }
}

impl<D, C, T> Simulator for DrivingSimulator<D, C, T>
where
    D: VehicleDynamics,
    C: LowLevelController,
    T: GroundTruth,
{
    type State = State;
    type Observation = Observation;

    fn num_actions(&self) -> usize {
        self.actions.len()
    }

    fn sample_initial_state(&self, rng: &mut StdRng) -> State {
        self.sample_from_truth(rng, true)
    }

    fn simulate(
        &self,
        state: &State,
        action: usize,
        _depth: usize,
        rng: &mut StdRng,
    ) -> Step<State, Observation> {
        let agent_action = self.actions.get(action).copied().unwrap_or(0.0);
        let t = self.step(state, agent_action, rng);
        Step {
            state: t.state,
            observation: t.observation,
            reward: t.reward,
            terminal: t.terminal,
        }
    }

    fn transform(
        &self,
        prev: &State,
        last_action: usize,
        current: &State,
        observation: &Observation,
        rng: &mut StdRng,
    ) -> Transformed<State> {
        let menu = self.driver.actions();
        let bin = observation.driver_action_bin.min(menu.len() - 1);
        let observed = menu[bin];

        if self.driver.config().discrete_actions {
            let state = State {
                driver: self.driver.sample_state_with_action(rng, observed),
                ..*current
            };
            let consistent = self.observe(&state, observed) == *observation;
            return Transformed { state, consistent };
        }

        let (low, high) = self.driver_cell(bin);
        let driver_action = if high > low {
            rng.random_range(low..=high)
        } else {
            low
        };
        let agent_action = self.actions.get(last_action).copied().unwrap_or(0.0);
        let driver = self.driver.sample_state_with_action(rng, driver_action);
        let t = self.step_with_driver(prev, agent_action, driver_action, driver);
        Transformed {
            state: t.state,
            consistent: t.observation == *observation,
        }
    }

    fn sample_preferred_action(&self, _state: &State, rng: &mut StdRng) -> usize {
        self.nearest_action(self.rollout_steer.sample(rng))
    }

    fn update_preferred_action_values(&self, stats: &mut [ActionStats]) {
        for (stat, &action) in stats.iter_mut().zip(&self.actions) {
            let cdf = self.prior_cdf.cdf(action);
            let prob = if action < 0.0 { cdf } else { 1.0 - cdf };
            stat.value = self.prior_base + (1.0 - self.prior_base) * prob;
        }
    }
}
