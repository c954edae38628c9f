//! Common fixtures for the pomdrive test suite.
//!
//! `Corridor` is a toy simulator for exercising the planner in isolation;
//! `lateral_config` builds the lateral-drift lane scenario used by the
//! end-to-end tests.

#![allow(dead_code)]

use pomdrive::{
    app::ExperimentConfig,
    driver::DriverConfig,
    pipeline::AgentKind,
    planner::PlannerConfig,
    ports::{Simulator, Step, Transformed},
    reward::RewardConfig,
    simulator::SimulatorConfig,
    vehicle::{Dynamics, LateralDrift, VehicleState},
};
use rand::{Rng, rngs::StdRng};

/// One-dimensional corridor: actions move left, stay or move right, the
/// observation is the position and walking past `half_width` ends the episode.
#[derive(Debug, Clone)]
pub struct Corridor {
    pub half_width: i32,
    /// Probability that a move is ignored
    pub slip: f64,
}

impl Corridor {
    pub fn new(half_width: i32) -> Self {
        Self {
            half_width,
            slip: 0.0,
        }
    }

    pub fn with_slip(mut self, slip: f64) -> Self {
        self.slip = slip;
        self
    }
}

impl Simulator for Corridor {
    type State = i32;
    type Observation = i32;

    fn num_actions(&self) -> usize {
        3
    }

    fn sample_initial_state(&self, _rng: &mut StdRng) -> i32 {
        0
    }

    fn simulate(&self, state: &i32, action: usize, _depth: usize, rng: &mut StdRng) -> Step<i32, i32> {
        let delta = action as i32 - 1;
        let moved = if self.slip > 0.0 && rng.random_bool(self.slip) {
            *state
        } else {
            state + delta
        };
        Step {
            state: moved,
            observation: moved,
            reward: -(moved.abs() as f64),
            terminal: moved.abs() > self.half_width,
        }
    }

    fn transform(
        &self,
        _prev: &i32,
        _last_action: usize,
        _current: &i32,
        observation: &i32,
        _rng: &mut StdRng,
    ) -> Transformed<i32> {
        Transformed {
            state: *observation,
            consistent: true,
        }
    }
}

/// Planner settings small enough for debug-mode tests.
pub fn small_planner() -> PlannerConfig {
    PlannerConfig::default()
        .with_simulations(300)
        .with_particles(64)
}

/// Lane of width 2 (so the offset ratio equals the offset), agent menu
/// `{-1, 0, 1}`, a driver that always steers 0, dynamics moving the offset
/// by `0.1·steer` per decision, terminal at ratio 1 and reward `-|offset|`.
pub fn lateral_config(agent: AgentKind) -> ExperimentConfig {
    let simulator = SimulatorConfig::default()
        .with_actions(vec![-1.0, 0.0, 1.0])
        .with_driver(DriverConfig::always_attentive(vec![0.0]))
        .with_reward(RewardConfig::distance(1.0))
        .with_terminal_ratio(1.0);
    let interval = simulator.integration.decision_interval;
    ExperimentConfig::default()
        .with_name("lateral")
        .with_agent(agent)
        .with_runs(1)
        .with_target_actions(100)
        .with_seed(7)
        .with_simulator(simulator)
        .with_planner(small_planner())
        .with_dynamics(Dynamics::LateralDrift(LateralDrift::new(0.1, interval)))
        .with_start(VehicleState {
            lane_width: 2.0,
            ..VehicleState::default()
        })
}
