//! Generative simulator port.
//!
//! The planner only ever touches the world through this trait. Anything that
//! can sample a start state, step a state forward and explain an observation
//! can be planned over; the integration tests drive the planner with a toy
//! implementation.

use std::hash::Hash;

use rand::{Rng, rngs::StdRng};

/// Outcome of one simulated decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<S, O> {
    pub state: S,
    pub observation: O,
    pub reward: f64,
    pub terminal: bool,
}

/// Particle produced to explain an observation.
///
/// `consistent` is false when the replayed step does not reproduce the
/// observation; callers should discard the state and try again.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<S> {
    pub state: S,
    pub consistent: bool,
}

/// Visit count and running mean return of one action edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActionStats {
    pub visits: u32,
    pub value: f64,
}

impl ActionStats {
    /// Fold one more return into the running mean.
    pub fn record(&mut self, ret: f64) {
        self.visits += 1;
        self.value += (ret - self.value) / self.visits as f64;
    }
}

/// Forward model the planner searches over.
///
/// All randomness comes from the caller's generator so that a fixed seed
/// replays the same search.
pub trait Simulator {
    /// Latent state held by particles. Copied on every transition.
    type State: Clone;

    /// Discretised observation used to branch the search tree.
    type Observation: Clone + Eq + Hash;

    /// Size of the action menu; actions are indices in `0..num_actions()`.
    fn num_actions(&self) -> usize;

    /// Draw a particle for a fresh belief. May consult ground truth.
    fn sample_initial_state(&self, rng: &mut StdRng) -> Self::State;

    /// Advance `state` by one decision under `action`.
    fn simulate(
        &self,
        state: &Self::State,
        action: usize,
        depth: usize,
        rng: &mut StdRng,
    ) -> Step<Self::State, Self::Observation>;

    /// Produce a particle that explains `observation`, given the parent
    /// particle `prev`, the action taken from it and a simulated successor
    /// `current` that failed to reproduce the observation.
    fn transform(
        &self,
        prev: &Self::State,
        last_action: usize,
        current: &Self::State,
        observation: &Self::Observation,
        rng: &mut StdRng,
    ) -> Transformed<Self::State>;

    /// Action drawn from the rollout bias. Uniform unless overridden.
    fn sample_preferred_action(&self, _state: &Self::State, rng: &mut StdRng) -> usize {
        rng.random_range(0..self.num_actions())
    }

    /// Seed prior values for a new node's action edges. No prior by default.
    fn update_preferred_action_values(&self, _stats: &mut [ActionStats]) {}
}
