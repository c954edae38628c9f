//! Two-mode model of the simulated human driver.
//!
//! The driver alternates between *attentive* and *distracted* episodes whose
//! lengths are counted in decisions. While attentive it steers against the
//! lane-centering heading error; while distracted it keeps applying whatever
//! it last computed. The mode, the countdown and the held action are hidden
//! from the planner and travel inside every particle as a [`DriverState`].

use rand::{Rng, prelude::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    discretizer::{self, validate_sorted},
    vehicle::VehicleState,
};

/// Inclusive range of episode lengths, in decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwellRange {
    pub min: u32,
    pub max: u32,
}

impl DwellRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// Draw a countdown uniformly in `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.random_range(self.min..=self.max)
    }

    fn validate(&self, mode: &str) -> Result<()> {
        if self.min == 0 {
            return Err(Error::config(format!(
                "{mode} dwell must last at least one decision"
            )));
        }
        if self.min > self.max {
            return Err(Error::config(format!(
                "{mode} dwell min {} exceeds max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Driver model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Length of attentive episodes
    pub attentive: DwellRange,
    /// Length of distracted episodes; `None` keeps the driver attentive forever
    pub distracted: Option<DwellRange>,
    /// Steering values the driver snaps its output to, sorted ascending
    pub actions: Vec<f64>,
    /// Gain applied to the attentive correction
    pub over_correction: Option<f64>,
    /// Amplitude of the multiplicative noise `1 + U(-a, a)`
    pub noise: Option<f64>,
    /// Start episodes attentive instead of in a random mode
    pub initial_attentive: bool,
    /// Snap every output to `actions`; otherwise only observations are snapped
    pub discrete_actions: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            attentive: DwellRange::new(10, 30),
            distracted: Some(DwellRange::new(5, 15)),
            actions: vec![-1.0, -0.5, -0.25, -0.1, 0.0, 0.1, 0.25, 0.5, 1.0],
            over_correction: None,
            noise: None,
            initial_attentive: true,
            discrete_actions: true,
        }
    }
}

impl DriverConfig {
    /// A driver that never gets distracted.
    pub fn always_attentive(actions: Vec<f64>) -> Self {
        Self {
            distracted: None,
            actions,
            ..Self::default()
        }
    }

    pub fn with_attentive(mut self, min: u32, max: u32) -> Self {
        self.attentive = DwellRange::new(min, max);
        self
    }

    pub fn with_distracted(mut self, min: u32, max: u32) -> Self {
        self.distracted = Some(DwellRange::new(min, max));
        self
    }

    pub fn with_over_correction(mut self, gain: f64) -> Self {
        self.over_correction = Some(gain);
        self
    }

    pub fn with_noise(mut self, amplitude: f64) -> Self {
        self.noise = Some(amplitude);
        self
    }

    pub fn with_initial_attentive(mut self, initial_attentive: bool) -> Self {
        self.initial_attentive = initial_attentive;
        self
    }

    pub fn with_discrete_actions(mut self, discrete: bool) -> Self {
        self.discrete_actions = discrete;
        self
    }

    /// Check that the parameters describe a usable model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`], [`Error::EmptyMenu`] or
    /// [`Error::UnsortedMenu`] for the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.attentive.validate("attentive")?;
        if let Some(distracted) = &self.distracted {
            distracted.validate("distracted")?;
        }
        validate_sorted("driver action menu", &self.actions)?;
        if let Some(gain) = self.over_correction
            && !(gain.is_finite() && gain > 0.0)
        {
            return Err(Error::config(format!(
                "driver over-correction must be positive, got {gain}"
            )));
        }
        if let Some(amplitude) = self.noise
            && !(0.0..1.0).contains(&amplitude)
        {
            return Err(Error::config(format!(
                "driver noise must lie in [0, 1), got {amplitude}"
            )));
        }
        Ok(())
    }
}

/// Hidden driver state carried by every particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    pub distracted: bool,
    /// Decisions left before the mode flips
    pub actions_remaining: u32,
    /// Last attentive output, held while distracted
    pub action: f64,
}

/// Stateless driver dynamics; all mutable state lives in [`DriverState`].
#[derive(Debug, Clone, PartialEq)]
pub struct DriverModel {
    config: DriverConfig,
}

impl DriverModel {
    /// Build a model from validated parameters.
    pub fn new(config: DriverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn actions(&self) -> &[f64] {
        &self.config.actions
    }

    /// Snap a steering value to the closest driver action.
    pub fn snap(&self, action: f64) -> f64 {
        discretizer::nearest(&self.config.actions, action).unwrap_or(0.0)
    }

    /// Index of the driver action closest to `action`.
    pub fn action_index(&self, action: f64) -> usize {
        discretizer::nearest_index(&self.config.actions, action).unwrap_or(0)
    }

    fn finish(&self, action: f64) -> f64 {
        let action = action.clamp(-1.0, 1.0);
        if self.config.discrete_actions {
            self.snap(action)
        } else {
            action
        }
    }

    fn perturb<R: Rng + ?Sized>(&self, action: f64, rng: &mut R) -> f64 {
        match self.config.noise {
            Some(amplitude) if amplitude > 0.0 => {
                action * (1.0 + rng.random_range(-amplitude..=amplitude))
            }
            _ => action,
        }
    }

    fn next_mode<R: Rng + ?Sized>(&self, state: &mut DriverState, rng: &mut R) {
        match &self.config.distracted {
            Some(distracted) if !state.distracted => {
                state.distracted = true;
                state.actions_remaining = distracted.sample(rng);
            }
            _ => {
                state.distracted = false;
                state.actions_remaining = self.config.attentive.sample(rng);
            }
        }
    }

    /// Advance the driver by one decision and return its steering output.
    ///
    /// The countdown is decremented first; reaching zero flips the mode and
    /// draws a fresh countdown for the new mode.
    pub fn update<R: Rng + ?Sized>(
        &self,
        state: &mut DriverState,
        vehicle: &VehicleState,
        rng: &mut R,
    ) -> f64 {
        state.actions_remaining = state.actions_remaining.saturating_sub(1);
        if state.actions_remaining == 0 {
            self.next_mode(state, rng);
        }

        if state.distracted {
            return self.finish(self.perturb(state.action, rng));
        }

        let mut action = vehicle.centering_steer();
        if let Some(gain) = self.config.over_correction {
            action *= gain;
        }
        action = self.finish(self.perturb(action, rng));
        state.action = action;
        action
    }

    fn sample_mode<R: Rng + ?Sized>(&self, rng: &mut R, initial: bool) -> (bool, u32) {
        let distracted = match &self.config.distracted {
            None => false,
            Some(_) if initial && self.config.initial_attentive => false,
            Some(_) => rng.random_bool(0.5),
        };
        let remaining = match (&self.config.distracted, distracted) {
            (Some(range), true) => range.sample(rng),
            _ => self.config.attentive.sample(rng),
        };
        (distracted, remaining)
    }

    /// Draw a fresh driver state for belief initialisation or reinvigoration.
    pub fn sample_state<R: Rng + ?Sized>(&self, rng: &mut R, initial: bool) -> DriverState {
        let (distracted, actions_remaining) = self.sample_mode(rng, initial);
        let action = self.config.actions.choose(rng).copied().unwrap_or(0.0);
        DriverState {
            distracted,
            actions_remaining,
            action,
        }
    }

    /// Draw a driver state whose held action is fixed to `action`.
    pub fn sample_state_with_action<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        action: f64,
    ) -> DriverState {
        let (distracted, actions_remaining) = self.sample_mode(rng, false);
        DriverState {
            distracted,
            actions_remaining,
            action: self.finish(action),
        }
    }
}
