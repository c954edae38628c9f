//! Physical vehicle configuration and fixed-step decision integration.
//!
//! [`VehicleState`] is a plain value: every particle owns its own copy and
//! nothing in it points into shared simulator memory. [`DecisionStepper`]
//! advances a state across one decision interval using a fixed number of
//! controller calls and integrator sub-steps, so rounding in the interval
//! lengths can never change how many sub-steps run.

mod controller;
mod kinematic;
mod lateral;
mod truth;

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

pub use controller::{CruiseConfig, CruiseController};
pub use kinematic::{KinematicBicycle, KinematicConfig};
pub use lateral::LateralDrift;
pub use truth::TruthCell;

use crate::{
    Error, Result,
    ports::{LowLevelController, VehicleDynamics},
};

/// Tolerance applied to the off-lane ratio before comparing it with a
/// threshold. Keeps accumulated sub-step rounding from hiding a boundary hit.
pub const RATIO_TOLERANCE: f64 = 1e-9;

/// Normalise an angle into `(-π, π]`.
pub fn normalize_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let mut wrapped = angle.rem_euclid(2.0 * PI);
    if wrapped > PI {
        wrapped -= 2.0 * PI;
    }
    wrapped
}

/// Steering command in `[-1, 1]` that turns the wheels by `angle` radians.
///
/// A steering lock of (almost) zero cannot be divided by; the command then
/// saturates in the direction of `angle`.
pub fn steer_for_angle(angle: f64, steer_lock: f64) -> f64 {
    if steer_lock.abs() < 1e-9 {
        return if angle > 0.0 {
            1.0
        } else if angle < 0.0 {
            -1.0
        } else {
            0.0
        };
    }
    (angle / steer_lock).clamp(-1.0, 1.0)
}

/// Snapshot of the physical vehicle and its position relative to the lane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    /// World x position [m]
    pub x: f64,
    /// World y position [m]
    pub y: f64,
    /// World heading [rad]
    pub yaw: f64,
    /// Longitudinal speed [m/s]
    pub speed: f64,
    /// Heading of the lane tangent at the vehicle [rad]
    pub track_yaw: f64,
    /// Signed lateral offset from the lane centre, positive to the left [m]
    pub to_middle: f64,
    /// Lane width [m]
    pub lane_width: f64,
    /// Distance travelled along the lane since the start line [m]
    pub distance_from_start: f64,
    /// Wheel angle at full steering command [rad]
    pub steer_lock: f64,
    /// Engaged gear
    pub gear: i32,
    /// Simulation time [s]
    pub time: f64,
    /// Last applied steering command in `[-1, 1]`
    pub steer: f64,
}

impl Default for VehicleState {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            yaw: 0.0,
            speed: 0.0,
            track_yaw: 0.0,
            to_middle: 0.0,
            lane_width: 5.0,
            distance_from_start: 0.0,
            steer_lock: 0.366,
            gear: 1,
            time: 0.0,
            steer: 0.0,
        }
    }
}

impl VehicleState {
    /// Angle between the lane tangent and the vehicle heading, in `(-π, π]`.
    pub fn track_angle(&self) -> f64 {
        normalize_angle(self.track_yaw - self.yaw)
    }

    /// Lane-centering heading error: the track angle corrected by the lateral
    /// offset so that a vehicle left of centre is steered back to the right.
    pub fn heading_error(&self) -> f64 {
        let correction = if self.lane_width > f64::EPSILON {
            self.to_middle / self.lane_width
        } else {
            0.0
        };
        self.track_angle() - correction
    }

    /// Signed lateral offset in lane-half-width units (`±1` is the lane edge).
    ///
    /// A degenerate lane width yields `±∞` for any non-zero offset, never NaN.
    pub fn offset_ratio(&self) -> f64 {
        if self.lane_width > f64::EPSILON {
            2.0 * self.to_middle / self.lane_width
        } else if self.to_middle == 0.0 {
            0.0
        } else {
            f64::INFINITY.copysign(self.to_middle)
        }
    }

    /// Whether the absolute offset ratio has reached `threshold`.
    pub fn is_beyond(&self, threshold: f64) -> bool {
        self.offset_ratio().abs() >= threshold - RATIO_TOLERANCE
    }

    /// Steering command that removes the lane-centering heading error.
    pub fn centering_steer(&self) -> f64 {
        steer_for_angle(self.heading_error(), self.steer_lock)
    }
}

/// Dynamics selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Dynamics {
    Kinematic(KinematicBicycle),
    LateralDrift(LateralDrift),
}

impl Default for Dynamics {
    fn default() -> Self {
        Dynamics::Kinematic(KinematicBicycle::default())
    }
}

impl VehicleDynamics for Dynamics {
    fn advance(&self, state: &VehicleState, control: &ControlCommand, dt: f64) -> VehicleState {
        match self {
            Dynamics::Kinematic(model) => model.advance(state, control, dt),
            Dynamics::LateralDrift(model) => model.advance(state, control, dt),
        }
    }
}

/// Command applied to the vehicle for one control period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlCommand {
    /// Steering in `[-1, 1]`
    pub steer: f64,
    /// Throttle in `[0, 1]`
    pub throttle: f64,
    /// Brake in `[0, 1]`
    pub brake: f64,
    /// Gear to engage
    pub gear: i32,
}

impl ControlCommand {
    /// Combine a steering command with the controller's speed outputs.
    ///
    /// Throttle is dropped whenever the controller brakes.
    pub fn with_controller<C>(controller: &C, state: &VehicleState, steer: f64) -> Self
    where
        C: LowLevelController + ?Sized,
    {
        let brake = controller.brake(state).clamp(0.0, 1.0);
        let throttle = if brake == 0.0 {
            controller.throttle(state).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            steer: steer.clamp(-1.0, 1.0),
            throttle,
            brake,
            gear: controller.gear(state),
        }
    }
}

/// Timing of one decision interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Time between two steering decisions [s]
    pub decision_interval: f64,
    /// Time between two low-level controller calls [s]
    pub control_period: f64,
    /// Integrator sub-step [s]
    pub sub_step: f64,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            decision_interval: 0.1,
            control_period: 0.02,
            sub_step: 0.002,
        }
    }
}

impl IntegrationConfig {
    /// Number of controller calls per decision and integrator sub-steps per
    /// controller call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] when any duration is not
    /// positive and finite, or when a ratio rounds to zero steps.
    pub fn step_counts(&self) -> Result<(u32, u32)> {
        for (name, value) in [
            ("decision_interval", self.decision_interval),
            ("control_period", self.control_period),
            ("sub_step", self.sub_step),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::config(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        let calls = (self.decision_interval / self.control_period).round();
        let sub_steps = (self.control_period / self.sub_step).round();
        if calls < 1.0 || sub_steps < 1.0 {
            return Err(Error::config(format!(
                "decision_interval {} / control_period {} / sub_step {} must each divide into at least one step",
                self.decision_interval, self.control_period, self.sub_step
            )));
        }
        Ok((calls as u32, sub_steps as u32))
    }
}

/// Advances a vehicle across one decision interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionStepper {
    control_calls: u32,
    sub_steps: u32,
    sub_step: f64,
}

impl DecisionStepper {
    /// Build a stepper from validated timing.
    pub fn new(config: &IntegrationConfig) -> Result<Self> {
        let (control_calls, sub_steps) = config.step_counts()?;
        Ok(Self {
            control_calls,
            sub_steps,
            sub_step: config.sub_step,
        })
    }

    /// Total integrator sub-steps per decision.
    pub fn total_sub_steps(&self) -> u32 {
        self.control_calls * self.sub_steps
    }

    /// Duration of one decision as actually integrated.
    pub fn interval(&self) -> f64 {
        self.total_sub_steps() as f64 * self.sub_step
    }

    /// Integrate one decision interval holding `steer` fixed.
    pub fn step<D, C>(
        &self,
        dynamics: &D,
        controller: &C,
        state: &VehicleState,
        steer: f64,
    ) -> VehicleState
    where
        D: VehicleDynamics + ?Sized,
        C: LowLevelController + ?Sized,
    {
        let start_time = state.time;
        let mut next = *state;
        let mut elapsed_steps = 0u32;
        for _ in 0..self.control_calls {
            let command = ControlCommand::with_controller(controller, &next, steer);
            for _ in 0..self.sub_steps {
                next = dynamics.advance(&next, &command, self.sub_step);
                elapsed_steps += 1;
                next.time = start_time + elapsed_steps as f64 * self.sub_step;
            }
            next.steer = command.steer;
            next.gear = command.gear;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle_wraps_into_range() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-12);
        assert!((normalize_angle(-PI / 2.0) + PI / 2.0).abs() < 1e-12);
        assert!((normalize_angle(2.0 * PI + 0.1) - 0.1).abs() < 1e-12);
        assert_eq!(normalize_angle(f64::NAN), 0.0);
    }

    #[test]
    fn test_steer_guarded_against_zero_lock() {
        assert_eq!(steer_for_angle(0.2, 0.0), 1.0);
        assert_eq!(steer_for_angle(-0.2, 0.0), -1.0);
        assert_eq!(steer_for_angle(0.0, 0.0), 0.0);
        assert!((steer_for_angle(0.1, 0.5) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_offset_ratio_and_terminal_threshold() {
        let lane_width = 4.0;
        let mut state = VehicleState {
            lane_width,
            ..VehicleState::default()
        };
        // |2d/w| = 1.06
        state.to_middle = 1.06 * lane_width / 2.0;
        assert!(state.is_beyond(1.05));
        // |2d/w| = 1.00
        state.to_middle = -lane_width / 2.0;
        assert!(!state.is_beyond(1.05));
        assert!((state.offset_ratio() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_lane_width_never_nan() {
        let state = VehicleState {
            lane_width: 0.0,
            to_middle: -0.5,
            ..VehicleState::default()
        };
        assert_eq!(state.offset_ratio(), f64::NEG_INFINITY);
        assert!(state.heading_error().is_finite());
        assert!(state.is_beyond(1.05));
    }

    #[test]
    fn test_step_counts_are_fixed() {
        let config = IntegrationConfig::default();
        assert_eq!(config.step_counts().unwrap(), (5, 10));

        let stepper = DecisionStepper::new(&config).unwrap();
        assert_eq!(stepper.total_sub_steps(), 50);
        assert!((stepper.interval() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_timing_rejected() {
        let config = IntegrationConfig {
            sub_step: 0.0,
            ..IntegrationConfig::default()
        };
        assert!(config.step_counts().is_err());

        let config = IntegrationConfig {
            control_period: 1.0,
            ..IntegrationConfig::default()
        };
        assert!(config.step_counts().is_err());
    }

    #[test]
    fn test_stepper_advances_time_exactly() {
        let stepper = DecisionStepper::new(&IntegrationConfig::default()).unwrap();
        let dynamics = LateralDrift::new(0.1, 0.1);
        let controller = CruiseController::default();
        let mut state = VehicleState::default();
        for _ in 0..1000 {
            state = stepper.step(&dynamics, &controller, &state, 0.0);
        }
        assert!((state.time - 100.0).abs() < 1e-9);
    }
}
