use serde::{Deserialize, Serialize};

use super::{ControlCommand, VehicleState};
use crate::ports::VehicleDynamics;

/// Synthetic dynamics that only move the vehicle sideways.
///
/// Holding a steering command `s` for one full decision interval shifts the
/// lateral offset by `gain_per_decision * s` metres. Heading, speed and
/// position along the lane are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LateralDrift {
    rate: f64,
}

impl LateralDrift {
    /// Offset change of `gain_per_decision` per unit steer over a decision of
    /// `decision_interval` seconds.
    pub fn new(gain_per_decision: f64, decision_interval: f64) -> Self {
        let rate = if decision_interval > 0.0 {
            gain_per_decision / decision_interval
        } else {
            0.0
        };
        Self { rate }
    }

    /// Lateral speed per unit steer [m/s].
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl VehicleDynamics for LateralDrift {
    fn advance(&self, state: &VehicleState, control: &ControlCommand, dt: f64) -> VehicleState {
        let mut next = *state;
        next.to_middle += self.rate * control.steer * dt;
        next
    }
}
