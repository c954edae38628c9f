use serde::{Deserialize, Serialize};

use super::VehicleState;
use crate::ports::LowLevelController;

/// Speed-keeping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CruiseConfig {
    /// Cruise speed [m/s]
    pub target_speed: f64,
    /// Below `target_speed - full_accel_margin` the throttle is wide open [m/s]
    pub full_accel_margin: f64,
    /// Throttle that holds speed near the target
    pub hold_throttle: f64,
    /// Width of one gear's speed band [m/s]
    pub gear_band: f64,
    /// Fraction of the band at which the controller shifts up
    pub shift: f64,
    /// Hysteresis before shifting down [m/s]
    pub shift_margin: f64,
    pub max_gear: i32,
}

impl Default for CruiseConfig {
    fn default() -> Self {
        Self {
            target_speed: 13.9,
            full_accel_margin: 1.0,
            hold_throttle: 0.2,
            gear_band: 8.0,
            shift: 0.9,
            shift_margin: 4.0,
            max_gear: 6,
        }
    }
}

/// Controller that accelerates to the cruise speed and holds it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CruiseController {
    config: CruiseConfig,
}

impl CruiseController {
    pub fn new(config: CruiseConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CruiseConfig {
        &self.config
    }

    /// Whether the vehicle has reached the cruise speed.
    pub fn at_speed(&self, state: &VehicleState) -> bool {
        state.speed >= self.config.target_speed
    }
}

impl LowLevelController for CruiseController {
    fn gear(&self, state: &VehicleState) -> i32 {
        let c = &self.config;
        if state.gear <= 0 {
            return 1;
        }
        let upshift_at = state.gear as f64 * c.gear_band * c.shift;
        if state.gear < c.max_gear && state.speed > upshift_at {
            return state.gear + 1;
        }
        if state.gear > 1 {
            let downshift_at = (state.gear - 1) as f64 * c.gear_band * c.shift;
            if state.speed + c.shift_margin < downshift_at {
                return state.gear - 1;
            }
        }
        state.gear
    }

    fn throttle(&self, state: &VehicleState) -> f64 {
        let c = &self.config;
        let deficit = c.target_speed - state.speed;
        if deficit > c.full_accel_margin {
            return 1.0;
        }
        let margin = c.full_accel_margin.max(f64::EPSILON);
        (c.hold_throttle + deficit / margin).clamp(0.0, 1.0)
    }

    fn brake(&self, state: &VehicleState) -> f64 {
        let c = &self.config;
        let excess = state.speed - c.target_speed;
        if excess <= 0.0 {
            return 0.0;
        }
        let margin = c.full_accel_margin.max(f64::EPSILON);
        (excess / margin).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(speed: f64, gear: i32) -> VehicleState {
        VehicleState {
            speed,
            gear,
            ..VehicleState::default()
        }
    }

    #[test]
    fn test_full_throttle_well_below_target() {
        let controller = CruiseController::default();
        assert_eq!(controller.throttle(&at(0.0, 1)), 1.0);
        assert_eq!(controller.brake(&at(0.0, 1)), 0.0);
    }

    #[test]
    fn test_brakes_above_target() {
        let controller = CruiseController::default();
        let state = at(15.4, 2);
        assert!((controller.brake(&state) - 1.0).abs() < 1e-12);
        assert!(controller.brake(&at(14.4, 2)) > 0.0);
        assert_eq!(controller.brake(&at(13.0, 2)), 0.0);
    }

    #[test]
    fn test_gear_shifts_with_speed() {
        let controller = CruiseController::default();
        assert_eq!(controller.gear(&at(0.0, 0)), 1);
        assert_eq!(controller.gear(&at(7.5, 1)), 2);
        assert_eq!(controller.gear(&at(5.0, 1)), 1);
        assert_eq!(controller.gear(&at(1.0, 3)), 2);
        assert_eq!(controller.gear(&at(100.0, 6)), 6);
    }
}
