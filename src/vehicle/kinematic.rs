use serde::{Deserialize, Serialize};

use super::{ControlCommand, VehicleState, normalize_angle};
use crate::ports::VehicleDynamics;

/// Kinematic bicycle parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KinematicConfig {
    /// Distance between the axles [m]
    pub wheelbase: f64,
    /// Acceleration at full throttle [m/s²]
    pub max_acceleration: f64,
    /// Deceleration at full brake [m/s²]
    pub max_braking: f64,
    /// Linear drag coefficient [1/s]
    pub drag: f64,
    /// Lane curvature, positive turning left [1/m]
    pub curvature: f64,
}

impl Default for KinematicConfig {
    fn default() -> Self {
        Self {
            wheelbase: 2.6,
            max_acceleration: 4.0,
            max_braking: 9.0,
            drag: 0.05,
            curvature: 0.0,
        }
    }
}

/// Kinematic bicycle integrated in the Frenet frame of a constant-curvature
/// lane.
///
/// Semi-implicit Euler: speed is updated first and the new speed drives the
/// pose update.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KinematicBicycle {
    config: KinematicConfig,
}

impl KinematicBicycle {
    pub fn new(config: KinematicConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KinematicConfig {
        &self.config
    }
}

impl VehicleDynamics for KinematicBicycle {
    fn advance(&self, state: &VehicleState, control: &ControlCommand, dt: f64) -> VehicleState {
        let c = &self.config;
        let mut next = *state;

        let accel = control.throttle * c.max_acceleration
            - control.brake * c.max_braking
            - c.drag * state.speed;
        next.speed = (state.speed + accel * dt).max(0.0);

        let wheel_angle = control.steer.clamp(-1.0, 1.0) * state.steer_lock;
        let yaw_rate = next.speed * wheel_angle.tan() / c.wheelbase.max(f64::EPSILON);
        let heading = normalize_angle(state.yaw - state.track_yaw);

        // Offsets far inside a tight curve would make the scale blow up.
        let scale = (1.0 - c.curvature * state.to_middle).max(0.1);
        let progress_rate = next.speed * heading.cos() / scale;

        next.to_middle += next.speed * heading.sin() * dt;
        next.distance_from_start += progress_rate * dt;
        next.track_yaw = normalize_angle(state.track_yaw + c.curvature * progress_rate * dt);
        next.yaw = normalize_angle(state.yaw + yaw_rate * dt);
        next.x += next.speed * state.yaw.cos() * dt;
        next.y += next.speed * state.yaw.sin() * dt;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cruising() -> VehicleState {
        VehicleState {
            speed: 10.0,
            ..VehicleState::default()
        }
    }

    #[test]
    fn test_straight_line_keeps_offset() {
        let bicycle = KinematicBicycle::default();
        let command = ControlCommand::default();
        let mut state = cruising();
        for _ in 0..500 {
            state = bicycle.advance(&state, &command, 0.002);
        }
        assert!(state.to_middle.abs() < 1e-12);
        assert!(state.distance_from_start > 9.0);
    }

    #[test]
    fn test_left_steer_moves_left() {
        let bicycle = KinematicBicycle::default();
        let command = ControlCommand {
            steer: 0.5,
            ..ControlCommand::default()
        };
        let mut state = cruising();
        for _ in 0..500 {
            state = bicycle.advance(&state, &command, 0.002);
        }
        assert!(state.yaw > 0.0);
        assert!(state.to_middle > 0.0);
        assert!(state.heading_error() < 0.0);
    }

    #[test]
    fn test_braking_never_reverses() {
        let bicycle = KinematicBicycle::default();
        let command = ControlCommand {
            brake: 1.0,
            ..ControlCommand::default()
        };
        let mut state = cruising();
        for _ in 0..2000 {
            state = bicycle.advance(&state, &command, 0.002);
        }
        assert_eq!(state.speed, 0.0);
    }

    #[test]
    fn test_curved_lane_without_steer_drifts_outward() {
        let bicycle = KinematicBicycle::new(KinematicConfig {
            curvature: 0.01,
            ..KinematicConfig::default()
        });
        let command = ControlCommand::default();
        let mut state = cruising();
        for _ in 0..500 {
            state = bicycle.advance(&state, &command, 0.002);
        }
        // Lane turns left under a straight-driving car.
        assert!(state.to_middle < 0.0);
    }
}
