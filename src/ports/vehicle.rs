//! Vehicle collaborator ports.
//!
//! The physics integrator, the privileged ground-truth reader and the
//! low-level speed controller live outside the planning core. These traits
//! are the only way the core talks to them.

use crate::vehicle::{ControlCommand, VehicleState};

/// Vehicle-dynamics integrator.
///
/// Implementations must be deterministic: identical inputs produce an
/// identical output state. The simulator calls `advance` many times per
/// decision with a fixed sub-step duration.
///
/// # Examples
///
/// ```
/// use pomdrive::{
///     ports::VehicleDynamics,
///     vehicle::{ControlCommand, VehicleState},
/// };
///
/// /// Rolls straight ahead at constant speed.
/// struct Coast;
///
/// impl VehicleDynamics for Coast {
///     fn advance(&self, state: &VehicleState, _: &ControlCommand, dt: f64) -> VehicleState {
///         let mut next = *state;
///         next.distance_from_start += state.speed * dt;
///         next
///     }
/// }
/// ```
pub trait VehicleDynamics {
    /// Integrate `state` forward by `dt` seconds under `control`.
    fn advance(&self, state: &VehicleState, control: &ControlCommand, dt: f64) -> VehicleState;
}

/// Privileged read access to the real environment.
///
/// Only consulted when sampling the initial belief of an episode and when the
/// planner resynchronises after a degenerate belief.
pub trait GroundTruth {
    /// Snapshot of the real vehicle configuration.
    fn read_ground_truth(&self) -> VehicleState;

    /// Real decisions taken so far in the episode.
    fn read_decisions(&self) -> u32 {
        0
    }
}

/// Low-level speed and gear controller.
///
/// Invoked on every control period of every simulated and every real step,
/// independently of the steering decision.
pub trait LowLevelController {
    /// Gear to engage.
    fn gear(&self, state: &VehicleState) -> i32;

    /// Throttle command in `[0, 1]`.
    fn throttle(&self, state: &VehicleState) -> f64;

    /// Brake command in `[0, 1]`.
    fn brake(&self, state: &VehicleState) -> f64;
}
