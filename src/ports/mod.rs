//! Ports (trait boundaries) between the planning core and its collaborators.
//!
//! The core owns these traits; vehicle models, controllers, telemetry sinks
//! and test doubles implement them.

pub mod observer;
pub mod simulator;
pub mod vehicle;

pub use observer::EpisodeObserver;
pub use simulator::{ActionStats, Simulator, Step, Transformed};
pub use vehicle::{GroundTruth, LowLevelController, VehicleDynamics};
