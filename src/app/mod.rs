//! Application layer with dependency injection container.
//!
//! The container owns the infrastructure choices and wires the domain objects
//! of one experiment together, following the ports and adapters layout of the
//! crate.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │            Application Layer (app)           │
//! │   App ── ExperimentConfig                    │
//! │    │ wires                                   │
//! │    ▼                                         │
//! │   ExperimentRunner ─┬─ Environment           │
//! │                     └─ Planner               │
//! │                          │ searches over     │
//! │                          ▼                   │
//! │   Ports: Simulator, VehicleDynamics,         │
//! │          LowLevelController, GroundTruth     │
//! │                          ▲ implemented by    │
//! │   DrivingSimulator, KinematicBicycle,        │
//! │   LateralDrift, CruiseController, TruthCell  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use pomdrive::app::{App, ExperimentConfig};
//!
//! let app = App::for_testing().with_default_seed(42).build();
//! let config = ExperimentConfig::default().with_runs(1).with_target_actions(2);
//! let runner = app.create_runner(&config)?;
//! # Ok::<(), pomdrive::Error>(())
//! ```

pub mod config;
pub mod container;

pub use config::ExperimentConfig;
pub use container::{App, AppBuilder, DrivingPlanner, DrivingRunner};
