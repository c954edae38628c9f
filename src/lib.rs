//! Online POMCP planning for driver-assisted lane keeping
//!
//! A human driver steers a car down a lane and occasionally stops paying
//! attention. An assistant adds small steering corrections on top of the
//! driver's input, planning online with Monte-Carlo tree search over a
//! particle belief of the driver's hidden attention state.
//!
//! This crate provides:
//! - The POMCP planner, generic over any [`ports::Simulator`]
//! - A generative driving simulator: driver model, vehicle dynamics,
//!   reward and observation discretisation
//! - An experiment harness with planner, driver-only and optimal agents
//! - Telemetry recording, summaries and a hyper-parameter grid search

pub mod analysis;
pub mod app;
pub mod cli;
pub mod discretizer;
pub mod driver;
pub mod error;
pub mod export;
pub mod observation;
pub mod pipeline;
pub mod planner;
pub mod ports;
pub mod reward;
pub mod simulator;
pub mod telemetry;
pub mod vehicle;

pub use error::{Error, Result};
