//! Command-line interface for running driving experiments
//!
//! Commands run single experiments or hyper-parameter grids, summarise
//! recorded telemetry and write starter configuration files.

pub mod commands;
pub mod config;
pub mod output;
