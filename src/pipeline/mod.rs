//! Experiment pipeline
//!
//! This module provides:
//! - The real environment and the runner that drives it against an agent
//! - Observers that record what happens during a run
//! - A grid over planner hyper-parameters

pub mod episode;
pub mod grid_search;
pub mod observers;

pub use episode::{
    AgentDecision, AgentKind, Environment, ExperimentResult, ExperimentRunner, RunnerConfig,
};
pub use grid_search::GridSearch;
pub use observers::{
    CsvTelemetryObserver, MetricsObserver, MetricsSummary, ProgressObserver, SharedObserver,
    TracingObserver,
};

pub use crate::ports::EpisodeObserver;
