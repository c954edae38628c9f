//! Analysis of recorded experiment telemetry

pub mod summary;

pub use summary::{RunOutcome, TelemetrySummary};
