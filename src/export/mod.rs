//! Telemetry file formats
//!
//! Decision records are exchanged as CSV with the experiment column layout,
//! so runs written by [`CsvTelemetryObserver`](crate::pipeline::CsvTelemetryObserver)
//! can be read back for analysis.

mod telemetry_csv;

pub use telemetry_csv::{read_records, write_records};
