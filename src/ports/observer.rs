//! Observer port for experiment telemetry.
//!
//! The experiment runner reports every real decision through this trait, so
//! progress display, CSV persistence and log output can be combined freely
//! without the runner knowing about any of them.

use crate::{
    Result,
    telemetry::{DecisionRecord, EpisodeSummary},
};

/// Receives experiment events.
///
/// # Event Sequence
///
/// 1. `on_experiment_start(runs, target_actions)`
/// 2. For each run:
///    - `on_episode_start(run)`
///    - `on_decision(record)` once per real decision
///    - `on_episode_end(summary)`
/// 3. `on_experiment_end()`
///
/// Every method defaults to doing nothing.
///
/// # Examples
///
/// ```
/// use pomdrive::{ports::EpisodeObserver, telemetry::EpisodeSummary};
///
/// struct TerminalCounter {
///     terminal_runs: usize,
/// }
///
/// impl EpisodeObserver for TerminalCounter {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> pomdrive::Result<()> {
///         if summary.terminal {
///             self.terminal_runs += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait EpisodeObserver: Send {
    fn on_experiment_start(&mut self, _runs: usize, _target_actions: u32) -> Result<()> {
        Ok(())
    }

    fn on_episode_start(&mut self, _run: usize) -> Result<()> {
        Ok(())
    }

    fn on_decision(&mut self, _record: &DecisionRecord) -> Result<()> {
        Ok(())
    }

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    fn on_experiment_end(&mut self) -> Result<()> {
        Ok(())
    }
}
