//! Observer implementations for experiment runs
//!
//! Observers collect data from the runner without coupling the decision loop
//! to any output format.

use std::{
    fs::File,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Error, Result,
    ports::EpisodeObserver,
    telemetry::{DecisionRecord, EpisodeSummary},
};

/// Progress bar over runs, with a running terminal/cheat tally
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    terminal_runs: usize,
    cheats: u32,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            terminal_runs: 0,
            cheats: 0,
        }
    }

    fn message(&self) -> String {
        format!("off-lane:{} cheats:{}", self.terminal_runs, self.cheats)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeObserver for ProgressObserver {
    fn on_experiment_start(&mut self, runs: usize, _target_actions: u32) -> Result<()> {
        let pb = ProgressBar::new(runs as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} runs ({msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        if summary.terminal {
            self.terminal_runs += 1;
        }
        self.cheats += summary.cheats;
        if let Some(pb) = &self.progress_bar {
            pb.set_position(summary.run as u64);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_experiment_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}

/// Tracks aggregate metrics across runs
#[derive(Debug, Default)]
pub struct MetricsObserver {
    rewards: Vec<f64>,
    decisions: Vec<u32>,
    terminal_runs: usize,
    cheat_decisions: u32,
    distracted_decisions: u32,
    total_decisions: u64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mean_reward(&self) -> f64 {
        if self.rewards.is_empty() {
            0.0
        } else {
            self.rewards.iter().sum::<f64>() / self.rewards.len() as f64
        }
    }

    pub fn mean_decisions(&self) -> f64 {
        if self.decisions.is_empty() {
            0.0
        } else {
            self.decisions.iter().map(|&d| d as f64).sum::<f64>() / self.decisions.len() as f64
        }
    }

    /// Share of real decisions taken while the driver was distracted
    pub fn distraction_rate(&self) -> f64 {
        if self.total_decisions == 0 {
            0.0
        } else {
            self.distracted_decisions as f64 / self.total_decisions as f64
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            runs: self.rewards.len(),
            terminal_runs: self.terminal_runs,
            cheat_decisions: self.cheat_decisions,
            total_decisions: self.total_decisions,
            mean_reward: self.mean_reward(),
            mean_decisions: self.mean_decisions(),
            distraction_rate: self.distraction_rate(),
        }
    }
}

/// Summary of experiment metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub runs: usize,
    pub terminal_runs: usize,
    pub cheat_decisions: u32,
    pub total_decisions: u64,
    pub mean_reward: f64,
    pub mean_decisions: f64,
    pub distraction_rate: f64,
}

impl EpisodeObserver for MetricsObserver {
    fn on_decision(&mut self, record: &DecisionRecord) -> Result<()> {
        self.total_decisions += 1;
        if record.cheat {
            self.cheat_decisions += 1;
        }
        if record.driver_distracted {
            self.distracted_decisions += 1;
        }
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.rewards.push(summary.cumulative_reward);
        self.decisions.push(summary.decisions);
        if summary.terminal {
            self.terminal_runs += 1;
        }
        Ok(())
    }
}

/// Writes every decision as one CSV row
pub struct CsvTelemetryObserver {
    writer: csv::Writer<File>,
}

impl CsvTelemetryObserver {
    /// Create the file at `path`, truncating any previous contents.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::io(format!("create {}", path.display()), e))?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
        })
    }
}

impl EpisodeObserver for CsvTelemetryObserver {
    fn on_decision(&mut self, record: &DecisionRecord) -> Result<()> {
        self.writer.serialize(record)?;
        Ok(())
    }

    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::io("flush telemetry", e))
    }

    fn on_experiment_end(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| Error::io("flush telemetry", e))
    }
}

/// Mirrors decisions into the tracing log
#[derive(Debug, Default)]
pub struct TracingObserver;

impl EpisodeObserver for TracingObserver {
    fn on_episode_start(&mut self, run: usize) -> Result<()> {
        info!(run, "run started");
        Ok(())
    }

    fn on_decision(&mut self, record: &DecisionRecord) -> Result<()> {
        debug!(
            run = record.run,
            step = record.step,
            cheat = record.cheat,
            agent = record.agent_action,
            driver = record.driver_action,
            to_middle = record.distance_to_middle,
            reward = record.cumulative_reward,
            "decision"
        );
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        info!(
            run = summary.run,
            decisions = summary.decisions,
            reward = summary.cumulative_reward,
            terminal = summary.terminal,
            cheats = summary.cheats,
            "run finished"
        );
        Ok(())
    }
}

/// Hands an observer to the runner while the caller keeps a handle to it,
/// so its state can be read once the experiment is over.
pub struct SharedObserver<O> {
    inner: Arc<Mutex<O>>,
}

impl<O: EpisodeObserver> SharedObserver<O> {
    /// Wrap `observer`, returning the runner side and the caller's handle.
    pub fn new(observer: O) -> (Self, Arc<Mutex<O>>) {
        let inner = Arc::new(Mutex::new(observer));
        (
            Self {
                inner: Arc::clone(&inner),
            },
            inner,
        )
    }

    fn lock(&self) -> MutexGuard<'_, O> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<O: EpisodeObserver> EpisodeObserver for SharedObserver<O> {
    fn on_experiment_start(&mut self, runs: usize, target_actions: u32) -> Result<()> {
        self.lock().on_experiment_start(runs, target_actions)
    }

    fn on_episode_start(&mut self, run: usize) -> Result<()> {
        self.lock().on_episode_start(run)
    }

    fn on_decision(&mut self, record: &DecisionRecord) -> Result<()> {
        self.lock().on_decision(record)
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.lock().on_episode_end(summary)
    }

    fn on_experiment_end(&mut self) -> Result<()> {
        self.lock().on_experiment_end()
    }
}
