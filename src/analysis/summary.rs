//! Per-experiment statistics over the final reward of each run.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{Error, Result, export, telemetry::DecisionRecord};

/// What one run ended with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run: usize,
    pub decisions: u32,
    /// Cumulative reward of the run's last row
    pub final_reward: f64,
    /// Decision at which the planner first fell back, if ever
    pub first_cheat: Option<u32>,
    pub terminal: bool,
}

/// Summary row of one telemetry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySummary {
    #[serde(rename = "Scenario")]
    pub scenario: String,
    #[serde(rename = "Runs")]
    pub runs: usize,
    #[serde(rename = "Average Reward")]
    pub mean_reward: f64,
    #[serde(rename = "Standard Deviation")]
    pub std_dev: f64,
    #[serde(rename = "Standard Error")]
    pub std_error: f64,
    #[serde(rename = "Min")]
    pub min: f64,
    #[serde(rename = "Max")]
    pub max: f64,
    /// Runs with at least one degenerate belief
    #[serde(rename = "Cheat")]
    pub cheat_runs: usize,
    #[serde(rename = "Terminal")]
    pub terminal_runs: usize,
}

impl TelemetrySummary {
    /// Fold decision records into one outcome per run, in run order.
    pub fn outcomes(records: &[DecisionRecord]) -> Vec<RunOutcome> {
        let mut runs: BTreeMap<usize, RunOutcome> = BTreeMap::new();
        for record in records {
            let outcome = runs.entry(record.run).or_insert(RunOutcome {
                run: record.run,
                decisions: 0,
                final_reward: 0.0,
                first_cheat: None,
                terminal: false,
            });
            outcome.decisions = outcome.decisions.max(record.step);
            outcome.final_reward = record.cumulative_reward;
            outcome.terminal |= record.terminal;
            if record.cheat && outcome.first_cheat.is_none() {
                outcome.first_cheat = Some(record.step);
            }
        }
        runs.into_values().collect()
    }

    /// Summarise decision records under the label `scenario`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyTelemetry`] when `records` is empty.
    pub fn from_records(scenario: impl Into<String>, records: &[DecisionRecord]) -> Result<Self> {
        let scenario = scenario.into();
        let outcomes = Self::outcomes(records);
        if outcomes.is_empty() {
            return Err(Error::EmptyTelemetry { path: scenario });
        }

        let rewards: Vec<f64> = outcomes.iter().map(|o| o.final_reward).collect();
        let n = rewards.len();
        let std_dev = if n > 1 {
            Statistics::std_dev(rewards.iter())
        } else {
            0.0
        };
        Ok(Self {
            scenario,
            runs: n,
            mean_reward: Statistics::mean(rewards.iter()),
            std_dev,
            std_error: std_dev / (n as f64).sqrt(),
            min: Statistics::min(rewards.iter()),
            max: Statistics::max(rewards.iter()),
            cheat_runs: outcomes.iter().filter(|o| o.first_cheat.is_some()).count(),
            terminal_runs: outcomes.iter().filter(|o| o.terminal).count(),
        })
    }

    /// Read and summarise a telemetry CSV. The file stem names the scenario.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let records = export::read_records(path)?;
        let scenario = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if records.is_empty() {
            return Err(Error::EmptyTelemetry {
                path: path.display().to_string(),
            });
        }
        Self::from_records(scenario, &records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(run: usize, step: u32, reward: f64, cheat: bool, terminal: bool) -> DecisionRecord {
        DecisionRecord {
            run,
            step,
            cheat,
            terminal,
            tree_size: 0,
            tree_depth: 0,
            speed: 0.0,
            angle: 0.0,
            cumulative_reward: reward,
            reward_gain: 0.0,
            distance_from_start: 0.0,
            distance_to_middle: 0.0,
            driver_distracted: false,
            sim_time: 0.0,
            actions_remaining: 0,
            optimal_action: 0.0,
            combined_action: 0.0,
            agent_action: 0.0,
            driver_action: 0.0,
        }
    }

    #[test]
    fn test_final_reward_per_run() {
        let records = vec![
            row(1, 1, -1.0, false, false),
            row(1, 2, -2.0, true, false),
            row(1, 3, -4.0, true, false),
            row(2, 1, -1.0, false, false),
            row(2, 2, -8.0, false, true),
            row(3, 1, 0.0, false, false),
        ];
        let outcomes = TelemetrySummary::outcomes(&records);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].first_cheat, Some(2));
        assert_eq!(outcomes[0].decisions, 3);
        assert!(outcomes[1].terminal);

        let summary = TelemetrySummary::from_records("demo", &records).unwrap();
        assert_eq!(summary.runs, 3);
        assert!((summary.mean_reward + 4.0).abs() < 1e-12);
        assert!((summary.std_dev - 4.0).abs() < 1e-12);
        assert!((summary.std_error - 4.0 / 3f64.sqrt()).abs() < 1e-12);
        assert_eq!(summary.min, -8.0);
        assert_eq!(summary.max, 0.0);
        assert_eq!(summary.cheat_runs, 1);
        assert_eq!(summary.terminal_runs, 1);
    }

    #[test]
    fn test_single_run_has_zero_spread() {
        let summary =
            TelemetrySummary::from_records("one", &[row(1, 1, -3.0, false, false)]).unwrap();
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.std_error, 0.0);
    }

    #[test]
    fn test_empty_telemetry_is_an_error() {
        assert!(matches!(
            TelemetrySummary::from_records("empty", &[]),
            Err(Error::EmptyTelemetry { .. })
        ));
    }

    #[test]
    fn test_from_csv_names_scenario_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("planner_n100.csv");
        export::write_records(&path, &[row(1, 1, -0.5, false, false)]).unwrap();
        let summary = TelemetrySummary::from_csv(&path).unwrap();
        assert_eq!(summary.scenario, "planner_n100");
        assert_eq!(summary.mean_reward, -0.5);
    }
}
