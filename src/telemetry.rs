//! Per-decision telemetry records.
//!
//! Column names match the established experiment CSV layout so existing
//! analysis scripts keep working.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One row per real decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(rename = "Run")]
    pub run: usize,
    #[serde(rename = "Count")]
    pub step: u32,
    #[serde(rename = "Cheat", with = "cheat_label")]
    pub cheat: bool,
    #[serde(rename = "Terminal")]
    pub terminal: bool,
    #[serde(rename = "Size")]
    pub tree_size: usize,
    #[serde(rename = "Depth")]
    pub tree_depth: usize,
    #[serde(rename = "Speed")]
    pub speed: f64,
    /// Offset-corrected heading error [rad]
    #[serde(rename = "Angle")]
    pub angle: f64,
    /// Sum of rewards so far in the run
    #[serde(rename = "Reward")]
    pub cumulative_reward: f64,
    #[serde(rename = "Gain")]
    pub reward_gain: f64,
    #[serde(rename = "From Start")]
    pub distance_from_start: f64,
    /// `|2d/w|`
    #[serde(rename = "To Middle")]
    pub distance_to_middle: f64,
    #[serde(rename = "Distracted")]
    pub driver_distracted: bool,
    #[serde(rename = "Time")]
    pub sim_time: f64,
    #[serde(rename = "Actions Remaining")]
    pub actions_remaining: u32,
    #[serde(rename = "Optimal")]
    pub optimal_action: f64,
    #[serde(rename = "Combined")]
    pub combined_action: f64,
    #[serde(rename = "Agent")]
    pub agent_action: f64,
    #[serde(rename = "Driver")]
    pub driver_action: f64,
}

/// Totals for one finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub run: usize,
    pub decisions: u32,
    pub cumulative_reward: f64,
    pub terminal: bool,
    pub cheats: u32,
}

/// `Cheat` is written as `cheat` / `fair`.
mod cheat_label {
    use super::*;

    pub fn serialize<S: Serializer>(cheat: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *cheat { "cheat" } else { "fair" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let label = String::deserialize(deserializer)?;
        match label.as_str() {
            "cheat" | "true" | "1" => Ok(true),
            "fair" | "false" | "0" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected 'cheat' or 'fair', got '{other}'"
            ))),
        }
    }
}
