//! Discretised observations.
//!
//! An [`Observation`] records several bins, but two observations compare
//! equal when the fields selected by their [`ObservationKey`] agree. The key
//! bounds the size of the observation alphabet and therefore the branching of
//! the search tree below every action.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    discretizer::{self, angle_ladder, offset_ladder, validate_sorted},
    vehicle::VehicleState,
};

/// Fields that take part in observation equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationKey {
    #[default]
    Angle,
    AngleOffset,
    AngleOffsetDriver,
    Full,
}

impl ObservationKey {
    fn uses_offset(self) -> bool {
        !matches!(self, ObservationKey::Angle)
    }

    fn uses_driver(self) -> bool {
        matches!(
            self,
            ObservationKey::AngleOffsetDriver | ObservationKey::Full
        )
    }

    fn uses_progress(self) -> bool {
        matches!(self, ObservationKey::Full)
    }
}

impl fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObservationKey::Angle => "angle",
            ObservationKey::AngleOffset => "angle-offset",
            ObservationKey::AngleOffsetDriver => "angle-offset-driver",
            ObservationKey::Full => "full",
        };
        f.write_str(name)
    }
}

impl FromStr for ObservationKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "angle" => Ok(ObservationKey::Angle),
            "angle-offset" => Ok(ObservationKey::AngleOffset),
            "angle-offset-driver" => Ok(ObservationKey::AngleOffsetDriver),
            "full" => Ok(ObservationKey::Full),
            _ => Err(Error::UnknownVariant {
                kind: "observation key".to_string(),
                input: s.to_string(),
                expected: "angle, angle-offset, angle-offset-driver, full".to_string(),
            }),
        }
    }
}

/// Bin ladders and equality key. Passed to every observation constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationConfig {
    /// Track-angle ladder [rad], sorted ascending
    pub angle_bins: Vec<f64>,
    /// Lateral-offset ladder in lane-half-width units, sorted ascending
    pub offset_bins: Vec<f64>,
    /// Bin width for distance along the lane [m]
    pub progress_bin: f64,
    pub key: ObservationKey,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            angle_bins: angle_ladder(41),
            offset_bins: offset_ladder(13),
            progress_bin: 0.05,
            key: ObservationKey::Angle,
        }
    }
}

impl ObservationConfig {
    pub fn with_angle_bins(mut self, count: usize) -> Self {
        self.angle_bins = angle_ladder(count);
        self
    }

    pub fn with_offset_bins(mut self, count: usize) -> Self {
        self.offset_bins = offset_ladder(count);
        self
    }

    pub fn with_key(mut self, key: ObservationKey) -> Self {
        self.key = key;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_sorted("angle ladder", &self.angle_bins)?;
        validate_sorted("offset ladder", &self.offset_bins)?;
        if !(self.progress_bin.is_finite() && self.progress_bin > 0.0) {
            return Err(Error::config(format!(
                "progress bin width must be positive, got {}",
                self.progress_bin
            )));
        }
        Ok(())
    }
}

/// What the planner sees after a decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Observation {
    /// Ceiling bin of the offset-corrected heading error; the ladder length
    /// means "above all bins"
    pub angle_bin: usize,
    /// Ceiling bin of the offset ratio; the ladder length means "above all bins"
    pub offset_bin: usize,
    /// Nearest driver-menu index of the driver's last action
    pub driver_action_bin: usize,
    /// Distance along the lane in bins
    pub progress_bin: i64,
    /// Decisions taken so far in the episode
    pub decision: u32,
    pub key: ObservationKey,
}

impl Observation {
    /// Discretise a vehicle configuration and the driver action that led to it.
    pub fn new(
        config: &ObservationConfig,
        vehicle: &VehicleState,
        driver_action: f64,
        driver_actions: &[f64],
        decision: u32,
    ) -> Self {
        let ladder = |bins: &[f64], value: f64| {
            discretizer::ceiling(bins, value).unwrap_or(bins.len())
        };
        let progress = vehicle.distance_from_start / config.progress_bin;
        Self {
            angle_bin: ladder(&config.angle_bins, vehicle.heading_error()),
            offset_bin: ladder(&config.offset_bins, vehicle.offset_ratio()),
            driver_action_bin: discretizer::nearest_index(driver_actions, driver_action)
                .unwrap_or(0),
            progress_bin: if progress.is_finite() {
                progress.round() as i64
            } else {
                0
            },
            decision,
            key: config.key,
        }
    }
}

impl PartialEq for Observation {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.angle_bin == other.angle_bin
            && (!self.key.uses_offset() || self.offset_bin == other.offset_bin)
            && (!self.key.uses_driver() || self.driver_action_bin == other.driver_action_bin)
            && (!self.key.uses_progress()
                || (self.progress_bin == other.progress_bin && self.decision == other.decision))
    }
}

impl Eq for Observation {}

impl Hash for Observation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.angle_bin.hash(state);
        if self.key.uses_offset() {
            self.offset_bin.hash(state);
        }
        if self.key.uses_driver() {
            self.driver_action_bin.hash(state);
        }
        if self.key.uses_progress() {
            self.progress_bin.hash(state);
            self.decision.hash(state);
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "angle#{} offset#{} driver#{} @{}",
            self.angle_bin, self.offset_bin, self.driver_action_bin, self.decision
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const DRIVER: [f64; 3] = [-0.5, 0.0, 0.5];

    fn observe(config: &ObservationConfig, track_yaw: f64, to_middle: f64, driver: f64) -> Observation {
        let vehicle = VehicleState {
            track_yaw,
            to_middle,
            lane_width: 4.0,
            ..VehicleState::default()
        };
        Observation::new(config, &vehicle, driver, &DRIVER, 3)
    }

    #[test]
    fn test_angle_key_ignores_other_fields() {
        let config = ObservationConfig::default();
        let a = observe(&config, 0.05, 0.0, -0.5);
        let b = observe(&config, 0.08, 0.1, 0.5);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));

        let c = observe(&config, 0.5, 0.0, -0.5);
        assert_ne!(a, c);
    }

    #[test]
    fn test_angle_bin_includes_lateral_offset() {
        let config = ObservationConfig::default();
        let centred = observe(&config, 0.0, 0.0, 0.0);
        // Ratio 0.9 shifts the heading error by -0.45 rad.
        let edge = observe(&config, 0.0, 1.8, 0.0);
        assert_ne!(centred, edge);
        assert!(edge.angle_bin < centred.angle_bin);
    }

    #[test]
    fn test_wider_keys_separate_observations() {
        let config = ObservationConfig::default().with_key(ObservationKey::AngleOffset);
        assert_ne!(observe(&config, 0.0, 0.0, 0.0), observe(&config, 0.0, 1.5, 0.0));
        assert_eq!(observe(&config, 0.0, 0.0, 0.5), observe(&config, 0.0, 0.0, -0.5));

        let config = config.with_key(ObservationKey::AngleOffsetDriver);
        assert_ne!(observe(&config, 0.0, 0.0, 0.5), observe(&config, 0.0, 0.0, -0.5));
    }

    #[test]
    fn test_off_lane_offset_overflows_ladder() {
        let config = ObservationConfig::default().with_key(ObservationKey::AngleOffset);
        // Ratio 1.5 lies beyond the outer bin.
        let obs = observe(&config, 0.0, 3.0, 0.0);
        assert_eq!(obs.offset_bin, config.offset_bins.len());
    }

    #[test]
    fn test_driver_action_snapped() {
        let config = ObservationConfig::default();
        assert_eq!(observe(&config, 0.0, 0.0, 0.3).driver_action_bin, 2);
        assert_eq!(observe(&config, 0.0, 0.0, -0.2).driver_action_bin, 1);
    }

    #[test]
    fn test_key_round_trips_through_strings() {
        for key in [
            ObservationKey::Angle,
            ObservationKey::AngleOffset,
            ObservationKey::AngleOffsetDriver,
            ObservationKey::Full,
        ] {
            assert_eq!(key.to_string().parse::<ObservationKey>().unwrap(), key);
        }
        assert!("heading".parse::<ObservationKey>().is_err());
    }
}
