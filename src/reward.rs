//! Lane-keeping reward.
//!
//! A kernel maps the normalised lateral offset (or heading error) to a value
//! that peaks at the lane centre. Leaving the lane replaces the kernel with a
//! flat penalty, and an optional term charges for steering effort while the
//! vehicle is still inside the lane.

use std::{f64::consts::PI, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, vehicle::VehicleState};

/// Shape of the lane-centering term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardKernel {
    /// `centre · base^x`
    Exponential { base: f64 },
    /// `centre · (1 - x)`
    Linear,
    /// `centre · cos(min(x, 1) · π/2)`
    Cosine,
    /// `-centre · x`
    Distance,
}

impl RewardKernel {
    fn eval(&self, centre: f64, x: f64) -> f64 {
        match *self {
            RewardKernel::Exponential { base } => centre * base.powf(x),
            RewardKernel::Linear => centre * (1.0 - x),
            RewardKernel::Cosine => centre * (x.min(1.0) * PI / 2.0).cos(),
            RewardKernel::Distance => -centre * x,
        }
    }
}

impl fmt::Display for RewardKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewardKernel::Exponential { .. } => write!(f, "exponential"),
            RewardKernel::Linear => write!(f, "linear"),
            RewardKernel::Cosine => write!(f, "cosine"),
            RewardKernel::Distance => write!(f, "distance"),
        }
    }
}

impl FromStr for RewardKernel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "exponential" | "exp" => Ok(RewardKernel::Exponential { base: 0.01 }),
            "linear" => Ok(RewardKernel::Linear),
            "cosine" | "cos" => Ok(RewardKernel::Cosine),
            "distance" => Ok(RewardKernel::Distance),
            _ => Err(Error::UnknownVariant {
                kind: "reward kernel".to_string(),
                input: s.to_string(),
                expected: "exponential, linear, cosine, distance".to_string(),
            }),
        }
    }
}

/// Quantity the kernel is evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardSignal {
    /// `|2d/w|`
    #[default]
    Offset,
    /// `|heading error| / π`
    Heading,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    pub kernel: RewardKernel,
    pub signal: RewardSignal,
    /// Reward at the lane centre
    pub centre: f64,
    /// Flat reward once the vehicle is off the lane
    pub off_lane_penalty: f64,
    /// Offset ratio beyond which the vehicle counts as off the lane
    pub off_lane_ratio: f64,
    /// Weight of the `(1 - min(ratio, 1)) · a²` steering-effort penalty
    pub intensity_weight: Option<f64>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            kernel: RewardKernel::Exponential { base: 0.01 },
            signal: RewardSignal::Offset,
            centre: 1.0,
            off_lane_penalty: -10.0,
            off_lane_ratio: 1.0,
            intensity_weight: None,
        }
    }
}

impl RewardConfig {
    /// `reward = -centre · |2d/w|`, with no off-lane cliff before `ratio`.
    pub fn distance(off_lane_ratio: f64) -> Self {
        Self {
            kernel: RewardKernel::Distance,
            off_lane_ratio,
            ..Self::default()
        }
    }

    pub fn with_kernel(mut self, kernel: RewardKernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_signal(mut self, signal: RewardSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn with_intensity_weight(mut self, weight: f64) -> Self {
        self.intensity_weight = Some(weight);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let RewardKernel::Exponential { base } = self.kernel
            && !(base > 0.0 && base < 1.0)
        {
            return Err(Error::config(format!(
                "exponential reward base must lie in (0, 1), got {base}"
            )));
        }
        for (name, value) in [
            ("reward centre", self.centre),
            ("off-lane penalty", self.off_lane_penalty),
            ("off-lane ratio", self.off_lane_ratio),
        ] {
            if !value.is_finite() {
                return Err(Error::config(format!("{name} must be finite")));
            }
        }
        if self.centre <= 0.0 {
            return Err(Error::config("reward centre must be positive"));
        }
        if self.off_lane_ratio <= 0.0 {
            return Err(Error::config("off-lane ratio must be positive"));
        }
        if let Some(weight) = self.intensity_weight
            && !(weight.is_finite() && weight >= 0.0)
        {
            return Err(Error::config(format!(
                "intensity weight must be non-negative, got {weight}"
            )));
        }
        Ok(())
    }
}

/// Scores the configuration a step ends in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardModel {
    config: RewardConfig,
}

impl RewardModel {
    pub fn new(config: RewardConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RewardConfig {
        &self.config
    }

    /// Reward for ending a step in `vehicle` after the agent chose
    /// `agent_action`. Always finite.
    pub fn reward(&self, vehicle: &VehicleState, agent_action: f64) -> f64 {
        let c = &self.config;
        let ratio = vehicle.offset_ratio().abs();
        if ratio > c.off_lane_ratio {
            return c.off_lane_penalty;
        }
        let x = match c.signal {
            RewardSignal::Offset => ratio,
            RewardSignal::Heading => vehicle.heading_error().abs() / PI,
        };
        let mut reward = c.kernel.eval(c.centre, x);
        if let Some(weight) = c.intensity_weight {
            reward -= weight * (1.0 - ratio.min(1.0)) * agent_action * agent_action;
        }
        if reward.is_finite() {
            reward
        } else {
            c.off_lane_penalty
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_ratio(ratio: f64) -> VehicleState {
        VehicleState {
            lane_width: 4.0,
            to_middle: ratio * 2.0,
            ..VehicleState::default()
        }
    }

    #[test]
    fn test_exponential_peaks_at_centre() {
        let model = RewardModel::new(RewardConfig::default()).unwrap();
        assert!((model.reward(&at_ratio(0.0), 0.0) - 1.0).abs() < 1e-12);
        assert!((model.reward(&at_ratio(1.0), 0.0) - 0.01).abs() < 1e-12);
        assert!((model.reward(&at_ratio(-0.5), 0.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_every_kernel_decreases_with_offset() {
        for kernel in ["exponential", "linear", "cosine", "distance"] {
            let config = RewardConfig::default().with_kernel(kernel.parse().unwrap());
            let model = RewardModel::new(config).unwrap();
            let mut previous = f64::INFINITY;
            for step in 0..=30 {
                let reward = model.reward(&at_ratio(step as f64 * 0.05), 0.0);
                assert!(reward.is_finite());
                assert!(reward <= previous, "{kernel} at step {step}");
                previous = reward;
            }
        }
    }

    #[test]
    fn test_off_lane_is_penalised() {
        let model = RewardModel::new(RewardConfig::default()).unwrap();
        assert_eq!(model.reward(&at_ratio(1.2), 0.0), -10.0);
        let degenerate = VehicleState {
            lane_width: 0.0,
            to_middle: 1.0,
            ..VehicleState::default()
        };
        assert_eq!(model.reward(&degenerate, 0.0), -10.0);
    }

    #[test]
    fn test_distance_reward_is_negative_offset() {
        let model = RewardModel::new(RewardConfig::distance(1.0)).unwrap();
        let state = VehicleState {
            lane_width: 2.0,
            to_middle: 0.3,
            ..VehicleState::default()
        };
        assert!((model.reward(&state, 1.0) + 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_intensity_penalty_charges_effort_inside_lane() {
        let model =
            RewardModel::new(RewardConfig::default().with_intensity_weight(1.0)).unwrap();
        let calm = model.reward(&at_ratio(0.0), 0.0);
        let busy = model.reward(&at_ratio(0.0), 0.5);
        assert!((calm - busy - 0.25).abs() < 1e-12);
        // No effort charge at the lane edge.
        let edge = at_ratio(1.0);
        assert_eq!(model.reward(&edge, 0.0), model.reward(&edge, 1.0));
    }

    #[test]
    fn test_heading_signal() {
        let model =
            RewardModel::new(RewardConfig::default().with_signal(RewardSignal::Heading)).unwrap();
        let straight = VehicleState::default();
        let skewed = VehicleState {
            yaw: 0.3,
            ..VehicleState::default()
        };
        assert!(model.reward(&straight, 0.0) > model.reward(&skewed, 0.0));
    }

    #[test]
    fn test_invalid_config_and_unknown_kernel() {
        assert!(
            RewardModel::new(
                RewardConfig::default().with_kernel(RewardKernel::Exponential { base: 2.0 })
            )
            .is_err()
        );
        assert!(matches!(
            "quadratic".parse::<RewardKernel>(),
            Err(Error::UnknownVariant { .. })
        ));
    }
}
