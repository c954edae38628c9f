//! Planner parameters.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How much search runs per decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    /// Fixed number of simulated trajectories
    Simulations(u32),
    /// Wall-clock limit in milliseconds; at least one trajectory always runs
    DeadlineMillis(u64),
}

impl Budget {
    pub fn deadline(&self) -> Option<Duration> {
        match *self {
            Budget::DeadlineMillis(ms) => Some(Duration::from_millis(ms)),
            Budget::Simulations(_) => None,
        }
    }
}

/// Policy used past the edge of the tree, or after a degenerate belief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPolicy {
    #[default]
    Uniform,
    /// Biased draw from [`Simulator::sample_preferred_action`](crate::ports::Simulator::sample_preferred_action)
    Preferred,
}

impl fmt::Display for ActionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPolicy::Uniform => write!(f, "uniform"),
            ActionPolicy::Preferred => write!(f, "preferred"),
        }
    }
}

impl FromStr for ActionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "uniform" | "random" => Ok(ActionPolicy::Uniform),
            "preferred" | "biased" => Ok(ActionPolicy::Preferred),
            _ => Err(Error::UnknownVariant {
                kind: "action policy".to_string(),
                input: s.to_string(),
                expected: "uniform, preferred".to_string(),
            }),
        }
    }
}

/// Discount that decays to `threshold` after `horizon - 1` steps.
///
/// # Examples
///
/// ```
/// use pomdrive::planner::discount_for_horizon;
///
/// let gamma = discount_for_horizon(0.1, 5);
/// assert!((gamma.powi(4) - 0.1).abs() < 1e-12);
/// assert_eq!(discount_for_horizon(0.1, 1), 1.0);
/// ```
pub fn discount_for_horizon(threshold: f64, horizon: u32) -> f64 {
    if horizon < 2 {
        return 1.0;
    }
    threshold.powf(1.0 / (horizon - 1) as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub budget: Budget,
    /// UCB1 exploration constant `c` in `mean + c·sqrt(ln N / n)`
    pub exploration: f64,
    /// Per-step discount γ in (0, 1]
    pub discount: f64,
    /// Trajectories stop once γ^depth falls below this weight
    pub discount_threshold: f64,
    /// Hard cap on trajectory depth
    pub max_depth: usize,
    /// Target (and maximum) particle count per node
    pub particles: usize,
    /// Reinvigoration quota is `particles / reinvigoration_divisor`
    pub reinvigoration_divisor: usize,
    /// Transform attempts per missing particle
    pub transform_attempt_factor: usize,
    pub rollout: ActionPolicy,
    /// Action returned after a degenerate belief
    pub fallback: ActionPolicy,
    /// Seed new edges with simulator priors worth this many visits
    pub prior_visits: Option<u32>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            budget: Budget::Simulations(1000),
            exploration: 1.5,
            discount: discount_for_horizon(0.1, 5),
            discount_threshold: 0.1,
            max_depth: 100,
            particles: 1000,
            reinvigoration_divisor: 16,
            transform_attempt_factor: 10,
            rollout: ActionPolicy::Uniform,
            fallback: ActionPolicy::Uniform,
            prior_visits: None,
        }
    }
}

impl PlannerConfig {
    pub fn with_simulations(mut self, simulations: u32) -> Self {
        self.budget = Budget::Simulations(simulations);
        self
    }

    /// Plan against a wall-clock deadline, rounded up to whole milliseconds.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        let millis = deadline.as_nanos().div_ceil(1_000_000);
        self.budget = Budget::DeadlineMillis(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn with_exploration(mut self, exploration: f64) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    /// Set the discount from a horizon, see [`discount_for_horizon`].
    pub fn with_horizon(mut self, horizon: u32) -> Self {
        self.discount = discount_for_horizon(self.discount_threshold, horizon);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_particles(mut self, particles: usize) -> Self {
        self.particles = particles;
        self
    }

    pub fn with_rollout(mut self, rollout: ActionPolicy) -> Self {
        self.rollout = rollout;
        self
    }

    pub fn with_fallback(mut self, fallback: ActionPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_prior_visits(mut self, visits: u32) -> Self {
        self.prior_visits = Some(visits);
        self
    }

    /// Particles a node must hold before the planner descends into it
    /// without reinvigoration.
    pub fn quota(&self) -> usize {
        (self.particles / self.reinvigoration_divisor.max(1)).max(1)
    }

    /// Deepest level a trajectory reaches: the first depth whose discount
    /// weight drops below the threshold, capped by `max_depth`.
    pub fn depth_limit(&self) -> usize {
        let mut depth = 0;
        let mut weight = 1.0;
        while depth < self.max_depth && weight >= self.discount_threshold - 1e-12 {
            weight *= self.discount;
            depth += 1;
        }
        depth.max(1)
    }

    pub fn validate(&self) -> Result<()> {
        match self.budget {
            Budget::Simulations(0) => {
                return Err(Error::config("simulation budget must be positive"));
            }
            Budget::DeadlineMillis(0) => {
                return Err(Error::config("planning deadline must be positive"));
            }
            _ => {}
        }
        if !(self.exploration.is_finite() && self.exploration >= 0.0) {
            return Err(Error::config(format!(
                "exploration constant must be non-negative, got {}",
                self.exploration
            )));
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(Error::config(format!(
                "discount must lie in (0, 1], got {}",
                self.discount
            )));
        }
        if !(self.discount_threshold > 0.0 && self.discount_threshold < 1.0) {
            return Err(Error::config(format!(
                "discount threshold must lie in (0, 1), got {}",
                self.discount_threshold
            )));
        }
        if self.max_depth == 0 {
            return Err(Error::config("max depth must be positive"));
        }
        if self.particles == 0 {
            return Err(Error::config("particle count must be positive"));
        }
        if self.reinvigoration_divisor == 0 || self.transform_attempt_factor == 0 {
            return Err(Error::config(
                "reinvigoration divisor and transform attempt factor must be positive",
            ));
        }
        Ok(())
    }
}
