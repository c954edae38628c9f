//! Hyper-parameter grid over planner settings.

use serde::{Deserialize, Serialize};

use crate::{app::ExperimentConfig, pipeline::AgentKind};

/// Cartesian product of simulation budgets, exploration constants and
/// discount horizons, applied on top of a base configuration.
///
/// Scenarios are produced with the simulation count varying fastest, then
/// the exploration constant, then the horizon.
///
/// # Examples
///
/// ```
/// use pomdrive::app::ExperimentConfig;
/// use pomdrive::pipeline::GridSearch;
///
/// let grid = GridSearch::new(ExperimentConfig::default())
///     .with_simulations(vec![10, 100])
///     .with_exploration(vec![1.5])
///     .with_horizons(vec![5, 10]);
/// let names: Vec<_> = grid.scenarios().map(|c| c.name).collect();
/// assert_eq!(names, [
///     "planner_n10_c1.5_h5",
///     "planner_n100_c1.5_h5",
///     "planner_n10_c1.5_h10",
///     "planner_n100_c1.5_h10",
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearch {
    pub base: ExperimentConfig,
    pub simulations: Vec<u32>,
    pub exploration: Vec<f64>,
    pub horizons: Vec<u32>,
    /// Append one driver-only and one optimal run after the planner grid
    pub baselines: bool,
}

impl GridSearch {
    /// Grid with the reference scenario lists.
    pub fn new(base: ExperimentConfig) -> Self {
        Self {
            base,
            simulations: vec![
                10, 100, 200, 300, 400, 500, 750, 1000, 1500, 2500, 5000, 7500, 10000,
            ],
            exploration: vec![0.5, 0.75, 1.5, 5.0, 10.0, 25.0],
            horizons: vec![5, 10, 25],
            baselines: false,
        }
    }

    pub fn with_simulations(mut self, simulations: Vec<u32>) -> Self {
        self.simulations = simulations;
        self
    }

    pub fn with_exploration(mut self, exploration: Vec<f64>) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_horizons(mut self, horizons: Vec<u32>) -> Self {
        self.horizons = horizons;
        self
    }

    pub fn with_baselines(mut self, baselines: bool) -> Self {
        self.baselines = baselines;
        self
    }

    /// Number of scenarios [`scenarios`](Self::scenarios) yields.
    pub fn len(&self) -> usize {
        let planner = self.simulations.len() * self.exploration.len() * self.horizons.len();
        planner + if self.baselines { 2 } else { 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn planner_scenario(&self, simulations: u32, exploration: f64, horizon: u32) -> ExperimentConfig {
        let planner = self
            .base
            .planner
            .clone()
            .with_simulations(simulations)
            .with_exploration(exploration)
            .with_horizon(horizon);
        self.base
            .clone()
            .with_agent(AgentKind::Planner)
            .with_planner(planner)
            .with_name(format!("planner_n{simulations}_c{exploration}_h{horizon}"))
    }

    fn baseline(&self, agent: AgentKind) -> ExperimentConfig {
        self.base
            .clone()
            .with_agent(agent)
            .with_name(agent.to_string())
    }

    /// Every configuration of the grid, in run order.
    pub fn scenarios(&self) -> impl Iterator<Item = ExperimentConfig> + '_ {
        let planner = self.horizons.iter().flat_map(move |&horizon| {
            self.exploration.iter().flat_map(move |&exploration| {
                self.simulations
                    .iter()
                    .map(move |&simulations| self.planner_scenario(simulations, exploration, horizon))
            })
        });
        let baselines = self
            .baselines
            .then(|| [AgentKind::DriverOnly, AgentKind::Optimal].map(|agent| self.baseline(agent)))
            .into_iter()
            .flatten();
        planner.chain(baselines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_grid_size() {
        let grid = GridSearch::new(ExperimentConfig::default());
        assert_eq!(grid.len(), 13 * 6 * 3);
        assert_eq!(grid.scenarios().count(), grid.len());
    }

    #[test]
    fn test_simulations_vary_fastest() {
        let grid = GridSearch::new(ExperimentConfig::default())
            .with_simulations(vec![10, 20])
            .with_exploration(vec![0.5, 5.0])
            .with_horizons(vec![5]);
        let order: Vec<_> = grid
            .scenarios()
            .map(|c| (c.planner.budget, c.planner.exploration))
            .collect();
        use crate::planner::Budget::Simulations;
        assert_eq!(
            order,
            [
                (Simulations(10), 0.5),
                (Simulations(20), 0.5),
                (Simulations(10), 5.0),
                (Simulations(20), 5.0),
            ]
        );
    }

    #[test]
    fn test_horizon_sets_discount() {
        let grid = GridSearch::new(ExperimentConfig::default())
            .with_simulations(vec![10])
            .with_exploration(vec![1.5])
            .with_horizons(vec![10]);
        let config = grid.scenarios().next().unwrap();
        assert!((config.planner.discount.powi(9) - 0.1).abs() < 1e-12);
        assert_eq!(config.planner.depth_limit(), 10);
    }

    #[test]
    fn test_baselines_come_last() {
        let grid = GridSearch::new(ExperimentConfig::default())
            .with_simulations(vec![10])
            .with_exploration(vec![1.5])
            .with_horizons(vec![5])
            .with_baselines(true);
        let agents: Vec<_> = grid.scenarios().map(|c| c.agent).collect();
        assert_eq!(
            agents,
            [AgentKind::Planner, AgentKind::DriverOnly, AgentKind::Optimal]
        );
        assert_eq!(grid.len(), 3);
    }
}
