//! Dependency injection container.
//!
//! The container owns the infrastructure choices (seed policy, vehicle model
//! override) and wires simulator, planner, environment and runner from an
//! [`ExperimentConfig`].

use rand::{SeedableRng, rngs::StdRng};

use super::config::ExperimentConfig;
use crate::{
    Result,
    pipeline::{Environment, ExperimentRunner},
    planner::Planner,
    simulator::DrivingSimulator,
    vehicle::{CruiseController, Dynamics, TruthCell},
};

/// Planner over the configured vehicle model.
pub type DrivingPlanner = Planner<DrivingSimulator<Dynamics, CruiseController, TruthCell>>;

/// Runner over the configured vehicle model.
pub type DrivingRunner = ExperimentRunner<Dynamics, CruiseController>;

/// Application with dependency injection.
///
/// # Examples
///
/// ## Production usage
///
/// ```
/// use pomdrive::app::{App, ExperimentConfig};
///
/// let app = App::new();
/// let config = ExperimentConfig::default().with_seed(42);
/// let runner = app.create_runner(&config)?;
/// # Ok::<(), pomdrive::Error>(())
/// ```
///
/// ## Testing with dependency injection
///
/// ```
/// use pomdrive::app::App;
/// use pomdrive::vehicle::{Dynamics, LateralDrift};
///
/// let app = App::for_testing()
///     .with_dynamics(Dynamics::LateralDrift(LateralDrift::new(0.1, 0.1)))
///     .with_default_seed(42)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct App {
    /// Vehicle model used instead of the one in each config
    dynamics: Option<Dynamics>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app with production defaults: the configured vehicle
    /// model and no default seed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    fn dynamics(&self, config: &ExperimentConfig) -> Dynamics {
        self.dynamics.unwrap_or(config.dynamics)
    }

    /// Generators for the planner and the environment. Both derive from
    /// one seed, so a seeded experiment replays exactly.
    fn generators(&self, config: &ExperimentConfig) -> (StdRng, StdRng) {
        match config.seed.or(self.default_seed) {
            Some(seed) => (
                StdRng::seed_from_u64(seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (
                StdRng::from_rng(&mut rand::rng()),
                StdRng::from_rng(&mut rand::rng()),
            ),
        }
    }

    fn create_simulator(
        &self,
        config: &ExperimentConfig,
        truth: TruthCell,
    ) -> Result<DrivingSimulator<Dynamics, CruiseController, TruthCell>> {
        DrivingSimulator::new(
            &config.simulator,
            self.dynamics(config),
            CruiseController::new(config.cruise),
            truth,
        )
    }

    /// Create a planner reading ground truth from `truth`.
    pub fn create_planner(
        &self,
        config: &ExperimentConfig,
        truth: TruthCell,
    ) -> Result<DrivingPlanner> {
        config.validate()?;
        let (rng, _) = self.generators(config);
        Planner::new(self.create_simulator(config, truth)?, config.planner.clone(), rng)
    }

    /// Wire a complete experiment: the real environment and the planner
    /// share one ground-truth cell.
    pub fn create_runner(&self, config: &ExperimentConfig) -> Result<DrivingRunner> {
        config.validate()?;
        let (planner_rng, environment_rng) = self.generators(config);
        let truth = TruthCell::new(config.start);

        let environment = Environment::new(
            self.create_simulator(config, truth.clone())?,
            truth.clone(),
            config.start,
            environment_rng,
        );
        let planner = Planner::new(
            self.create_simulator(config, truth)?,
            config.planner.clone(),
            planner_rng,
        )?;
        Ok(ExperimentRunner::new(config.runner(), planner, environment))
    }
}

/// Builder for constructing an app with custom dependencies.
#[derive(Debug, Clone, Default)]
pub struct AppBuilder {
    dynamics: Option<Dynamics>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a vehicle model for every experiment this app creates.
    pub fn with_dynamics(mut self, dynamics: Dynamics) -> Self {
        self.dynamics = Some(dynamics);
        self
    }

    /// Set a default random seed, used when a config carries none.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    pub fn build(self) -> App {
        App {
            dynamics: self.dynamics,
            default_seed: self.default_seed,
        }
    }
}
