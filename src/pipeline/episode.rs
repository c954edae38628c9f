//! Experiment harness: a real environment driven in lockstep with an agent.

use std::{fmt, path::Path, str::FromStr};

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Error, Result,
    discretizer,
    observation::Observation,
    planner::{Planner, TreeInfo},
    ports::{EpisodeObserver, LowLevelController, VehicleDynamics},
    simulator::{DrivingSimulator, State, Transition},
    telemetry::{DecisionRecord, EpisodeSummary},
    vehicle::{TruthCell, VehicleState},
};

/// Who steers on top of the simulated driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// POMCP corrections added to the driver's steering
    #[default]
    Planner,
    /// The driver alone; the agent always contributes zero
    DriverOnly,
    /// Lane-centering steer snapped to the agent menu, driver disengaged
    Optimal,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentKind::Planner => write!(f, "planner"),
            AgentKind::DriverOnly => write!(f, "driver"),
            AgentKind::Optimal => write!(f, "optimal"),
        }
    }
}

impl FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "planner" | "pomcp" => Ok(AgentKind::Planner),
            "driver" | "driver-only" | "driver_only" => Ok(AgentKind::DriverOnly),
            "optimal" => Ok(AgentKind::Optimal),
            _ => Err(Error::UnknownVariant {
                kind: "agent".to_string(),
                input: s.to_string(),
                expected: "planner, driver, optimal".to_string(),
            }),
        }
    }
}

/// The real world: its own copy of the vehicle model, driver and RNG.
///
/// Every real step is published to the shared [`TruthCell`], which is the
/// only channel through which the planner can see ground truth.
pub struct Environment<D, C> {
    simulator: DrivingSimulator<D, C, TruthCell>,
    truth: TruthCell,
    start: VehicleState,
    state: State,
    rng: StdRng,
}

impl<D, C> Environment<D, C>
where
    D: VehicleDynamics,
    C: LowLevelController,
{
    pub fn new(
        simulator: DrivingSimulator<D, C, TruthCell>,
        truth: TruthCell,
        start: VehicleState,
        rng: StdRng,
    ) -> Self {
        let mut rng = rng;
        let driver = simulator.driver().sample_state(&mut rng, true);
        truth.publish(start, 0);
        Self {
            simulator,
            truth,
            start,
            state: State::new(start, driver),
            rng,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn simulator(&self) -> &DrivingSimulator<D, C, TruthCell> {
        &self.simulator
    }

    /// Put the vehicle back on the start line with a freshly drawn driver.
    pub fn reset(&mut self) {
        let driver = self.simulator.driver().sample_state(&mut self.rng, true);
        self.state = State::new(self.start, driver);
        self.truth.publish(self.start, 0);
    }

    /// Lane-centering steer snapped to the agent menu.
    pub fn optimal_action(&self) -> f64 {
        let steer = self.state.vehicle.centering_steer();
        discretizer::nearest(self.simulator.actions(), steer)
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0)
    }

    fn commit(&mut self, transition: Transition) -> Transition {
        self.state = transition.state;
        self.truth.publish(self.state.vehicle, self.state.decisions);
        transition
    }

    /// One real decision with the driver engaged.
    pub fn step(&mut self, agent_action: f64) -> Transition {
        let transition = self.simulator.step(&self.state, agent_action, &mut self.rng);
        self.commit(transition)
    }

    /// One real decision steered only by `steer`.
    pub fn step_unassisted(&mut self, steer: f64) -> Transition {
        let transition =
            self.simulator
                .step_with_driver(&self.state, steer, 0.0, self.state.driver);
        self.commit(transition)
    }

    /// Drive with the raw lane-centering steer until `target_speed` is
    /// reached or `max_decisions` pass. The decision counter is left at zero.
    pub fn warm_up(&mut self, target_speed: f64, max_decisions: u32) -> u32 {
        let mut decisions = 0;
        while decisions < max_decisions && self.state.vehicle.speed < target_speed {
            let steer = self.state.vehicle.centering_steer();
            let transition =
                self.simulator
                    .step_with_driver(&self.state, steer, 0.0, self.state.driver);
            self.state.vehicle = transition.state.vehicle;
            decisions += 1;
        }
        self.truth.publish(self.state.vehicle, self.state.decisions);
        decisions
    }
}

/// Harness settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub agent: AgentKind,
    pub runs: usize,
    /// Decisions after which a run stops if it has not gone off the lane
    pub target_actions: u32,
    /// Maximum warm-up decisions before planning starts; `None` disables it
    pub warm_up: Option<u32>,
    /// Speed the warm-up drives to [m/s]
    pub warm_up_speed: f64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            agent: AgentKind::Planner,
            runs: 10,
            target_actions: 1000,
            warm_up: None,
            warm_up_speed: 13.9,
        }
    }
}

/// Action chosen for one real decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentDecision {
    pub index: usize,
    pub value: f64,
    pub cheat: bool,
    pub info: TreeInfo,
}

/// Aggregate of a finished experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    pub agent: AgentKind,
    pub runs: usize,
    pub total_decisions: u64,
    pub mean_reward: f64,
    pub terminal_runs: usize,
    pub cheat_runs: usize,
    pub episodes: Vec<EpisodeSummary>,
}

impl ExperimentResult {
    pub fn new(agent: AgentKind, episodes: Vec<EpisodeSummary>) -> Self {
        let runs = episodes.len();
        let mean_reward = if runs > 0 {
            episodes.iter().map(|e| e.cumulative_reward).sum::<f64>() / runs as f64
        } else {
            0.0
        };
        Self {
            agent,
            runs,
            total_decisions: episodes.iter().map(|e| e.decisions as u64).sum(),
            mean_reward,
            terminal_runs: episodes.iter().filter(|e| e.terminal).count(),
            cheat_runs: episodes.iter().filter(|e| e.cheats > 0).count(),
            episodes,
        }
    }

    /// Save result to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path)
            .map_err(|e| Error::io(format!("create {}", path.display()), e))?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| Error::io(format!("open {}", path.display()), e))?;
        Ok(serde_json::from_reader(file)?)
    }
}

/// Runs episodes of the real environment against an agent and reports every
/// decision to the registered observers.
pub struct ExperimentRunner<D: VehicleDynamics, C: LowLevelController> {
    config: RunnerConfig,
    planner: Planner<DrivingSimulator<D, C, TruthCell>>,
    environment: Environment<D, C>,
    observers: Vec<Box<dyn EpisodeObserver>>,
}

impl<D, C> ExperimentRunner<D, C>
where
    D: VehicleDynamics,
    C: LowLevelController,
{
    pub fn new(
        config: RunnerConfig,
        planner: Planner<DrivingSimulator<D, C, TruthCell>>,
        environment: Environment<D, C>,
    ) -> Self {
        Self {
            config,
            planner,
            environment,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the runner.
    pub fn with_observer(mut self, observer: Box<dyn EpisodeObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn planner(&self) -> &Planner<DrivingSimulator<D, C, TruthCell>> {
        &self.planner
    }

    pub fn environment(&self) -> &Environment<D, C> {
        &self.environment
    }

    /// Reset the world, optionally warm up, and give the planner a fresh
    /// belief sampled from the starting configuration.
    pub fn new_episode(&mut self) {
        self.environment.reset();
        if let Some(max) = self.config.warm_up {
            let decisions = self.environment.warm_up(self.config.warm_up_speed, max);
            debug!(decisions, "warm-up finished");
        }
        self.planner.new_episode();
    }

    /// Drop planner state and put the world back on the start line.
    pub fn reset(&mut self) {
        self.environment.reset();
        self.planner.reset();
    }

    /// Agent action for the current tick, committing the previous
    /// observation to the planner first.
    pub fn decide(&mut self, last: Option<(usize, Observation)>) -> AgentDecision {
        let simulator = self.environment.simulator();
        match self.config.agent {
            AgentKind::Planner => {
                let decision = self.planner.decide(last);
                AgentDecision {
                    index: decision.action,
                    value: simulator.actions()[decision.action],
                    cheat: decision.cheat,
                    info: decision.info,
                }
            }
            AgentKind::DriverOnly => AgentDecision {
                index: simulator.nearest_action(0.0),
                value: 0.0,
                cheat: false,
                info: TreeInfo::default(),
            },
            AgentKind::Optimal => {
                let value = self.environment.optimal_action();
                AgentDecision {
                    index: simulator.nearest_action(value),
                    value,
                    cheat: false,
                    info: TreeInfo::default(),
                }
            }
        }
    }

    fn notify<F>(&mut self, mut event: F) -> Result<()>
    where
        F: FnMut(&mut dyn EpisodeObserver) -> Result<()>,
    {
        for observer in &mut self.observers {
            event(observer.as_mut())?;
        }
        Ok(())
    }

    /// Play one run to a terminal state or the target decision count.
    pub fn run_episode(&mut self, run: usize) -> Result<EpisodeSummary> {
        self.new_episode();
        self.notify(|o| o.on_episode_start(run))?;

        let mut last = None;
        let mut cumulative_reward = 0.0;
        let mut cheats = 0;
        let mut decisions = 0;
        let mut terminal = false;

        while decisions < self.config.target_actions {
            let optimal_action = self.environment.optimal_action();
            let decision = self.decide(last.take());
            let transition = match self.config.agent {
                AgentKind::Optimal => self.environment.step_unassisted(decision.value),
                _ => self.environment.step(decision.value),
            };
            decisions += 1;
            cumulative_reward += transition.reward;
            if decision.cheat {
                cheats += 1;
            }
            terminal = transition.terminal;

            let vehicle = &transition.state.vehicle;
            let record = DecisionRecord {
                run,
                step: decisions,
                cheat: decision.cheat,
                terminal,
                tree_size: decision.info.size,
                tree_depth: decision.info.depth,
                speed: vehicle.speed,
                angle: vehicle.heading_error(),
                cumulative_reward,
                reward_gain: transition.reward,
                distance_from_start: vehicle.distance_from_start,
                distance_to_middle: vehicle.offset_ratio().abs(),
                driver_distracted: transition.state.driver.distracted,
                sim_time: vehicle.time,
                actions_remaining: transition.state.driver.actions_remaining,
                optimal_action,
                combined_action: transition.combined_action,
                agent_action: transition.agent_action,
                driver_action: transition.driver_action,
            };
            self.notify(|o| o.on_decision(&record))?;

            if terminal {
                info!(run, decisions, "terminal state reached");
                break;
            }
            last = Some((decision.index, transition.observation));
        }
        if !terminal {
            info!(run, decisions, "episode finished at target decision count");
        }

        let summary = EpisodeSummary {
            run,
            decisions,
            cumulative_reward,
            terminal,
            cheats,
        };
        self.notify(|o| o.on_episode_end(&summary))?;
        Ok(summary)
    }

    /// Run every configured episode.
    pub fn run(&mut self) -> Result<ExperimentResult> {
        let runs = self.config.runs;
        let target = self.config.target_actions;
        self.notify(|o| o.on_experiment_start(runs, target))?;
        info!(agent = %self.config.agent, runs, target, "experiment started");

        let mut episodes = Vec::with_capacity(runs);
        for run in 1..=runs {
            episodes.push(self.run_episode(run)?);
        }

        self.notify(|o| o.on_experiment_end())?;
        let result = ExperimentResult::new(self.config.agent, episodes);
        info!(
            mean_reward = result.mean_reward,
            terminal_runs = result.terminal_runs,
            cheat_runs = result.cheat_runs,
            "experiment finished"
        );
        Ok(result)
    }
}
