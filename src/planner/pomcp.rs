//! Partially observable Monte-Carlo planning.
//!
//! Each decision runs a budget of simulated trajectories from particles of
//! the root belief. Inside the tree actions are chosen by UCB1; past the
//! frontier a rollout policy takes over. Returns are discounted and folded
//! into running means along the visited path.
//!
//! After the real action executes, [`Planner::move_to`] descends into the
//! child that matches the real observation and discards everything else. A
//! child short of particles is topped up from its parent's belief; a missing
//! child means the belief cannot explain reality, and the planner
//! resynchronises from ground truth and reports a *cheat*.

use std::time::Instant;

use rand::{Rng, rngs::StdRng};
use tracing::{debug, trace, warn};

use super::{
    belief::Belief,
    config::{ActionPolicy, Budget, PlannerConfig},
    tree::{Node, NodeId, Tree},
};
use crate::{
    Error, Result,
    ports::{ActionStats, Simulator},
};

/// Lifecycle of one real decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerPhase {
    /// Waiting for the next decision
    Idle,
    /// Running simulated trajectories
    Planning,
    /// Search finished; the best action is available
    ActionReady,
    /// Descended into the child matching the real observation
    Committed,
    /// Belief was degenerate and has been rebuilt from ground truth
    Cheated,
}

/// Tree diagnostics. Reading them never changes planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeInfo {
    pub size: usize,
    pub depth: usize,
}

/// Result of committing a real action and observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    /// No child matched; the belief was rebuilt from ground truth
    pub cheat: bool,
    /// Particles added by reinvigoration
    pub reinvigorated: usize,
    /// Particles in the new root
    pub particles: usize,
}

/// What the planner decided for one real tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: usize,
    /// The action came from the fallback policy
    pub cheat: bool,
    /// Tree diagnostics taken before committing the previous observation
    pub info: TreeInfo,
    pub simulations: u32,
    pub particles: usize,
}

/// Online POMCP planner over a [`Simulator`].
pub struct Planner<Sim: Simulator> {
    simulator: Sim,
    config: PlannerConfig,
    tree: Tree<Sim::State, Sim::Observation>,
    rng: StdRng,
    phase: PlannerPhase,
    depth_limit: usize,
}

impl<Sim: Simulator> Planner<Sim> {
    /// Create a planner whose root belief is sampled from `simulator`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for an invalid `config` and
    /// [`Error::EmptyMenu`] when the simulator offers no actions.
    pub fn new(simulator: Sim, config: PlannerConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        if simulator.num_actions() == 0 {
            return Err(Error::EmptyMenu {
                what: "planner action menu".to_string(),
            });
        }
        let depth_limit = config.depth_limit();
        let root = Node::new(Belief::new(config.particles), &[]);
        let mut planner = Self {
            simulator,
            config,
            tree: Tree::new(root),
            rng,
            phase: PlannerPhase::Idle,
            depth_limit,
        };
        planner.new_episode();
        Ok(planner)
    }

    pub fn simulator(&self) -> &Sim {
        &self.simulator
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn phase(&self) -> PlannerPhase {
        self.phase
    }

    pub fn tree(&self) -> &Tree<Sim::State, Sim::Observation> {
        &self.tree
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// Particles held by the root belief.
    pub fn root_particles(&self) -> usize {
        self.tree.node(self.tree.root()).belief.len()
    }

    /// Statistics of the root's action edges.
    pub fn root_action_stats(&self) -> Vec<ActionStats> {
        self.tree
            .node(self.tree.root())
            .edges
            .iter()
            .map(|edge| edge.stats)
            .collect()
    }

    /// Start a new episode: drop the tree and sample a full root belief.
    pub fn new_episode(&mut self) {
        let root = self.fresh_root();
        self.tree.reset(root);
        self.phase = PlannerPhase::Idle;
    }

    /// Drop the tree, leaving an empty root belief. The next search samples
    /// start states on demand.
    pub fn reset(&mut self) {
        let root = self.new_node(Belief::new(self.config.particles));
        self.tree.reset(root);
        self.phase = PlannerPhase::Idle;
    }

    pub fn compute_info(&self) -> TreeInfo {
        TreeInfo {
            size: self.tree.len(),
            depth: self.tree.depth(),
        }
    }

    /// Commit the previous action and observation (if any), search, and
    /// return the action for this tick.
    pub fn decide(&mut self, last: Option<(usize, Sim::Observation)>) -> Decision {
        let info = self.compute_info();
        let cheat = match last {
            Some((action, observation)) => self.move_to(action, &observation).cheat,
            None => false,
        };
        let simulations = self.plan();
        let action = if cheat {
            self.fallback_action()
        } else {
            match self.best_action() {
                Some(action) => action,
                None => self.fallback_action(),
            }
        };
        Decision {
            action,
            cheat,
            info,
            simulations,
            particles: self.root_particles(),
        }
    }

    /// Run the configured search budget from the root. Returns the number of
    /// trajectories simulated.
    pub fn plan(&mut self) -> u32 {
        self.phase = PlannerPhase::Planning;
        let deadline = self.config.budget.deadline().map(|d| Instant::now() + d);
        let mut simulations = 0u32;
        loop {
            let exhausted = match (self.config.budget, deadline) {
                (Budget::Simulations(max), _) => simulations >= max,
                (_, Some(deadline)) => simulations > 0 && Instant::now() >= deadline,
                _ => true,
            };
            if exhausted {
                break;
            }
            let root = self.tree.root();
            let state = match self.tree.node(root).belief.sample(&mut self.rng) {
                Some(state) => state.clone(),
                None => self.simulator.sample_initial_state(&mut self.rng),
            };
            self.simulate_node(root, state, 0);
            simulations += 1;
        }
        self.phase = PlannerPhase::ActionReady;
        trace!(simulations, "search finished");
        simulations
    }

    /// Root action with the highest mean return; ties go to the lowest index.
    /// `None` until some action has been visited.
    pub fn best_action(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (index, edge) in self.tree.node(self.tree.root()).edges.iter().enumerate() {
            if edge.stats.visits == 0 {
                continue;
            }
            if best.is_none_or(|(_, value)| edge.stats.value > value) {
                best = Some((index, edge.stats.value));
            }
        }
        best.map(|(index, _)| index)
    }

    /// Descend into the child reached by `action` and `observation`.
    pub fn move_to(&mut self, action: usize, observation: &Sim::Observation) -> MoveOutcome {
        let root = self.tree.root();
        let Some(child) = self.tree.child(root, action, observation) else {
            return self.resynchronise(action);
        };

        let mut reinvigorated = 0;
        if self.tree.node(child).belief.len() < self.config.quota() {
            reinvigorated = self.top_up(root, child, action, observation);
        }
        if self.tree.node(child).belief.is_empty() {
            return self.resynchronise(action);
        }

        self.tree.promote(child);
        self.phase = PlannerPhase::Committed;
        MoveOutcome {
            cheat: false,
            reinvigorated,
            particles: self.root_particles(),
        }
    }

    /// Action from the non-informed fallback policy.
    pub fn fallback_action(&mut self) -> usize {
        match self.config.fallback {
            ActionPolicy::Uniform => self.rng.random_range(0..self.simulator.num_actions()),
            ActionPolicy::Preferred => {
                let root = self.tree.root();
                let state = match self.tree.node(root).belief.sample(&mut self.rng) {
                    Some(state) => state.clone(),
                    None => self.simulator.sample_initial_state(&mut self.rng),
                };
                self.preferred_action(&state)
            }
        }
    }

    fn preferred_action(&mut self, state: &Sim::State) -> usize {
        let last = self.simulator.num_actions() - 1;
        self.simulator
            .sample_preferred_action(state, &mut self.rng)
            .min(last)
    }

    fn priors(&self) -> Vec<ActionStats> {
        let mut stats = vec![ActionStats::default(); self.simulator.num_actions()];
        if let Some(visits) = self.config.prior_visits {
            self.simulator.update_preferred_action_values(&mut stats);
            for stat in &mut stats {
                stat.visits = visits;
            }
        }
        stats
    }

    fn new_node(&self, belief: Belief<Sim::State>) -> Node<Sim::State, Sim::Observation> {
        Node::new(belief, &self.priors())
    }

    fn fresh_root(&mut self) -> Node<Sim::State, Sim::Observation> {
        let mut belief = Belief::new(self.config.particles);
        while !belief.is_full() {
            belief.push(self.simulator.sample_initial_state(&mut self.rng));
        }
        self.new_node(belief)
    }

    fn resynchronise(&mut self, action: usize) -> MoveOutcome {
        warn!(action, "belief cannot explain observation; resynchronising");
        let root = self.fresh_root();
        self.tree.reset(root);
        self.phase = PlannerPhase::Cheated;
        MoveOutcome {
            cheat: true,
            reinvigorated: 0,
            particles: self.root_particles(),
        }
    }

    /// Refill `child` from particles of `parent` until it meets the quota.
    fn top_up(
        &mut self,
        parent: NodeId,
        child: NodeId,
        action: usize,
        observation: &Sim::Observation,
    ) -> usize {
        let quota = self.config.quota();
        let attempts = quota * self.config.transform_attempt_factor;
        let mut added = 0;
        for _ in 0..attempts {
            let belief = &self.tree.node(child).belief;
            if belief.len() >= quota || belief.is_full() {
                break;
            }
            let Some(prev) = self.tree.node(parent).belief.sample(&mut self.rng).cloned() else {
                break;
            };
            let step = self.simulator.simulate(&prev, action, 0, &mut self.rng);
            let particle = if step.observation == *observation {
                Some(step.state)
            } else {
                let transformed =
                    self.simulator
                        .transform(&prev, action, &step.state, observation, &mut self.rng);
                transformed.consistent.then_some(transformed.state)
            };
            if let Some(particle) = particle
                && self.tree.node_mut(child).belief.push(particle)
            {
                added += 1;
            }
        }
        debug!(
            added,
            quota,
            particles = self.tree.node(child).belief.len(),
            "reinvigorated belief"
        );
        added
    }

    fn ucb_action(&self, id: NodeId) -> usize {
        let node = self.tree.node(id);
        let log_visits = (node.visits.max(1) as f64).ln();
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (index, edge) in node.edges.iter().enumerate() {
            if edge.stats.visits == 0 {
                return index;
            }
            let bonus = (log_visits / edge.stats.visits as f64).sqrt();
            let score = edge.stats.value + self.config.exploration * bonus;
            if score > best_score {
                best = index;
                best_score = score;
            }
        }
        best
    }

    fn rollout_action(&mut self, state: &Sim::State) -> usize {
        match self.config.rollout {
            ActionPolicy::Uniform => self.rng.random_range(0..self.simulator.num_actions()),
            ActionPolicy::Preferred => self.preferred_action(state),
        }
    }

    fn rollout(&mut self, mut state: Sim::State, mut depth: usize) -> f64 {
        let mut total = 0.0;
        let mut weight = 1.0;
        while depth < self.depth_limit {
            let action = self.rollout_action(&state);
            let step = self.simulator.simulate(&state, action, depth, &mut self.rng);
            total += weight * step.reward;
            if step.terminal {
                break;
            }
            weight *= self.config.discount;
            state = step.state;
            depth += 1;
        }
        total
    }

    fn simulate_node(&mut self, id: NodeId, state: Sim::State, depth: usize) -> f64 {
        if depth >= self.depth_limit {
            return 0.0;
        }
        let action = self.ucb_action(id);
        let step = self.simulator.simulate(&state, action, depth, &mut self.rng);

        let ret = if step.terminal {
            step.reward
        } else {
            let future = match self.tree.child(id, action, &step.observation) {
                Some(child) => {
                    self.tree.node_mut(child).belief.push(step.state.clone());
                    self.simulate_node(child, step.state, depth + 1)
                }
                None => {
                    let mut belief = Belief::new(self.config.particles);
                    belief.push(step.state.clone());
                    let node = self.new_node(belief);
                    self.tree.ensure_child(id, action, step.observation, || node);
                    self.rollout(step.state, depth + 1)
                }
            };
            step.reward + self.config.discount * future
        };

        let node = self.tree.node_mut(id);
        node.visits += 1;
        node.edges[action].stats.record(ret);
        ret
    }
}
