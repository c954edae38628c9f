//! Online planner: POMCP search with tree reuse and belief reinvigoration.

mod belief;
mod config;
mod pomcp;
mod tree;

pub use belief::Belief;
pub use config::{ActionPolicy, Budget, PlannerConfig, discount_for_horizon};
pub use pomcp::{Decision, MoveOutcome, Planner, PlannerPhase, TreeInfo};
pub use tree::{ActionEdge, Node, NodeId, Tree};
