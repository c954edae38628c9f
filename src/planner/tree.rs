//! Arena-backed search tree.
//!
//! Nodes live in a slot vector and refer to each other by [`NodeId`]. Pruning
//! frees every slot outside the retained subtree and recycles it for later
//! insertions, so memory tracks the live history only.

use std::{collections::HashMap, hash::Hash};

use super::belief::Belief;
use crate::ports::ActionStats;

/// Index of a node in its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Statistics and observation branches below one action.
#[derive(Debug, Clone)]
pub struct ActionEdge<O> {
    pub stats: ActionStats,
    pub children: HashMap<O, NodeId>,
}

impl<O> Default for ActionEdge<O> {
    fn default() -> Self {
        Self {
            stats: ActionStats::default(),
            children: HashMap::new(),
        }
    }
}

/// One decision history.
#[derive(Debug, Clone)]
pub struct Node<S, O> {
    pub belief: Belief<S>,
    pub edges: Vec<ActionEdge<O>>,
    pub visits: u32,
}

impl<S, O> Node<S, O> {
    /// Node with `num_actions` fresh edges and seeded edge statistics.
    pub fn new(belief: Belief<S>, priors: &[ActionStats]) -> Self {
        let edges: Vec<ActionEdge<O>> = priors
            .iter()
            .map(|&stats| ActionEdge {
                stats,
                children: HashMap::new(),
            })
            .collect();
        let visits = edges.iter().map(|e| e.stats.visits).sum();
        Self {
            belief,
            edges,
            visits,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Tree<S, O> {
    slots: Vec<Option<Node<S, O>>>,
    free: Vec<usize>,
    root: NodeId,
}

impl<S, O> Tree<S, O>
where
    O: Eq + Hash,
{
    pub fn new(root: Node<S, O>) -> Self {
        Self {
            slots: vec![Some(root)],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Live node count.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Panics
    ///
    /// Panics if `id` refers to a pruned node.
    pub fn node(&self, id: NodeId) -> &Node<S, O> {
        match &self.slots[id.0] {
            Some(node) => node,
            None => panic!("node {} was pruned", id.0),
        }
    }

    /// # Panics
    ///
    /// Panics if `id` refers to a pruned node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<S, O> {
        match &mut self.slots[id.0] {
            Some(node) => node,
            None => panic!("node {} was pruned", id.0),
        }
    }

    pub fn child(&self, id: NodeId, action: usize, observation: &O) -> Option<NodeId> {
        self.node(id)
            .edges
            .get(action)
            .and_then(|edge| edge.children.get(observation))
            .copied()
    }

    fn insert(&mut self, node: Node<S, O>) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Child under `(action, observation)`, created with `make` if missing.
    /// Returns the child and whether it was created.
    pub fn ensure_child(
        &mut self,
        id: NodeId,
        action: usize,
        observation: O,
        make: impl FnOnce() -> Node<S, O>,
    ) -> (NodeId, bool) {
        if let Some(existing) = self.child(id, action, &observation) {
            return (existing, false);
        }
        let child = self.insert(make());
        self.node_mut(id).edges[action]
            .children
            .insert(observation, child);
        (child, true)
    }

    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut stack = vec![id];
        let mut seen = Vec::new();
        while let Some(next) = stack.pop() {
            seen.push(next);
            for edge in &self.node(next).edges {
                stack.extend(edge.children.values().copied());
            }
        }
        seen
    }

    /// Make `id` the root and free every node outside its subtree.
    pub fn promote(&mut self, id: NodeId) {
        let mut keep = vec![false; self.slots.len()];
        for kept in self.subtree(id) {
            keep[kept.0] = true;
        }
        for (slot, kept) in keep.into_iter().enumerate() {
            if !kept && self.slots[slot].take().is_some() {
                self.free.push(slot);
            }
        }
        self.root = id;
    }

    /// Drop the whole tree and start again from `root`.
    pub fn reset(&mut self, root: Node<S, O>) {
        self.slots.clear();
        self.free.clear();
        self.slots.push(Some(root));
        self.root = NodeId(0);
    }

    /// Number of levels below the root (a lone root has depth 0).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 0)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for edge in &self.node(id).edges {
                stack.extend(edge.children.values().map(|&child| (child, depth + 1)));
            }
        }
        deepest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf() -> Node<u32, u8> {
        Node::new(Belief::new(4), &[ActionStats::default(); 2])
    }

    #[test]
    fn test_ensure_child_is_idempotent() {
        let mut tree = Tree::new(leaf());
        let root = tree.root();
        let (first, created) = tree.ensure_child(root, 1, 7, leaf);
        assert!(created);
        let (second, created) = tree.ensure_child(root, 1, 7, leaf);
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_promote_frees_siblings_and_reuses_slots() {
        let mut tree = Tree::new(leaf());
        let root = tree.root();
        let (keep, _) = tree.ensure_child(root, 0, 1, leaf);
        let (drop, _) = tree.ensure_child(root, 1, 1, leaf);
        tree.ensure_child(keep, 0, 2, leaf);
        tree.ensure_child(drop, 0, 2, leaf);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.depth(), 2);

        tree.promote(keep);
        assert_eq!(tree.root(), keep);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.depth(), 1);

        let (fresh, _) = tree.ensure_child(keep, 1, 3, leaf);
        assert_eq!(tree.len(), 3);
        assert!(fresh != keep);
    }

    #[test]
    fn test_prior_visits_count_towards_node() {
        let priors = [ActionStats {
            visits: 3,
            value: 0.5,
        }; 4];
        let node: Node<u32, u8> = Node::new(Belief::new(1), &priors);
        assert_eq!(node.visits, 12);
    }
}
