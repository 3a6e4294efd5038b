//! Dirty-propagation cache.
//!
//! Tracks per node the tick it last produced output and the tick it was
//! last invalidated. The scheduler asks `should_evaluate` right before
//! processing a node and skips it when nothing upstream has changed.

use crate::graph::id::NodeId;
use crate::graph::model::Graph;
use std::collections::{HashMap, HashSet};

/// Evaluation bookkeeping for one node. Tick 0 means "never".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalState {
    pub last_evaluated: u64,
    pub last_invalidated: u64,
}

#[derive(Debug, Default)]
pub struct DirtyTracker {
    states: HashMap<NodeId, EvalState>,
    dirty: HashSet<NodeId>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` and everything reachable through its outputs as dirty.
    ///
    /// Returns the number of nodes visited. Cycles are walked once.
    pub fn mark_dirty(&mut self, graph: &Graph, id: NodeId, tick: u64) -> usize {
        let mut visited = HashSet::new();
        let mut stack = vec![id];

        while let Some(current) = stack.pop() {
            if !graph.contains(current) || !visited.insert(current) {
                continue;
            }
            self.states.entry(current).or_default().last_invalidated = tick;
            self.dirty.insert(current);
            stack.extend(graph.downstream_nodes(current));
        }

        visited.len()
    }

    /// Whether `id` needs to run this pass.
    ///
    /// True if it is dirty, or if any connected input's source has been
    /// evaluated more recently than `id` itself.
    pub fn should_evaluate(&self, graph: &Graph, id: NodeId) -> bool {
        if self.dirty.contains(&id) {
            return true;
        }
        let own = self.last_evaluated(id);
        graph
            .upstream_nodes(id)
            .any(|upstream| self.last_evaluated(upstream) > own)
    }

    /// Record a successful evaluation at `tick` and clear the dirty flag.
    pub fn mark_evaluated(&mut self, id: NodeId, tick: u64) {
        self.states.entry(id).or_default().last_evaluated = tick;
        self.dirty.remove(&id);
    }

    /// Forget `id` entirely.
    pub fn unregister(&mut self, id: NodeId) {
        self.states.remove(&id);
        self.dirty.remove(&id);
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.dirty.contains(&id)
    }

    pub fn state(&self, id: NodeId) -> Option<EvalState> {
        self.states.get(&id).copied()
    }

    pub fn last_evaluated(&self, id: NodeId) -> u64 {
        self.states.get(&id).map_or(0, |s| s.last_evaluated)
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Dirty nodes, sorted by id.
    pub fn dirty_nodes(&self) -> Vec<NodeId> {
        let mut nodes: Vec<_> = self.dirty.iter().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::id::{InputId, OutputId};
    use crate::graph::nodes::{ConstantNode, PassthroughNode};
    use crate::graph::value::ValueKind;

    fn link(graph: &mut Graph, from: NodeId, to: NodeId) {
        assert!(graph.connect(OutputId::new(from, 0), InputId::new(to, 0)));
    }

    #[test]
    fn test_mark_dirty_propagates_downstream_only() {
        let mut graph = Graph::new();
        let a = graph.add_node(ConstantNode::new(1.0));
        let b = graph.add_node(PassthroughNode::new(ValueKind::Scalar));
        let c = graph.add_node(PassthroughNode::new(ValueKind::Scalar));
        let other = graph.add_node(ConstantNode::new(2.0));
        link(&mut graph, a, b);
        link(&mut graph, b, c);

        let mut dirty = DirtyTracker::new();
        assert_eq!(dirty.mark_dirty(&graph, b, 4), 2);

        assert!(!dirty.is_dirty(a));
        assert!(dirty.is_dirty(b));
        assert!(dirty.is_dirty(c));
        assert!(!dirty.is_dirty(other));
        assert_eq!(dirty.state(c).unwrap().last_invalidated, 4);
    }

    #[test]
    fn test_mark_dirty_terminates_on_cycle() {
        let mut graph = Graph::new();
        let a = graph.add_node(PassthroughNode::new(ValueKind::Scalar));
        let b = graph.add_node(PassthroughNode::new(ValueKind::Scalar));
        let c = graph.add_node(PassthroughNode::new(ValueKind::Scalar));
        link(&mut graph, a, b);
        link(&mut graph, b, c);
        link(&mut graph, c, a);

        let mut dirty = DirtyTracker::new();
        assert_eq!(dirty.mark_dirty(&graph, a, 1), 3);
        assert_eq!(dirty.dirty_nodes(), vec![a, b, c]);
    }

    #[test]
    fn test_should_evaluate_follows_upstream_ticks() {
        let mut graph = Graph::new();
        let a = graph.add_node(ConstantNode::new(1.0));
        let b = graph.add_node(PassthroughNode::new(ValueKind::Scalar));
        link(&mut graph, a, b);

        let mut dirty = DirtyTracker::new();
        dirty.mark_evaluated(a, 1);
        dirty.mark_evaluated(b, 1);
        assert!(!dirty.should_evaluate(&graph, a));
        assert!(!dirty.should_evaluate(&graph, b));

        // Upstream refreshed without b being marked
        dirty.mark_evaluated(a, 2);
        assert!(dirty.should_evaluate(&graph, b));
        dirty.mark_evaluated(b, 2);
        assert!(!dirty.should_evaluate(&graph, b));
    }

    #[test]
    fn test_mark_evaluated_clears_flag() {
        let mut graph = Graph::new();
        let a = graph.add_node(ConstantNode::new(1.0));
        let mut dirty = DirtyTracker::new();

        dirty.mark_dirty(&graph, a, 3);
        assert!(dirty.should_evaluate(&graph, a));
        dirty.mark_evaluated(a, 3);
        assert!(!dirty.should_evaluate(&graph, a));
        assert_eq!(
            dirty.state(a),
            Some(EvalState {
                last_evaluated: 3,
                last_invalidated: 3
            })
        );

        dirty.mark_dirty(&graph, a, 4);
        dirty.unregister(a);
        assert!(!dirty.is_dirty(a));
        assert!(dirty.state(a).is_none());

        graph.remove_node(a);
        assert_eq!(dirty.mark_dirty(&graph, a, 5), 0);
    }

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_dirty_minimality(
            edges in prop::collection::vec((0usize..8, 0usize..8), 0..20),
            start in 0usize..8,
        ) {
            let mut graph = Graph::new();
            let ids: Vec<_> = (0..8)
                .map(|_| graph.add_node(PassthroughNode::new(ValueKind::Scalar)))
                .collect();
            for (from, to) in edges {
                graph.connect(OutputId::new(ids[from], 0), InputId::new(ids[to], 0));
            }

            // Reference reachability by repeated relaxation
            let mut reachable = vec![false; 8];
            reachable[start] = true;
            loop {
                let mut changed = false;
                for c in graph.connections() {
                    if reachable[c.from.node().index()] && !reachable[c.to.node().index()] {
                        reachable[c.to.node().index()] = true;
                        changed = true;
                    }
                }
                if !changed {
                    break;
                }
            }

            let mut dirty = DirtyTracker::new();
            dirty.mark_dirty(&graph, ids[start], 1);
            for (i, &id) in ids.iter().enumerate() {
                prop_assert_eq!(dirty.is_dirty(id), reachable[i]);
            }
        }
    }
}
