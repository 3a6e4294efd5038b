//! Evaluation scheduler.
//!
//! One pass per tick:
//! 1. Seed a ready queue with every node whose connected inputs all come
//!    from processed nodes (vacuously true for sources).
//! 2. Pop a node, skip it if already processed, otherwise evaluate it when
//!    the dirty cache says it is stale.
//! 3. Re-test readiness of its downstream nodes and enqueue the ready ones.
//!
//! Readiness is recomputed from scratch on every check rather than kept as
//! an in-degree counter. Nodes on or behind a cycle never become ready and
//! are left out of the pass.

use crate::error::{EngineError, Result};
use crate::graph::dirty::DirtyTracker;
use crate::graph::id::{NodeId, OutputId};
use crate::graph::model::Graph;
use crate::graph::node::ProcessContext;
use crate::graph::value::PortValue;
use crate::pool::BufferPool;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Outcome of one scheduler pass.
#[derive(Debug, Default)]
pub struct PassReport {
    pub tick: u64,
    /// Nodes marked processed, in the order they were reached.
    pub order: Vec<NodeId>,
    /// Nodes whose `process` ran and succeeded.
    pub evaluated: Vec<NodeId>,
    /// Nodes skipped because nothing upstream changed.
    pub satisfied: Vec<NodeId>,
    /// Nodes whose `process` failed. Their downstream is held back this pass.
    pub failed: Vec<(NodeId, EngineError)>,
    /// Live nodes never reached: cyclic, behind a cycle, or behind a failure.
    pub unreached: Vec<NodeId>,
}

impl PassReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.unreached.is_empty()
    }

    pub fn was_evaluated(&self, id: NodeId) -> bool {
        self.evaluated.contains(&id)
    }

    /// Position of `id` in processing order.
    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|&n| n == id)
    }
}

/// Runs ready-queue passes over a graph.
pub struct Scheduler;

impl Scheduler {
    /// Whether every connected input of `id` is fed by a processed node.
    pub fn is_ready(graph: &Graph, id: NodeId, processed: &HashSet<NodeId>) -> bool {
        graph
            .upstream_nodes(id)
            .all(|upstream| processed.contains(&upstream))
    }

    /// Run one pass at `tick`.
    pub fn run_pass(
        graph: &mut Graph,
        dirty: &mut DirtyTracker,
        pool: &Arc<BufferPool>,
        tick: u64,
    ) -> PassReport {
        let mut report = PassReport {
            tick,
            ..PassReport::default()
        };
        let mut processed: HashSet<NodeId> = HashSet::with_capacity(graph.len());
        let mut failed: HashSet<NodeId> = HashSet::new();

        let mut queue: VecDeque<NodeId> = graph
            .node_ids()
            .filter(|&id| Self::is_ready(graph, id, &processed))
            .collect();

        while let Some(id) = queue.pop_front() {
            if processed.contains(&id) || failed.contains(&id) {
                continue;
            }

            if dirty.should_evaluate(graph, id) {
                match Self::evaluate_node(graph, id, pool, tick) {
                    Ok(()) => {
                        dirty.mark_evaluated(id, tick);
                        report.evaluated.push(id);
                    }
                    Err(e) => {
                        tracing::error!("Node {:?} failed at tick {}: {}", id, tick, e);
                        failed.insert(id);
                        report.failed.push((id, e));
                        continue;
                    }
                }
            } else {
                report.satisfied.push(id);
            }

            processed.insert(id);
            report.order.push(id);

            for next in graph.downstream_nodes(id) {
                if !processed.contains(&next) && Self::is_ready(graph, next, &processed) {
                    queue.push_back(next);
                }
            }
        }

        report.unreached = graph
            .node_ids()
            .filter(|id| !processed.contains(id) && !failed.contains(id))
            .collect();

        if !report.unreached.is_empty() {
            tracing::warn!(
                "Tick {}: {} node(s) unreached (cycle or failed upstream): {:?}",
                tick,
                report.unreached.len(),
                report.unreached
            );
        }
        tracing::debug!(
            "Tick {}: evaluated {}, satisfied {}, failed {}",
            tick,
            report.evaluated.len(),
            report.satisfied.len(),
            report.failed.len()
        );

        report
    }

    /// Run `process` on one node and publish its staged outputs.
    ///
    /// Outputs only change if `process` returns `Ok`.
    pub fn evaluate_node(
        graph: &mut Graph,
        id: NodeId,
        pool: &Arc<BufferPool>,
        tick: u64,
    ) -> Result<()> {
        let slot = graph.slot_mut(id).ok_or(EngineError::UnknownNode(id))?;
        let mut staged: Vec<Option<PortValue>> = vec![None; slot.outputs.len()];

        {
            let mut ctx =
                ProcessContext::new(id, &slot.inputs, &slot.outputs, &mut staged, pool, tick);
            slot.node.process(&mut ctx)?;
        }

        for (index, value) in staged.into_iter().enumerate() {
            if let Some(value) = value {
                graph.set_output_value(OutputId::new(id, index as u16), value);
            }
        }
        Ok(())
    }
}
