//! Tick driver: owns the graph, the dirty cache and the buffer pool.
//!
//! Every structural edit made through `Engine` invalidates the affected
//! nodes, so the next `tick` re-evaluates exactly what changed and what
//! depends on it.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::dirty::DirtyTracker;
use crate::graph::id::{InputId, NodeId, OutputId};
use crate::graph::model::Graph;
use crate::graph::node::AnyNode;
use crate::graph::port::Connection;
use crate::graph::scheduler::{PassReport, Scheduler};
use crate::graph::value::PortValue;
use crate::pool::{BufferPool, PoolStats};
use std::sync::Arc;

pub struct Engine {
    graph: Graph,
    dirty: DirtyTracker,
    pool: Arc<BufferPool>,
    config: EngineConfig,
    tick: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let pool = Arc::new(BufferPool::new(&config.pool));
        Self::with_pool(config, pool)
    }

    /// Build an engine around an existing pool, e.g. one shared with export paths.
    pub fn with_pool(config: EngineConfig, pool: Arc<BufferPool>) -> Self {
        let mut graph = Graph::new();
        graph.set_reject_cycles(config.scheduler.reject_cycles);
        Self {
            graph,
            dirty: DirtyTracker::new(),
            pool,
            config,
            tick: 0,
        }
    }

    // ── Accessors ──

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn dirty(&self) -> &DirtyTracker {
        &self.dirty
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Number of ticks run so far.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn input_value(&self, id: InputId) -> Option<&PortValue> {
        self.graph.input_value(id)
    }

    pub fn output_value(&self, id: OutputId) -> Option<&PortValue> {
        self.graph.output_value(id)
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.graph.connections()
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.dirty.is_dirty(id)
    }

    // ── Graph edits ──

    /// Add a node. It is dirty until its first evaluation.
    pub fn add_node(&mut self, node: impl Into<AnyNode>) -> NodeId {
        let id = self.graph.add_node(node);
        self.dirty.mark_dirty(&self.graph, id, self.tick);
        id
    }

    /// Remove a node and invalidate everything it used to feed.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let downstream = self.graph.downstream_nodes(id);
        if !self.graph.remove_node(id) {
            return false;
        }
        self.dirty.unregister(id);
        for node in downstream {
            self.dirty.mark_dirty(&self.graph, node, self.tick);
        }
        true
    }

    pub fn can_connect(&self, from: OutputId, to: InputId) -> bool {
        self.graph.can_connect(from, to)
    }

    /// Connect `from` to `to`, replacing any existing source of `to`.
    pub fn connect(&mut self, from: OutputId, to: InputId) -> bool {
        if !self.graph.connect(from, to) {
            return false;
        }
        self.dirty.mark_dirty(&self.graph, to.node(), self.tick);
        true
    }

    pub fn disconnect_input(&mut self, to: InputId) -> Option<OutputId> {
        let source = self.graph.disconnect_input(to)?;
        self.dirty.mark_dirty(&self.graph, to.node(), self.tick);
        Some(source)
    }

    pub fn disconnect_output(&mut self, from: OutputId) -> Vec<InputId> {
        let lost = self.graph.disconnect_output(from);
        for to in &lost {
            self.dirty.mark_dirty(&self.graph, to.node(), self.tick);
        }
        lost
    }

    /// Set or clear an input's default value.
    pub fn set_input_default(&mut self, to: InputId, value: Option<PortValue>) -> bool {
        if !self.graph.set_input_default(to, value) {
            return false;
        }
        self.dirty.mark_dirty(&self.graph, to.node(), self.tick);
        true
    }

    /// Forward a named parameter to a node. Invalidates it when the node reports a change.
    pub fn configure_node(&mut self, id: NodeId, key: &str, value: &PortValue) -> Result<bool> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or(EngineError::UnknownNode(id))?;
        let changed = node.on_config_change(key, value);
        if changed {
            tracing::debug!("Node {:?} config '{}' changed", id, key);
            self.dirty.mark_dirty(&self.graph, id, self.tick);
        }
        Ok(changed)
    }

    pub fn select(&mut self, id: NodeId) -> bool {
        self.graph.select(id)
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.graph.selected()
    }

    /// Invalidate `id` and its downstream. Returns how many nodes were marked.
    pub fn mark_dirty(&mut self, id: NodeId) -> usize {
        self.dirty.mark_dirty(&self.graph, id, self.tick)
    }

    // ── Ticking ──

    /// Advance one tick: run a single scheduler pass.
    pub fn tick(&mut self) -> PassReport {
        self.tick += 1;
        Scheduler::run_pass(&mut self.graph, &mut self.dirty, &self.pool, self.tick)
    }

    /// Drop idle pooled buffers. Returns how many were released.
    pub fn force_cleanup(&self) -> usize {
        self.pool.force_cleanup()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("nodes", &self.graph.len())
            .field("dirty", &self.dirty.dirty_count())
            .field("tick", &self.tick)
            .finish()
    }
}
