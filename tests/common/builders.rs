//! Graph builders for tests

use super::nodes::{EventLog, RecordingNode};
use tickgraph::{AnyNode, Engine, InputId, NodeId, OutputId};

/// Connect output 0 of `from` to input 0 of `to`, panicking if refused
pub fn link(engine: &mut Engine, from: NodeId, to: NodeId) {
    assert!(
        engine.connect(OutputId::new(from, 0), InputId::new(to, 0)),
        "connection {:?} -> {:?} refused",
        from,
        to
    );
}

/// Builder for a linear chain of recording nodes
pub struct ChainBuilder<'a> {
    log: &'a EventLog,
    labels: Vec<String>,
    offset: f64,
}

impl<'a> ChainBuilder<'a> {
    pub fn new(log: &'a EventLog) -> Self {
        Self {
            log,
            labels: Vec::new(),
            offset: 1.0,
        }
    }

    pub fn node(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }

    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Add the nodes in order and connect each to the next
    pub fn build(self, engine: &mut Engine) -> Vec<NodeId> {
        let mut ids = Vec::new();
        for label in &self.labels {
            let id = engine.add_node(AnyNode::processor(RecordingNode::new(
                label,
                self.offset,
                self.log,
            )));
            if let Some(&prev) = ids.last() {
                link(engine, prev, id);
            }
            ids.push(id);
        }
        ids
    }
}
