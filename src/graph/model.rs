//! Graph model: an arena of nodes with typed ports and connections.
//!
//! Nodes live in `Vec<Option<NodeSlot>>` slots indexed by `NodeId`.
//! Removal empties one slot; ids are never reused. Every connection is
//! recorded on both ends: the input stores its source output, the output
//! stores the input in its fan-out list. The two sides are always updated
//! together.

use crate::graph::id::{InputId, NodeId, OutputId};
use crate::graph::node::AnyNode;
use crate::graph::port::{Connection, InputPort, OutputPort};
use crate::graph::value::PortValue;

/// A node together with its ports.
pub struct NodeSlot {
    pub node: AnyNode,
    pub inputs: Vec<InputPort>,
    pub outputs: Vec<OutputPort>,
}

impl NodeSlot {
    pub fn new(node: AnyNode) -> Self {
        let inputs = node.inputs().iter().copied().map(InputPort::new).collect();
        let outputs = node.outputs().iter().copied().map(OutputPort::new).collect();
        Self {
            node,
            inputs,
            outputs,
        }
    }
}

/// The node graph.
#[derive(Default)]
pub struct Graph {
    slots: Vec<Option<NodeSlot>>,
    live: usize,
    selected: Option<NodeId>,
    reject_cycles: bool,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph that refuses connections closing a cycle.
    pub fn rejecting_cycles() -> Self {
        Self {
            reject_cycles: true,
            ..Self::default()
        }
    }

    pub fn set_reject_cycles(&mut self, reject: bool) {
        self.reject_cycles = reject;
    }

    pub fn rejects_cycles(&self) -> bool {
        self.reject_cycles
    }

    // ── Node set ──

    /// Add a node. Returns its id.
    pub fn add_node(&mut self, node: impl Into<AnyNode>) -> NodeId {
        let node = node.into();
        debug_assert!(node.inputs().len() <= crate::graph::id::PortId::MAX_PORTS);
        debug_assert!(node.outputs().len() <= crate::graph::id::PortId::MAX_PORTS);

        debug_assert!(self.slots.len() < NodeId::INVALID.index(), "node ids exhausted");
        let id = NodeId(self.slots.len() as u32);
        tracing::debug!("Added node {:?} ({})", id, node.name());
        self.slots.push(Some(NodeSlot::new(node)));
        self.live += 1;
        id
    }

    /// Disconnect every port of `id`, dispose it, and free its slot.
    ///
    /// Returns `false` if the node was not in the graph.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        let (input_count, output_count) = match self.slot(id) {
            Some(slot) => (slot.inputs.len(), slot.outputs.len()),
            None => return false,
        };

        for i in 0..input_count {
            self.disconnect_input(InputId::new(id, i as u16));
        }
        for o in 0..output_count {
            self.disconnect_output(OutputId::new(id, o as u16));
        }

        if let Some(mut slot) = self.slots[id.index()].take() {
            slot.node.on_dispose();
            self.live -= 1;
            tracing::debug!("Removed node {:?} ({})", id, slot.node.name());
        }

        if self.selected == Some(id) {
            self.selected = None;
        }
        true
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }

    pub fn slot(&self, id: NodeId) -> Option<&NodeSlot> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn slot_mut(&mut self, id: NodeId) -> Option<&mut NodeSlot> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn node(&self, id: NodeId) -> Option<&AnyNode> {
        self.slot(id).map(|slot| &slot.node)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut AnyNode> {
        self.slot_mut(id).map(|slot| &mut slot.node)
    }

    // ── Selection ──

    /// Focus a node. Returns `false` if it is not in the graph.
    pub fn select(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selected = Some(id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    // ── Ports ──

    pub fn input(&self, id: InputId) -> Option<&InputPort> {
        self.slot(id.node()).and_then(|s| s.inputs.get(id.index()))
    }

    pub fn output(&self, id: OutputId) -> Option<&OutputPort> {
        self.slot(id.node()).and_then(|s| s.outputs.get(id.index()))
    }

    fn input_mut(&mut self, id: InputId) -> Option<&mut InputPort> {
        self.slot_mut(id.node())
            .and_then(|s| s.inputs.get_mut(id.index()))
    }

    fn output_mut(&mut self, id: OutputId) -> Option<&mut OutputPort> {
        self.slot_mut(id.node())
            .and_then(|s| s.outputs.get_mut(id.index()))
    }

    /// Value currently visible on an input.
    pub fn input_value(&self, id: InputId) -> Option<&PortValue> {
        self.input(id).and_then(InputPort::value)
    }

    /// Last value produced on an output.
    pub fn output_value(&self, id: OutputId) -> Option<&PortValue> {
        self.output(id).and_then(OutputPort::value)
    }

    /// Set or clear an input's local default. Returns `false` for an unknown port.
    pub fn set_input_default(&mut self, id: InputId, value: Option<PortValue>) -> bool {
        match self.input_mut(id) {
            Some(port) => {
                port.default = value;
                true
            }
            None => false,
        }
    }

    /// Store a produced value on an output and mirror it into every connected input.
    pub(crate) fn set_output_value(&mut self, id: OutputId, value: PortValue) {
        let targets = match self.output_mut(id) {
            Some(port) => port.targets.clone(),
            None => return,
        };

        for target in targets {
            if let Some(input) = self.input_mut(target) {
                input.mirrored = Some(value.clone());
            }
        }
        if let Some(port) = self.output_mut(id) {
            port.value = Some(value);
        }
    }

    // ── Connections ──

    /// Whether `from` may feed `to`.
    ///
    /// True iff both ports exist and the input accepts the output's kind.
    /// When cycle rejection is on, edges that would close a cycle are refused too.
    pub fn can_connect(&self, from: OutputId, to: InputId) -> bool {
        let (Some(output), Some(input)) = (self.output(from), self.input(to)) else {
            return false;
        };
        if !input.accepts().contains(output.produces()) {
            return false;
        }
        !(self.reject_cycles && self.would_create_cycle(from.node(), to.node()))
    }

    /// Connect `from` to `to`, replacing any existing connection into `to`.
    ///
    /// The input is primed with the output's last value. Returns `false`
    /// and changes nothing if `can_connect` does not hold.
    pub fn connect(&mut self, from: OutputId, to: InputId) -> bool {
        if !self.can_connect(from, to) {
            tracing::debug!("Rejected connection {:?} -> {:?}", from, to);
            return false;
        }

        self.disconnect_input(to);

        let primed = match self.output_mut(from) {
            Some(output) => {
                output.targets.push(to);
                output.value.clone()
            }
            None => return false,
        };
        if let Some(input) = self.input_mut(to) {
            input.source = Some(from);
            input.mirrored = primed;
        }

        tracing::debug!("Connected {:?} -> {:?}", from, to);
        true
    }

    /// Remove every connection leaving `from`. Returns the inputs that lost their source.
    pub fn disconnect_output(&mut self, from: OutputId) -> Vec<InputId> {
        let targets = match self.output_mut(from) {
            Some(output) => std::mem::take(&mut output.targets),
            None => return Vec::new(),
        };

        for &target in &targets {
            if let Some(input) = self.input_mut(target) {
                debug_assert_eq!(input.source, Some(from), "connection not mirrored");
                input.source = None;
                input.mirrored = None;
            }
        }

        if !targets.is_empty() {
            tracing::debug!("Disconnected {:?} from {} input(s)", from, targets.len());
        }
        targets
    }

    /// Remove the connection into `to`, if any. Returns its former source.
    pub fn disconnect_input(&mut self, to: InputId) -> Option<OutputId> {
        let source = {
            let input = self.input_mut(to)?;
            input.mirrored = None;
            input.source.take()?
        };

        if let Some(output) = self.output_mut(source) {
            let before = output.targets.len();
            output.targets.retain(|&t| t != to);
            debug_assert_eq!(before, output.targets.len() + 1, "connection not mirrored");
        }

        tracing::debug!("Disconnected {:?} -> {:?}", source, to);
        Some(source)
    }

    /// Every connection in the graph, grouped by source node.
    pub fn connections(&self) -> Vec<Connection> {
        let mut out = Vec::new();
        for id in self.node_ids() {
            if let Some(slot) = self.slot(id) {
                for (o, port) in slot.outputs.iter().enumerate() {
                    let from = OutputId::new(id, o as u16);
                    out.extend(port.targets.iter().map(|&to| Connection { from, to }));
                }
            }
        }
        out
    }

    // ── Traversal ──

    /// Nodes feeding a connected input of `id`. May contain duplicates.
    pub fn upstream_nodes(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.slot(id)
            .into_iter()
            .flat_map(|slot| slot.inputs.iter())
            .filter_map(|input| input.source.map(OutputId::node))
    }

    /// Distinct nodes fed by any output of `id`, in connection order.
    pub fn downstream_nodes(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        if let Some(slot) = self.slot(id) {
            for target in slot.outputs.iter().flat_map(|o| o.targets.iter()) {
                let node = target.node();
                if !out.contains(&node) {
                    out.push(node);
                }
            }
        }
        out
    }

    /// Whether adding an edge `from -> to` would close a cycle.
    ///
    /// True when `to` already reaches `from` through existing connections.
    pub fn would_create_cycle(&self, from: NodeId, to: NodeId) -> bool {
        let mut visited = vec![false; self.slots.len()];
        let mut stack = vec![to];

        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            let idx = current.index();
            if idx >= visited.len() || visited[idx] {
                continue;
            }
            visited[idx] = true;
            stack.extend(self.downstream_nodes(current));
        }
        false
    }

    /// Check that every connection is mirrored on both ends.
    pub fn is_consistent(&self) -> bool {
        for id in self.node_ids() {
            let Some(slot) = self.slot(id) else {
                return false;
            };
            for (i, input) in slot.inputs.iter().enumerate() {
                if let Some(source) = input.source {
                    let to = InputId::new(id, i as u16);
                    let matches = self
                        .output(source)
                        .map(|o| o.targets.iter().filter(|&&t| t == to).count());
                    if matches != Some(1) {
                        return false;
                    }
                }
            }
            for (o, output) in slot.outputs.iter().enumerate() {
                let from = OutputId::new(id, o as u16);
                for &target in &output.targets {
                    if self.input(target).and_then(InputPort::source) != Some(from) {
                        return false;
                    }
                }
            }
        }
        true
    }
}
