//! Node abstraction for the graph.
//!
//! Two-layer design:
//! - **`NodeProcessor` trait**: for externally implemented nodes (editor
//!   plugins, concrete pixel/number transforms).
//! - **`BuiltinNode` enum**: for the built-in nodes. Match arms dispatch
//!   statically on the evaluation path.
//!
//! `AnyNode` wraps either variant so the graph can handle both uniformly.

use crate::error::{EngineError, Result};
use crate::graph::id::NodeId;
use crate::graph::nodes::{ConstantNode, PassthroughNode, SolidImageNode};
use crate::graph::port::{InputDescriptor, InputPort, OutputDescriptor, OutputPort};
use crate::graph::value::{FormatDescriptor, ImageFrame, PortValue};
use crate::pool::BufferPool;
use std::sync::Arc;

/// Screen-space rectangle handed to `draw_content`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DrawRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Context passed to `process` for one evaluation.
///
/// Inputs are read-only views of the node's input ports. Outputs written
/// here are staged and pushed to the node's output ports (and from there to
/// every connected input) only after `process` returns `Ok`.
pub struct ProcessContext<'a> {
    node: NodeId,
    inputs: &'a [InputPort],
    outputs: &'a [OutputPort],
    staged: &'a mut [Option<PortValue>],
    pool: &'a Arc<BufferPool>,
    tick: u64,
}

impl<'a> ProcessContext<'a> {
    pub fn new(
        node: NodeId,
        inputs: &'a [InputPort],
        outputs: &'a [OutputPort],
        staged: &'a mut [Option<PortValue>],
        pool: &'a Arc<BufferPool>,
        tick: u64,
    ) -> Self {
        debug_assert_eq!(outputs.len(), staged.len());
        Self {
            node,
            inputs,
            outputs,
            staged,
            pool,
            tick,
        }
    }

    /// The node being processed.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Tick this evaluation belongs to.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Pool for scratch and output buffers.
    pub fn pool(&self) -> &Arc<BufferPool> {
        self.pool
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Value available on input `index`, `None` if unconnected without default.
    pub fn input(&self, index: usize) -> Option<&PortValue> {
        self.inputs.get(index).and_then(InputPort::value)
    }

    pub fn input_scalar(&self, index: usize) -> Option<f64> {
        self.input(index).and_then(PortValue::as_scalar)
    }

    pub fn input_vector(&self, index: usize) -> Option<[f64; 4]> {
        self.input(index).and_then(PortValue::as_vector)
    }

    pub fn input_image(&self, index: usize) -> Option<&ImageFrame> {
        self.input(index).and_then(PortValue::as_image)
    }

    pub fn input_format(&self, index: usize) -> Option<FormatDescriptor> {
        self.input(index).and_then(PortValue::as_format)
    }

    /// Value this node's output `index` held after its last evaluation.
    pub fn previous_output(&self, index: usize) -> Option<&PortValue> {
        self.outputs.get(index).and_then(OutputPort::value)
    }

    /// Stage a value for output `index`.
    ///
    /// Fails if the index is out of range or the value's kind differs from
    /// the kind the port declares.
    pub fn set_output(&mut self, index: usize, value: impl Into<PortValue>) -> Result<()> {
        let value = value.into();
        let port = self.outputs.get(index).ok_or(EngineError::UnknownPort {
            node: self.node,
            index,
        })?;
        if value.kind() != port.produces() {
            return Err(EngineError::node(
                self.node,
                format!(
                    "output '{}' produces {} but got {}",
                    port.name(),
                    port.produces(),
                    value.kind()
                ),
            ));
        }
        self.staged[index] = Some(value);
        Ok(())
    }
}

/// Trait for externally implemented nodes.
pub trait NodeProcessor: Send {
    /// Human-readable name of this node.
    fn name(&self) -> &str;

    /// Input port descriptors, in port order.
    fn inputs(&self) -> &[InputDescriptor];

    /// Output port descriptors, in port order.
    fn outputs(&self) -> &[OutputDescriptor];

    /// Pull from inputs, push to outputs. Must not touch state outside its own ports.
    fn process(&mut self, ctx: &mut ProcessContext) -> Result<()>;

    /// Presentation hook for editors. The engine never calls it.
    fn draw_content(&self, _region: DrawRegion) {}

    /// Apply a named parameter. Returns whether anything changed.
    fn on_config_change(&mut self, _key: &str, _value: &PortValue) -> bool {
        false
    }

    /// Called once when the node leaves the graph, after its ports are disconnected.
    fn on_dispose(&mut self) {}
}

/// Enum dispatch for built-in nodes.
pub enum BuiltinNode {
    Constant(ConstantNode),
    Passthrough(PassthroughNode),
    SolidImage(SolidImageNode),
}

impl BuiltinNode {
    pub fn name(&self) -> &str {
        match self {
            BuiltinNode::Constant(n) => n.name(),
            BuiltinNode::Passthrough(n) => n.name(),
            BuiltinNode::SolidImage(n) => n.name(),
        }
    }

    pub fn inputs(&self) -> &[InputDescriptor] {
        match self {
            BuiltinNode::Constant(n) => n.inputs(),
            BuiltinNode::Passthrough(n) => n.inputs(),
            BuiltinNode::SolidImage(n) => n.inputs(),
        }
    }

    pub fn outputs(&self) -> &[OutputDescriptor] {
        match self {
            BuiltinNode::Constant(n) => n.outputs(),
            BuiltinNode::Passthrough(n) => n.outputs(),
            BuiltinNode::SolidImage(n) => n.outputs(),
        }
    }

    pub fn process(&mut self, ctx: &mut ProcessContext) -> Result<()> {
        match self {
            BuiltinNode::Constant(n) => n.process(ctx),
            BuiltinNode::Passthrough(n) => n.process(ctx),
            BuiltinNode::SolidImage(n) => n.process(ctx),
        }
    }

    pub fn on_config_change(&mut self, key: &str, value: &PortValue) -> bool {
        match self {
            BuiltinNode::Constant(n) => n.on_config_change(key, value),
            BuiltinNode::Passthrough(_) => false,
            BuiltinNode::SolidImage(_) => false,
        }
    }
}

/// Wrapper that holds either a built-in node (enum dispatch) or a processor (trait object).
pub enum AnyNode {
    Builtin(BuiltinNode),
    Processor(Box<dyn NodeProcessor>),
}

impl AnyNode {
    /// Box an external processor.
    pub fn processor(node: impl NodeProcessor + 'static) -> Self {
        AnyNode::Processor(Box::new(node))
    }

    pub fn name(&self) -> &str {
        match self {
            AnyNode::Builtin(n) => n.name(),
            AnyNode::Processor(n) => n.name(),
        }
    }

    pub fn inputs(&self) -> &[InputDescriptor] {
        match self {
            AnyNode::Builtin(n) => n.inputs(),
            AnyNode::Processor(n) => n.inputs(),
        }
    }

    pub fn outputs(&self) -> &[OutputDescriptor] {
        match self {
            AnyNode::Builtin(n) => n.outputs(),
            AnyNode::Processor(n) => n.outputs(),
        }
    }

    pub fn process(&mut self, ctx: &mut ProcessContext) -> Result<()> {
        match self {
            AnyNode::Builtin(n) => n.process(ctx),
            AnyNode::Processor(n) => n.process(ctx),
        }
    }

    pub fn draw_content(&self, region: DrawRegion) {
        if let AnyNode::Processor(n) = self {
            n.draw_content(region);
        }
    }

    pub fn on_config_change(&mut self, key: &str, value: &PortValue) -> bool {
        match self {
            AnyNode::Builtin(n) => n.on_config_change(key, value),
            AnyNode::Processor(n) => n.on_config_change(key, value),
        }
    }

    pub fn on_dispose(&mut self) {
        if let AnyNode::Processor(n) = self {
            n.on_dispose();
        }
    }
}

impl std::fmt::Debug for AnyNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AnyNode").field(&self.name()).finish()
    }
}

impl From<BuiltinNode> for AnyNode {
    fn from(node: BuiltinNode) -> Self {
        AnyNode::Builtin(node)
    }
}

impl From<ConstantNode> for AnyNode {
    fn from(node: ConstantNode) -> Self {
        AnyNode::Builtin(BuiltinNode::Constant(node))
    }
}

impl From<PassthroughNode> for AnyNode {
    fn from(node: PassthroughNode) -> Self {
        AnyNode::Builtin(BuiltinNode::Passthrough(node))
    }
}

impl From<SolidImageNode> for AnyNode {
    fn from(node: SolidImageNode) -> Self {
        AnyNode::Builtin(BuiltinNode::SolidImage(node))
    }
}

impl From<Box<dyn NodeProcessor>> for AnyNode {
    fn from(node: Box<dyn NodeProcessor>) -> Self {
        AnyNode::Processor(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::port::OutputDescriptor;
    use crate::graph::value::ValueKind;

    fn outputs() -> Vec<OutputPort> {
        vec![OutputPort::new(OutputDescriptor::new("out", ValueKind::Scalar))]
    }

    #[test]
    fn test_set_output_checks_kind() {
        let pool = Arc::new(BufferPool::with_budget(1024));
        let outputs = outputs();
        let mut staged = vec![None];
        let mut ctx = ProcessContext::new(NodeId(0), &[], &outputs, &mut staged, &pool, 1);

        assert!(ctx.set_output(0, [1.0, 2.0, 3.0, 4.0]).is_err());
        assert!(matches!(
            ctx.set_output(3, 1.0),
            Err(EngineError::UnknownPort { index: 3, .. })
        ));
        ctx.set_output(0, 1.5).unwrap();
        assert_eq!(staged[0].as_ref().and_then(PortValue::as_scalar), Some(1.5));
    }

    struct Sketch {
        drawn: std::sync::Arc<std::sync::Mutex<Vec<DrawRegion>>>,
    }

    impl NodeProcessor for Sketch {
        fn name(&self) -> &str {
            "Sketch"
        }

        fn inputs(&self) -> &[InputDescriptor] {
            &[]
        }

        fn outputs(&self) -> &[OutputDescriptor] {
            &[]
        }

        fn process(&mut self, _ctx: &mut ProcessContext) -> Result<()> {
            Ok(())
        }

        fn draw_content(&self, region: DrawRegion) {
            self.drawn.lock().unwrap().push(region);
        }
    }

    #[test]
    fn test_processor_hooks_through_any_node() {
        let drawn = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut node = AnyNode::processor(Sketch {
            drawn: drawn.clone(),
        });
        let region = DrawRegion {
            x: 1.0,
            y: 2.0,
            width: 30.0,
            height: 40.0,
        };

        node.draw_content(region);
        assert_eq!(node.name(), "Sketch");
        assert!(!node.on_config_change("anything", &PortValue::Scalar(1.0)));
        assert_eq!(drawn.lock().unwrap().as_slice(), &[region]);
    }

    #[test]
    fn test_missing_input_is_none() {
        let pool = Arc::new(BufferPool::with_budget(1024));
        let outputs = outputs();
        let mut staged = vec![None];
        let ctx = ProcessContext::new(NodeId(0), &[], &outputs, &mut staged, &pool, 1);
        assert!(ctx.input(0).is_none());
        assert!(ctx.input_scalar(0).is_none());
        assert_eq!(ctx.tick(), 1);
    }
}
