//! PassthroughNode: forwards its input unchanged.
//!
//! Useful as a relay point in editor graphs. When the input carries no
//! value the previous output is left in place.

use crate::error::Result;
use crate::graph::node::ProcessContext;
use crate::graph::port::{InputDescriptor, OutputDescriptor};
use crate::graph::value::ValueKind;

pub struct PassthroughNode {
    inputs: [InputDescriptor; 1],
    outputs: [OutputDescriptor; 1],
}

impl PassthroughNode {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            inputs: [InputDescriptor::of("in", kind)],
            outputs: [OutputDescriptor::new("out", kind)],
        }
    }

    pub fn name(&self) -> &str {
        "Passthrough"
    }

    pub fn inputs(&self) -> &[InputDescriptor] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputDescriptor] {
        &self.outputs
    }

    pub fn process(&mut self, ctx: &mut ProcessContext) -> Result<()> {
        if let Some(value) = ctx.input(0).cloned() {
            ctx.set_output(0, value)?;
        }
        Ok(())
    }

    pub fn kind(&self) -> ValueKind {
        self.outputs[0].produces
    }
}
