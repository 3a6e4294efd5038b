//! ConstantNode: emits a fixed value.
//!
//! The output kind follows the value the node was built with. The value can
//! be replaced through the `"value"` config key as long as the kind stays
//! the same.

use crate::error::Result;
use crate::graph::node::ProcessContext;
use crate::graph::port::{InputDescriptor, OutputDescriptor};
use crate::graph::value::PortValue;

pub struct ConstantNode {
    value: PortValue,
    outputs: [OutputDescriptor; 1],
}

impl ConstantNode {
    pub fn new(value: impl Into<PortValue>) -> Self {
        let value = value.into();
        Self {
            outputs: [OutputDescriptor::new("value", value.kind())],
            value,
        }
    }

    pub fn name(&self) -> &str {
        "Constant"
    }

    pub fn inputs(&self) -> &[InputDescriptor] {
        &[]
    }

    pub fn outputs(&self) -> &[OutputDescriptor] {
        &self.outputs
    }

    pub fn process(&mut self, ctx: &mut ProcessContext) -> Result<()> {
        ctx.set_output(0, self.value.clone())
    }

    pub fn on_config_change(&mut self, key: &str, value: &PortValue) -> bool {
        match key {
            "value" if value.kind() == self.value.kind() => {
                self.value = value.clone();
                true
            }
            _ => false,
        }
    }

    pub fn value(&self) -> &PortValue {
        &self.value
    }
}
