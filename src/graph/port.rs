//! Port descriptors and runtime port state.
//!
//! Each node declares its ports via static descriptor arrays. The graph
//! turns those into `InputPort`/`OutputPort` slots that carry connection
//! state and the values flowing through them.

use crate::graph::id::{InputId, OutputId};
use crate::graph::value::{AcceptedKinds, PortValue, ValueKind};

/// Static descriptor for an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputDescriptor {
    pub name: &'static str,
    pub accepts: AcceptedKinds,
}

impl InputDescriptor {
    pub const fn new(name: &'static str, accepts: AcceptedKinds) -> Self {
        Self { name, accepts }
    }

    pub const fn of(name: &'static str, kind: ValueKind) -> Self {
        Self {
            name,
            accepts: AcceptedKinds::only(kind),
        }
    }
}

/// Static descriptor for an output port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputDescriptor {
    pub name: &'static str,
    pub produces: ValueKind,
}

impl OutputDescriptor {
    pub const fn new(name: &'static str, produces: ValueKind) -> Self {
        Self { name, produces }
    }
}

/// A directed edge from one output to one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub from: OutputId,
    pub to: InputId,
}

/// Runtime state of an input port.
///
/// Holds at most one incoming connection. The visible value is the one
/// mirrored from the source output while connected, the local default
/// otherwise.
#[derive(Debug, Clone)]
pub struct InputPort {
    pub descriptor: InputDescriptor,
    pub(crate) source: Option<OutputId>,
    pub(crate) default: Option<PortValue>,
    pub(crate) mirrored: Option<PortValue>,
}

impl InputPort {
    pub fn new(descriptor: InputDescriptor) -> Self {
        Self {
            descriptor,
            source: None,
            default: None,
            mirrored: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn accepts(&self) -> AcceptedKinds {
        self.descriptor.accepts
    }

    /// The output feeding this input, if connected.
    pub fn source(&self) -> Option<OutputId> {
        self.source
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    pub fn default_value(&self) -> Option<&PortValue> {
        self.default.as_ref()
    }

    /// Currently available value: mirrored while connected, default otherwise.
    pub fn value(&self) -> Option<&PortValue> {
        if self.source.is_some() {
            self.mirrored.as_ref()
        } else {
            self.default.as_ref()
        }
    }
}

/// Runtime state of an output port.
#[derive(Debug, Clone)]
pub struct OutputPort {
    pub descriptor: OutputDescriptor,
    pub(crate) targets: Vec<InputId>,
    pub(crate) value: Option<PortValue>,
}

impl OutputPort {
    pub fn new(descriptor: OutputDescriptor) -> Self {
        Self {
            descriptor,
            targets: Vec::new(),
            value: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn produces(&self) -> ValueKind {
        self.descriptor.produces
    }

    /// Inputs fed by this output, in connection order.
    pub fn targets(&self) -> &[InputId] {
        &self.targets
    }

    /// Last value produced.
    pub fn value(&self) -> Option<&PortValue> {
        self.value.as_ref()
    }
}
