//! Identity types for the graph.
//!
//! `NodeId` is a direct index into the graph's slot arena. Removing a node
//! empties its slot; ids are never reused, so a stale id simply stops
//! resolving. Port ids pack the owning node and the port index into one
//! `u64`.

use std::fmt;

/// Index into `Graph` slots.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "NodeId(INVALID)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Port identifier. High 32 bits = node index, low 32 bits = port index.
/// Every `NodeId` fits, so ids stay unambiguous however many nodes were ever added.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId(pub u64);

impl PortId {
    const PORT_BITS: u32 = 32;
    const PORT_MASK: u64 = (1 << Self::PORT_BITS) - 1;

    /// Number of ports a node may declare in one direction.
    pub const MAX_PORTS: usize = u16::MAX as usize + 1;

    pub fn new(node: NodeId, port_index: u16) -> Self {
        Self(((node.0 as u64) << Self::PORT_BITS) | port_index as u64)
    }

    #[inline]
    pub fn node(self) -> NodeId {
        NodeId((self.0 >> Self::PORT_BITS) as u32)
    }

    #[inline]
    pub fn port_index(self) -> u16 {
        (self.0 & Self::PORT_MASK) as u16
    }
}

impl fmt::Debug for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PortId(node={}, port={})",
            self.node().0,
            self.port_index()
        )
    }
}

/// An input port: node plus input index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputId(pub PortId);

impl InputId {
    pub fn new(node: NodeId, index: u16) -> Self {
        Self(PortId::new(node, index))
    }

    #[inline]
    pub fn node(self) -> NodeId {
        self.0.node()
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0.port_index() as usize
    }
}

impl fmt::Debug for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.in[{}]", self.node().0, self.index())
    }
}

/// An output port: node plus output index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct OutputId(pub PortId);

impl OutputId {
    pub fn new(node: NodeId, index: u16) -> Self {
        Self(PortId::new(node, index))
    }

    #[inline]
    pub fn node(self) -> NodeId {
        self.0.node()
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0.port_index() as usize
    }
}

impl fmt::Debug for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.out[{}]", self.node().0, self.index())
    }
}
