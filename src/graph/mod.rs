//! Node-graph dataflow engine.
//!
//! Typed nodes are wired output → input into a directed graph. Each tick
//! the scheduler walks the graph in dependency order and re-evaluates only
//! the nodes the dirty cache reports as stale.
//!
//! # Architecture
//!
//! ```text
//! [Constant] ──► [SolidImage] ──► [Passthrough]
//!                              └──► [custom NodeProcessor]
//! ```
//!
//! # Design
//!
//! - **Slot arena**: `Vec<Option<NodeSlot>>` with `NodeId` as index; ids are never reused.
//! - **Single incoming edge**: connecting an input replaces its previous source.
//! - **Enum dispatch**: `BuiltinNode` for built-ins, `NodeProcessor` trait objects for the rest.
//! - **Staged outputs**: a failing `process` leaves its outputs untouched.
//! - **Pooled images**: pixel storage is rented from the engine's `BufferPool`.
//! - **Dedicated thread**: `EngineBridge` drives an engine over crossbeam channels.

pub mod bridge;
pub mod dirty;
pub mod engine;
pub mod id;
pub mod model;
pub mod node;
pub mod nodes;
pub mod port;
pub mod scheduler;
pub mod value;

pub use bridge::{EngineBridge, EngineCommand, EngineMessage, EngineRunner};
pub use dirty::{DirtyTracker, EvalState};
pub use engine::Engine;
pub use id::{InputId, NodeId, OutputId, PortId};
pub use model::{Graph, NodeSlot};
pub use node::{AnyNode, BuiltinNode, DrawRegion, NodeProcessor, ProcessContext};
pub use nodes::{ConstantNode, PassthroughNode, SolidImageNode};
pub use port::{Connection, InputDescriptor, InputPort, OutputDescriptor, OutputPort};
pub use scheduler::{PassReport, Scheduler};
pub use value::{AcceptedKinds, FormatDescriptor, ImageFrame, PixelLayout, PortValue, ValueKind};
