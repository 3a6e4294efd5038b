//! # tickgraph: tick-driven node-graph dataflow engine
//!
//! Users wire typed processing nodes (image and number producers and
//! transformers) into a directed graph. The engine evaluates that graph in
//! dependency order once per tick, re-evaluates only what was invalidated
//! since the last tick, and recycles large numeric buffers through a
//! budgeted pool instead of re-allocating them every frame.
//!
//! ## Architecture
//!
//! - **Graph**: nodes, typed ports and single-incoming-edge connections
//! - **Scheduler**: ready-queue topological pass, cycles left unevaluated
//! - **Dirty cache**: per-node evaluation and invalidation ticks
//! - **Pool**: size-bucketed `f32` buffers under a hard byte budget, with
//!   exclusive and shared RAII handles
//! - **Bridge**: runs an engine on its own thread behind crossbeam channels
//!
//! ## Example
//!
//! ```ignore
//! use tickgraph::{ConstantNode, Engine, EngineConfig, InputId, OutputId, PassthroughNode, ValueKind};
//!
//! let config = EngineConfig::load_or_default(tickgraph::config::CONFIG_FILE);
//! tickgraph::logging::init_tracing(&config.logging)?;
//!
//! let mut engine = Engine::new(config);
//! let a = engine.add_node(ConstantNode::new(2.0));
//! let b = engine.add_node(PassthroughNode::new(ValueKind::Scalar));
//! engine.connect(OutputId::new(a, 0), InputId::new(b, 0));
//!
//! let report = engine.tick();
//! assert_eq!(report.evaluated, vec![a, b]);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod logging;
pub mod pool;

// Re-export commonly used types
pub use config::{EngineConfig, LoggingConfig, PoolConfig, SchedulerConfig};
pub use error::{EngineError, Result, ResultExt};
pub use graph::{
    AnyNode, ConstantNode, Engine, EngineBridge, EngineCommand, EngineMessage, Graph, InputId,
    NodeId, NodeProcessor, OutputId, PassReport, PassthroughNode, PortValue, ProcessContext,
    SolidImageNode, ValueKind,
};
pub use pool::{BufferPool, PoolStats, PooledBuffer, SharedBuffer};
