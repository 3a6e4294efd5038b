//! Error handling for the tickgraph engine
//!
//! This module defines the crate-wide error type and a Result alias.
//! Illegal connections are not errors: `can_connect`/`connect` report them
//! as booleans. Everything that can actually fail at a call boundary
//! (pool exhaustion, released handles, bad configuration) lands here.

use crate::graph::id::NodeId;
use thiserror::Error;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// The buffer pool could not satisfy a rent even after forced cleanup
    #[error(
        "Out of pooled memory: requested {requested_bytes} bytes with {outstanding_bytes} of {budget_bytes} bytes outstanding"
    )]
    OutOfMemory {
        requested_bytes: usize,
        outstanding_bytes: usize,
        budget_bytes: usize,
    },

    /// An operation was attempted on a shared buffer handle after release
    #[error("Shared buffer handle used after release")]
    BufferReleased,

    /// The node handle does not refer to a live node
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    /// The port index is out of range for the node
    #[error("Unknown port {index} on node {node:?}")]
    UnknownPort { node: NodeId, index: usize },

    /// A node's processing step failed
    #[error("Node {node:?} error: {message}")]
    Node { node: NodeId, message: String },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The engine thread is gone
    #[error("Channel send error")]
    ChannelSend,

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a node error from any displayable message
    pub fn node(node: NodeId, message: impl Into<String>) -> Self {
        EngineError::Node {
            node,
            message: message.into(),
        }
    }

    /// Whether this error (or the error it wraps) is pool exhaustion
    pub fn is_out_of_memory(&self) -> bool {
        match self {
            EngineError::OutOfMemory { .. } => true,
            EngineError::WithContext { source, .. } => source.is_out_of_memory(),
            _ => false,
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
