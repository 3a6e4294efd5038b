//! Engine settings sections
//!
//! Each section maps to a table in the engine's TOML configuration file.
//! Every field has a default so partial files load cleanly.
//!
//! # Main Types
//!
//! - [`PoolConfig`] - Buffer pool budget and bucket depth
//! - [`SchedulerConfig`] - Tick rate and cycle policy
//! - [`LoggingConfig`] - Tracing filter directives

use serde::{Deserialize, Serialize};

/// Default pooled-memory budget (512 MiB)
pub const DEFAULT_POOL_BUDGET_BYTES: usize = 512 * 1024 * 1024;

/// Default number of idle buffers kept per size bucket
pub const DEFAULT_MAX_BUCKET_DEPTH: usize = 20;

/// Default tick rate in Hz for the threaded driver
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

/// Default tracing filter
pub const DEFAULT_LOG_FILTER: &str = "info,tickgraph=debug";

/// Buffer pool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Hard ceiling on bytes outstanding (rented + idle)
    pub budget_bytes: usize,

    /// Maximum idle buffers retained per exact size
    pub max_bucket_depth: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            budget_bytes: DEFAULT_POOL_BUDGET_BYTES,
            max_bucket_depth: DEFAULT_MAX_BUCKET_DEPTH,
        }
    }
}

impl PoolConfig {
    /// Pool with the given budget and the default bucket depth
    pub fn with_budget(budget_bytes: usize) -> Self {
        Self {
            budget_bytes,
            ..Self::default()
        }
    }
}

/// Scheduler and tick-driver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ticks per second when driven by `EngineBridge`. 0 runs unthrottled.
    pub tick_rate_hz: u32,

    /// Refuse connections that would close a cycle.
    ///
    /// When false, cycles are accepted and their nodes are never evaluated.
    pub reject_cycles: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            reject_cycles: false,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}
