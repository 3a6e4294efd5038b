//! Tracing subscriber setup.

use crate::config::LoggingConfig;
use crate::error::{EngineError, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured filter is used.
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| EngineError::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| EngineError::Config(format!("Failed to install subscriber: {}", e)))
}
