//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod nodes;

use std::time::Duration;
use tickgraph::{Engine, EngineConfig, PoolConfig};

/// Create a test timeout duration
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Engine with a small pool so budget effects show up quickly
pub fn test_engine() -> Engine {
    Engine::new(EngineConfig {
        pool: PoolConfig::with_budget(1 << 20),
        ..EngineConfig::default()
    })
}

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}
