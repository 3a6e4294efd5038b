//! Budgeted pool of reusable `f32` buffers.
//!
//! Buffers are bucketed by exact element count. The pool tracks every byte
//! it has handed out or is holding idle against a fixed budget; a rent that
//! would exceed the budget first empties every bucket, and fails only if
//! the request still does not fit.
//!
//! All operations take a single lock, so the pool can be shared across
//! threads behind an `Arc`.

use crate::config::PoolConfig;
use crate::error::{EngineError, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Size of one pooled element in bytes.
pub const ELEMENT_BYTES: usize = std::mem::size_of::<f32>();

/// Byte footprint of a buffer holding `len` elements.
#[inline]
pub fn bytes_for(len: usize) -> usize {
    len.saturating_mul(ELEMENT_BYTES)
}

/// Read-only snapshot of pool state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Bytes rented out plus bytes idle in buckets
    pub bytes_outstanding: usize,
    /// Configured ceiling
    pub budget_bytes: usize,
    /// Idle buffers across all buckets
    pub pooled_buffers: usize,
    /// Number of distinct sizes with a bucket
    pub buckets: usize,
    /// `bytes_outstanding / budget_bytes`
    pub pressure: f64,
    /// Rents served from a bucket
    pub rent_hits: u64,
    /// Rents that allocated
    pub rent_misses: u64,
    /// Forced cleanups run so far
    pub cleanups: u64,
}

impl PoolStats {
    /// Percentage of rents served without allocating
    pub fn hit_rate(&self) -> f64 {
        let total = self.rent_hits + self.rent_misses;
        if total == 0 {
            return 0.0;
        }
        (self.rent_hits as f64) / (total as f64) * 100.0
    }
}

#[derive(Default)]
struct PoolState {
    buckets: HashMap<usize, Vec<Vec<f32>>>,
    bytes_outstanding: usize,
    rent_hits: u64,
    rent_misses: u64,
    cleanups: u64,
}

impl PoolState {
    /// Drop every idle buffer. Returns the bytes released.
    fn drain_buckets(&mut self) -> usize {
        let mut freed = 0usize;
        for (len, bucket) in self.buckets.drain() {
            freed += bytes_for(len) * bucket.len();
        }
        self.bytes_outstanding = self.bytes_outstanding.saturating_sub(freed);
        self.cleanups += 1;
        freed
    }
}

/// Thread-safe pool of numeric buffers under a hard memory budget.
pub struct BufferPool {
    state: Mutex<PoolState>,
    budget_bytes: usize,
    max_bucket_depth: usize,
}

impl BufferPool {
    /// Create a pool from its configuration
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            budget_bytes: config.budget_bytes,
            max_bucket_depth: config.max_bucket_depth,
        }
    }

    /// Create a pool with the given budget and default bucket depth
    pub fn with_budget(budget_bytes: usize) -> Self {
        Self::new(&PoolConfig::with_budget(budget_bytes))
    }

    pub fn budget_bytes(&self) -> usize {
        self.budget_bytes
    }

    pub fn max_bucket_depth(&self) -> usize {
        self.max_bucket_depth
    }

    // Poisoning is ignored: every update leaves the state consistent.
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rent a zeroed buffer of exactly `len` elements.
    ///
    /// Reuses an idle buffer of the same size when one exists. Otherwise
    /// allocates, running [`force_cleanup`](Self::force_cleanup) first if the
    /// allocation would exceed the budget. Fails with
    /// [`EngineError::OutOfMemory`] when cleanup does not free enough.
    pub fn rent(&self, len: usize) -> Result<Vec<f32>> {
        let mut state = self.lock();

        if let Some(bucket) = state.buckets.get_mut(&len) {
            if let Some(buffer) = bucket.pop() {
                if bucket.is_empty() {
                    state.buckets.remove(&len);
                }
                state.rent_hits += 1;
                return Ok(buffer);
            }
        }

        let requested = bytes_for(len);
        if state.bytes_outstanding.saturating_add(requested) > self.budget_bytes {
            let freed = state.drain_buckets();
            tracing::info!(
                "Buffer pool over budget renting {} bytes, forced cleanup freed {} bytes",
                requested,
                freed
            );

            if state.bytes_outstanding.saturating_add(requested) > self.budget_bytes {
                tracing::error!(
                    "Buffer pool exhausted: {} bytes requested, {} of {} outstanding",
                    requested,
                    state.bytes_outstanding,
                    self.budget_bytes
                );
                return Err(EngineError::OutOfMemory {
                    requested_bytes: requested,
                    outstanding_bytes: state.bytes_outstanding,
                    budget_bytes: self.budget_bytes,
                });
            }
        }

        state.bytes_outstanding += requested;
        state.rent_misses += 1;
        Ok(vec![0.0; len])
    }

    /// Give a buffer back to the pool.
    ///
    /// The contents are zeroed. The buffer joins the bucket for its length
    /// unless that bucket already holds `max_bucket_depth` buffers, in which
    /// case it is freed and its bytes leave the outstanding total.
    ///
    /// Only buffers obtained from [`rent`](Self::rent) on this pool, with
    /// their length unchanged, may be returned.
    pub fn return_buffer(&self, mut buffer: Vec<f32>) {
        buffer.fill(0.0);
        let len = buffer.len();

        let mut guard = self.lock();
        let state = &mut *guard;
        let depth = state.buckets.get(&len).map_or(0, Vec::len);
        if depth < self.max_bucket_depth {
            state.buckets.entry(len).or_default().push(buffer);
        } else {
            drop(buffer);
            state.bytes_outstanding = state.bytes_outstanding.saturating_sub(bytes_for(len));
        }
    }

    /// Free every idle buffer. Returns the number of bytes released.
    ///
    /// Rented buffers are unaffected. This is a pressure valve; `rent`
    /// calls it automatically when the budget would be exceeded.
    pub fn force_cleanup(&self) -> usize {
        let freed = self.lock().drain_buckets();
        tracing::info!("Buffer pool cleanup freed {} bytes", freed);
        freed
    }

    /// Snapshot of the current pool state
    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        let pooled_buffers = state.buckets.values().map(Vec::len).sum();
        let pressure = if self.budget_bytes == 0 {
            0.0
        } else {
            state.bytes_outstanding as f64 / self.budget_bytes as f64
        };

        PoolStats {
            bytes_outstanding: state.bytes_outstanding,
            budget_bytes: self.budget_bytes,
            pooled_buffers,
            buckets: state.buckets.len(),
            pressure,
            rent_hits: state.rent_hits,
            rent_misses: state.rent_misses,
            cleanups: state.cleanups,
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("budget_bytes", &self.budget_bytes)
            .field("max_bucket_depth", &self.max_bucket_depth)
            .finish()
    }
}
