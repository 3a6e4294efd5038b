//! Budgeted buffer pooling.
//!
//! Large numeric buffers (image planes, sample blocks) are rented from a
//! [`BufferPool`] instead of allocated every tick. Nodes normally hold them
//! through [`PooledBuffer`] or [`SharedBuffer`], which give the storage back
//! when dropped.

pub mod buffer_pool;
pub mod handle;

pub use buffer_pool::{bytes_for, BufferPool, PoolStats, ELEMENT_BYTES};
pub use handle::{PooledBuffer, SharedBuffer};
