//! Ownership handles over pooled buffers.
//!
//! - [`PooledBuffer`]: exclusive owner. Rents on construction, returns the
//!   storage to its pool on `dispose` or drop, exactly once.
//! - [`SharedBuffer`]: reference-counted owner. `add_ref` hands out another
//!   reference, `release` drops this one; the storage goes back to the pool
//!   when the last reference is released. A released handle refuses every
//!   further operation with [`EngineError::BufferReleased`].

use crate::error::{EngineError, Result};
use crate::pool::buffer_pool::BufferPool;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Exclusive handle to a pooled buffer.
pub struct PooledBuffer {
    data: Option<Vec<f32>>,
    pool: Arc<BufferPool>,
}

impl PooledBuffer {
    /// Rent `len` zeroed elements from `pool`.
    pub fn rent(pool: &Arc<BufferPool>, len: usize) -> Result<Self> {
        let data = pool.rent(len)?;
        Ok(Self {
            data: Some(data),
            pool: Arc::clone(pool),
        })
    }

    /// Number of elements, zero once disposed.
    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_disposed(&self) -> bool {
        self.data.is_none()
    }

    /// The pool this buffer returns to.
    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    pub fn as_slice(&self) -> &[f32] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        self.data.as_deref_mut().unwrap_or(&mut [])
    }

    /// Return the storage to the pool. Further calls do nothing.
    pub fn dispose(&mut self) {
        if let Some(data) = self.data.take() {
            self.pool.return_buffer(data);
        }
    }

    /// Convert into a shared handle with a reference count of one.
    pub fn into_shared(self) -> SharedBuffer {
        SharedBuffer::new(self)
    }
}

impl Deref for PooledBuffer {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        self.as_slice()
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut [f32] {
        self.as_mut_slice()
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for PooledBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledBuffer")
            .field("len", &self.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Reference-counted handle to a pooled buffer.
///
/// Cloning is equivalent to [`add_ref`](Self::add_ref) on a live handle and
/// yields another released handle on a released one.
#[derive(Clone)]
pub struct SharedBuffer {
    inner: Option<Arc<PooledBuffer>>,
}

impl SharedBuffer {
    pub fn new(buffer: PooledBuffer) -> Self {
        Self {
            inner: Some(Arc::new(buffer)),
        }
    }

    /// Rent `len` elements and wrap them in a shared handle.
    pub fn rent(pool: &Arc<BufferPool>, len: usize) -> Result<Self> {
        PooledBuffer::rent(pool, len).map(Self::new)
    }

    /// Build a shared buffer by filling a freshly rented one.
    pub fn rent_with(
        pool: &Arc<BufferPool>,
        len: usize,
        fill: impl FnOnce(&mut [f32]),
    ) -> Result<Self> {
        let mut buffer = PooledBuffer::rent(pool, len)?;
        fill(buffer.as_mut_slice());
        Ok(Self::new(buffer))
    }

    fn live(&self) -> Result<&Arc<PooledBuffer>> {
        self.inner.as_ref().ok_or(EngineError::BufferReleased)
    }

    /// Take another reference to the same storage.
    pub fn add_ref(&self) -> Result<SharedBuffer> {
        let inner = self.live()?;
        Ok(Self {
            inner: Some(Arc::clone(inner)),
        })
    }

    /// Drop this reference. The storage returns to the pool once no
    /// reference remains. Releasing twice is a no-op.
    pub fn release(&mut self) {
        self.inner = None;
    }

    pub fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    /// Live references to the storage, zero for a released handle.
    pub fn ref_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Arc::strong_count)
    }

    pub fn as_slice(&self) -> Result<&[f32]> {
        self.live().map(|inner| inner.as_slice())
    }

    pub fn len(&self) -> Result<usize> {
        self.live().map(|inner| inner.len())
    }

    /// Whether both handles point at the same storage.
    pub fn ptr_eq(&self, other: &SharedBuffer) -> bool {
        match (&self.inner, &other.inner) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Recover exclusive ownership if this is the only reference.
    pub fn try_into_exclusive(mut self) -> Result<std::result::Result<PooledBuffer, SharedBuffer>> {
        let inner = self.inner.take().ok_or(EngineError::BufferReleased)?;
        Ok(Arc::try_unwrap(inner).map_err(|inner| SharedBuffer { inner: Some(inner) }))
    }
}

impl std::fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            Some(inner) => f
                .debug_struct("SharedBuffer")
                .field("len", &inner.len())
                .field("refs", &Arc::strong_count(inner))
                .finish(),
            None => write!(f, "SharedBuffer(released)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::buffer_pool::ELEMENT_BYTES;

    fn pool() -> Arc<BufferPool> {
        Arc::new(BufferPool::with_budget(1 << 20))
    }

    #[test]
    fn test_exclusive_returns_on_drop() {
        let pool = pool();
        {
            let mut buf = PooledBuffer::rent(&pool, 32).unwrap();
            buf[0] = 1.0;
            assert_eq!(pool.stats().pooled_buffers, 0);
        }
        let stats = pool.stats();
        assert_eq!(stats.pooled_buffers, 1);
        assert_eq!(stats.bytes_outstanding, 32 * ELEMENT_BYTES);
    }

    #[test]
    fn test_exclusive_double_dispose_is_noop() {
        let pool = pool();
        let mut buf = PooledBuffer::rent(&pool, 32).unwrap();
        buf.dispose();
        buf.dispose();
        drop(buf);

        assert_eq!(pool.stats().pooled_buffers, 1);
    }

    #[test]
    fn test_exclusive_after_dispose_is_empty() {
        let pool = pool();
        let mut buf = PooledBuffer::rent(&pool, 4).unwrap();
        buf.dispose();
        assert!(buf.is_disposed());
        assert!(buf.is_empty());
        assert!(buf.as_slice().is_empty());
    }

    #[test]
    fn test_shared_returns_after_last_release() {
        let pool = pool();
        let mut a = SharedBuffer::rent(&pool, 16).unwrap();
        let mut b = a.add_ref().unwrap();
        assert_eq!(a.ref_count(), 2);
        assert!(a.ptr_eq(&b));

        a.release();
        assert_eq!(pool.stats().pooled_buffers, 0);
        assert_eq!(b.ref_count(), 1);

        b.release();
        assert_eq!(pool.stats().pooled_buffers, 1);
    }

    #[test]
    fn test_shared_double_release_is_noop() {
        let pool = pool();
        let mut a = SharedBuffer::rent(&pool, 16).unwrap();
        let b = a.add_ref().unwrap();

        a.release();
        a.release();
        assert_eq!(b.ref_count(), 1);
        assert_eq!(pool.stats().pooled_buffers, 0);
    }

    #[test]
    fn test_released_handle_fails_fast() {
        let pool = pool();
        let mut a = SharedBuffer::rent(&pool, 16).unwrap();
        a.release();

        assert!(matches!(a.add_ref(), Err(EngineError::BufferReleased)));
        assert!(matches!(a.as_slice(), Err(EngineError::BufferReleased)));
        assert!(matches!(a.len(), Err(EngineError::BufferReleased)));
        assert_eq!(a.ref_count(), 0);
        assert!(a.clone().is_released());
    }

    #[test]
    fn test_rent_with_fills() {
        let pool = pool();
        let shared = SharedBuffer::rent_with(&pool, 4, |data| data.fill(0.5)).unwrap();
        assert_eq!(shared.as_slice().unwrap(), &[0.5; 4]);
    }

    #[test]
    fn test_try_into_exclusive() {
        let pool = pool();
        let a = SharedBuffer::rent(&pool, 8).unwrap();
        let b = a.add_ref().unwrap();

        let a = a.try_into_exclusive().unwrap().unwrap_err();
        drop(b);
        let exclusive = a.try_into_exclusive().unwrap().unwrap();
        assert_eq!(exclusive.len(), 8);
    }
}
