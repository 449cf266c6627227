//! Reusable encode buffers.
//!
//! Each encode checks a buffer out for its own exclusive use and the guard
//! returns it on drop, so no two concurrent encodes ever write into the
//! same buffer.

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

/// Buffers that grew beyond this are dropped instead of pooled.
const MAX_RETAINED_CAPACITY: usize = 256 * 1024;

/// A bounded pool of string buffers.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<String>>,
    capacity: usize,
}

impl BufferPool {
    /// Creates a pool that keeps at most `capacity` idle buffers.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Takes an empty buffer, allocating one if the pool is drained.
    pub fn checkout(&self) -> PooledBuffer<'_> {
        let buffer = self.buffers.lock().pop().unwrap_or_default();
        PooledBuffer {
            pool: self,
            buffer,
        }
    }

    /// Number of idle buffers.
    #[must_use]
    pub fn idle(&self) -> usize {
        self.buffers.lock().len()
    }

    fn checkin(&self, mut buffer: String) {
        if buffer.capacity() > MAX_RETAINED_CAPACITY {
            return;
        }
        buffer.clear();
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.capacity {
            buffers.push(buffer);
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(32)
    }
}

/// A checked-out buffer, returned to its pool on drop.
#[derive(Debug)]
pub struct PooledBuffer<'p> {
    pool: &'p BufferPool,
    buffer: String,
}

impl Deref for PooledBuffer<'_> {
    type Target = String;

    fn deref(&self) -> &String {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut String {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.checkin(std::mem::take(&mut self.buffer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_returns_cleared_buffer() {
        let pool = BufferPool::new(2);
        {
            let mut buffer = pool.checkout();
            buffer.push_str("{\"a\":1}");
        }
        assert_eq!(pool.idle(), 1);
        let buffer = pool.checkout();
        assert!(buffer.is_empty());
        assert!(buffer.capacity() >= 7);
        assert_eq!(pool.idle(), 0);
    }

    #[test]
    fn test_pool_is_bounded() {
        let pool = BufferPool::new(1);
        let first = pool.checkout();
        let second = pool.checkout();
        drop(first);
        drop(second);
        assert_eq!(pool.idle(), 1);
    }

    #[test]
    fn test_concurrent_checkouts_are_distinct() {
        let pool = BufferPool::new(4);
        std::thread::scope(|scope| {
            for i in 0..4 {
                let pool = &pool;
                scope.spawn(move || {
                    let mut buffer = pool.checkout();
                    buffer.push_str(&i.to_string());
                    assert_eq!(buffer.as_str(), i.to_string());
                });
            }
        });
        assert!(pool.idle() <= 4);
    }
}
