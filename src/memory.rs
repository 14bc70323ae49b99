//! The memory arena abstraction used for decoded output.
//!
//! The deserializer allocates every value, offset and byte buffer of its output
//! columns through a `MemoryPool`. The serializer never allocates; it writes
//! into caller-owned buffers.
//!
//! Thread-safety is the pool's own business: the trait does not require
//! `Sync`, so a non-thread-safe pool simply cannot be shared across threads.

use std::sync::atomic::{AtomicUsize, Ordering};

use arrow::buffer::MutableBuffer;

/// Hands out zero-length buffers with at least `bytes` of capacity.
pub trait MemoryPool {
    fn allocate(&self, bytes: usize) -> MutableBuffer;
}

/// A stateless pool backed by the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPool;

impl MemoryPool for SystemPool {
    fn allocate(&self, bytes: usize) -> MutableBuffer {
        MutableBuffer::with_capacity(bytes)
    }
}

/// A pool that records how many bytes were requested through it.
///
/// This is logical accounting only; it does not observe the allocator.
#[derive(Debug, Default)]
pub struct TrackingPool {
    requested: AtomicUsize,
    allocations: AtomicUsize,
    largest: AtomicUsize,
}

impl TrackingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes requested since creation.
    pub fn requested_bytes(&self) -> usize {
        self.requested.load(Ordering::Relaxed)
    }

    pub fn allocation_count(&self) -> usize {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Largest single request seen.
    pub fn largest_allocation(&self) -> usize {
        self.largest.load(Ordering::Relaxed)
    }
}

impl MemoryPool for TrackingPool {
    fn allocate(&self, bytes: usize) -> MutableBuffer {
        self.requested.fetch_add(bytes, Ordering::Relaxed);
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.largest.fetch_max(bytes, Ordering::Relaxed);
        MutableBuffer::with_capacity(bytes)
    }
}
