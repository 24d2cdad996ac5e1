// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The growable queue backing [`OverflowStrategy::Unbounded`](conflux_core::OverflowStrategy::Unbounded).

use parking_lot::Mutex;
use std::collections::VecDeque;

/// A chunked, growable queue with no declared capacity.
///
/// Unlike [`crate::ConcurrentQueue`] this is not lock-free: `Unbounded`
/// producers never need to be rejected or throttled, so there is nothing
/// for a lock-free fast path to buy here, and a `parking_lot::Mutex`-guarded
/// `VecDeque` (itself chunked internally) is both simpler and, for this
/// access pattern, not meaningfully slower.
pub struct UnboundedQueue<T> {
    inner: Mutex<VecDeque<T>>,
    chunk_size: usize,
}

impl<T> UnboundedQueue<T> {
    /// Build an unbounded queue that reserves in increments of
    /// `chunk_size` (rounded up to a power of two).
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1).next_power_of_two();
        Self {
            inner: Mutex::new(VecDeque::with_capacity(chunk_size)),
            chunk_size,
        }
    }

    /// The configured growth chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Push `value`. Never rejects.
    pub fn offer(&self, value: T) {
        self.inner.lock().push_back(value);
    }

    /// Pop the oldest queued element, if any.
    pub fn poll(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    /// `true` if no elements are currently queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Number of elements currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Drain up to `limit` elements into `buffer`, returning the count moved.
    pub fn drain_to(&self, buffer: &mut Vec<T>, limit: usize) -> usize {
        let mut guard = self.inner.lock();
        let count = limit.min(guard.len());
        buffer.extend(guard.drain(..count));
        count
    }

    /// Drop every currently queued element, returning how many were discarded.
    pub fn clear(&self) -> usize {
        let mut guard = self.inner.lock();
        let count = guard.len();
        guard.clear();
        count
    }
}
