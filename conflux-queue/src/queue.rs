// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! [`ConcurrentQueue`]: the bounded queue type selected by [`ChannelType`].

use conflux_core::ChannelType;

use crate::ring::Ring;

/// A bounded, typed queue whose `offer`/`poll` fast path is selected once,
/// at construction, by its [`ChannelType`].
pub struct ConcurrentQueue<T> {
    ring: Ring<T>,
    channel_type: ChannelType,
}

impl<T> ConcurrentQueue<T> {
    /// Build a bounded queue of at least `capacity` elements (rounded up to
    /// a power of two) for the given producer/consumer multiplicity.
    #[must_use]
    pub fn new(capacity: usize, channel_type: ChannelType) -> Self {
        Self {
            ring: Ring::with_capacity(capacity),
            channel_type,
        }
    }

    /// The queue's shape.
    #[must_use]
    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    /// Declared capacity (a power of two).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Offer `value`. Returns `Err(value)` (the rejected element handed
    /// back) if the queue is full.
    pub fn offer(&self, value: T) -> Result<(), T> {
        if self.channel_type.producer_is_multi() {
            self.ring.offer_multi(value)
        } else {
            self.ring.offer_single(value)
        }
    }

    /// Poll one element, or `None` if the queue is currently empty.
    pub fn poll(&self) -> Option<T> {
        if self.channel_type.consumer_is_multi() {
            self.ring.poll_multi()
        } else {
            self.ring.poll_single()
        }
    }

    /// Best-effort emptiness check; see [`Ring::is_empty`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Drain up to `limit` elements into `buffer`, returning the count moved.
    pub fn drain_to(&self, buffer: &mut Vec<T>, limit: usize) -> usize {
        let mut count = 0;
        while count < limit {
            match self.poll() {
                Some(value) => {
                    buffer.push(value);
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    /// Drop every currently-queued element, returning how many were discarded.
    pub fn clear(&self) -> usize {
        let mut cleared = 0;
        while self.poll().is_some() {
            cleared += 1;
        }
        cleared
    }

    /// A full barrier for single-sided producers handing the queue to
    /// another thread. A no-op in effect (but still safe to call) when this
    /// queue's producer side is self-synchronizing.
    pub fn fence_offer(&self) {
        self.ring.fence_offer();
    }

    /// A full barrier for single-sided consumers handing the queue to
    /// another thread. A no-op in effect (but still safe to call) when this
    /// queue's consumer side is self-synchronizing.
    pub fn fence_poll(&self) {
        self.ring.fence_poll();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mpmc_offer_poll_round_trips() {
        let queue = ConcurrentQueue::new(4, ChannelType::MPMC);
        assert!(queue.offer(1).is_ok());
        assert!(queue.offer(2).is_ok());
        assert_eq!(queue.poll(), Some(1));
        assert_eq!(queue.poll(), Some(2));
        assert_eq!(queue.poll(), None);
    }

    #[test]
    fn drain_to_respects_limit() {
        let queue = ConcurrentQueue::new(8, ChannelType::SPSC);
        for i in 0..5 {
            queue.offer(i).unwrap();
        }
        let mut out = Vec::new();
        let moved = queue.drain_to(&mut out, 3);
        assert_eq!(moved, 3);
        assert_eq!(out, vec![0, 1, 2]);
        assert!(!queue.is_empty());
    }

    #[test]
    fn clear_discards_and_counts_everything() {
        let queue = ConcurrentQueue::new(8, ChannelType::MPSC);
        for i in 0..6 {
            queue.offer(i).unwrap();
        }
        assert_eq!(queue.clear(), 6);
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_rejects_offer() {
        let queue = ConcurrentQueue::new(2, ChannelType::SPMC);
        queue.offer(1).unwrap();
        queue.offer(2).unwrap();
        assert_eq!(queue.offer(3), Err(3));
    }
}
