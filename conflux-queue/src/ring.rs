// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A Vyukov-style sequence-stamped bounded ring buffer.
//!
//! Each slot carries its own sequence number instead of relying solely on
//! the head/tail cursors, so producers and consumers only ever contend on
//! their own cursor plus the one slot they are touching. Correct for any
//! producer/consumer multiplicity; [`crate::queue::ConcurrentQueue`] picks
//! the cheaper single-sided path when [`ChannelType`](conflux_core::ChannelType)
//! says only one thread ever sits on that side.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{fence, AtomicUsize, Ordering};

struct Slot<T> {
    sequence: AtomicUsize,
    value: UnsafeCell<MaybeUninit<T>>,
}

/// A fixed-capacity lock-free ring buffer, capacity rounded up to a power of two.
pub struct Ring<T> {
    buffer: Box<[Slot<T>]>,
    mask: usize,
    enqueue_pos: AtomicUsize,
    dequeue_pos: AtomicUsize,
}

unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Build a ring holding at least `capacity` elements (rounded up to the
    /// next power of two, minimum 2).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two().max(2);
        let buffer: Box<[Slot<T>]> = (0..capacity)
            .map(|i| Slot {
                sequence: AtomicUsize::new(i),
                value: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect();
        Self {
            buffer,
            mask: capacity - 1,
            enqueue_pos: AtomicUsize::new(0),
            dequeue_pos: AtomicUsize::new(0),
        }
    }

    /// Declared capacity (a power of two).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.mask + 1
    }

    /// Multi-producer-safe offer: always self-synchronizing via CAS.
    ///
    /// Returns `Err(value)` if the ring is full.
    pub fn offer_multi(&self, value: T) -> Result<(), T> {
        let mut pos = self.enqueue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;
            match diff.cmp(&0) {
                std::cmp::Ordering::Equal => {
                    match self.enqueue_pos.compare_exchange_weak(
                        pos,
                        pos.wrapping_add(1),
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            unsafe { (*slot.value.get()).write(value) };
                            slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
                            return Ok(());
                        }
                        Err(current) => pos = current,
                    }
                }
                std::cmp::Ordering::Less => return Err(value),
                std::cmp::Ordering::Greater => pos = self.enqueue_pos.load(Ordering::Relaxed),
            }
        }
    }

    /// Single-producer offer: no CAS, relies on the caller being the only
    /// producer and calling [`Self::fence_offer`] on any cross-thread handoff.
    ///
    /// Returns `Err(value)` if the ring is full.
    pub fn offer_single(&self, value: T) -> Result<(), T> {
        let pos = self.enqueue_pos.load(Ordering::Relaxed);
        let slot = &self.buffer[pos & self.mask];
        let seq = slot.sequence.load(Ordering::Acquire);
        if seq != pos {
            return Err(value);
        }
        unsafe { (*slot.value.get()).write(value) };
        slot.sequence.store(pos.wrapping_add(1), Ordering::Release);
        self.enqueue_pos.store(pos.wrapping_add(1), Ordering::Relaxed);
        Ok(())
    }

    /// Multi-consumer-safe poll: always self-synchronizing via CAS.
    pub fn poll_multi(&self) -> Option<T> {
        let mut pos = self.dequeue_pos.load(Ordering::Relaxed);
        loop {
            let slot = &self.buffer[pos & self.mask];
            let seq = slot.sequence.load(Ordering::Acquire);
            let diff = seq as isize - (pos.wrapping_add(1)) as isize;
            match diff.cmp(&0) {
                std::cmp::Ordering::Equal => {
                    match self.dequeue_pos.compare_exchange_weak(
                        pos,
                        pos.wrapping_add(1),
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => {
                            let value = unsafe { (*slot.value.get()).assume_init_read() };
                            slot.sequence
                                .store(pos.wrapping_add(self.mask + 1), Ordering::Release);
                            return Some(value);
                        }
                        Err(current) => pos = current,
                    }
                }
                std::cmp::Ordering::Less => return None,
                std::cmp::Ordering::Greater => pos = self.dequeue_pos.load(Ordering::Relaxed),
            }
        }
    }

    /// Single-consumer poll: no CAS, relies on the caller being the only
    /// consumer and calling [`Self::fence_poll`] on any cross-thread handoff.
    pub fn poll_single(&self) -> Option<T> {
        let pos = self.dequeue_pos.load(Ordering::Relaxed);
        let slot = &self.buffer[pos & self.mask];
        let seq = slot.sequence.load(Ordering::Acquire);
        if seq != pos.wrapping_add(1) {
            return None;
        }
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.sequence
            .store(pos.wrapping_add(self.mask + 1), Ordering::Release);
        self.dequeue_pos.store(pos.wrapping_add(1), Ordering::Relaxed);
        Some(value)
    }

    /// `true` if the ring currently holds no elements.
    ///
    /// Best-effort under concurrent access: a `true` result can be stale by
    /// the time the caller observes it.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let enqueue = self.enqueue_pos.load(Ordering::Acquire);
        let dequeue = self.dequeue_pos.load(Ordering::Acquire);
        enqueue == dequeue
    }

    /// A full barrier, issued by single-sided producers before handing the
    /// ring to another thread. Self-synchronizing (multi-sided) callers
    /// never need this; calling it anyway is harmless.
    pub fn fence_offer(&self) {
        fence(Ordering::SeqCst);
    }

    /// A full barrier, issued by single-sided consumers before handing the
    /// ring to another thread. Self-synchronizing (multi-sided) callers
    /// never need this; calling it anyway is harmless.
    pub fn fence_poll(&self) {
        fence(Ordering::SeqCst);
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        while self.poll_multi().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        assert_eq!(Ring::<u8>::with_capacity(5).capacity(), 8);
        assert_eq!(Ring::<u8>::with_capacity(8).capacity(), 8);
        assert_eq!(Ring::<u8>::with_capacity(0).capacity(), 2);
    }

    #[test]
    fn single_sided_offer_poll_round_trips() {
        let ring = Ring::with_capacity(4);
        assert!(ring.offer_single(1).is_ok());
        assert!(ring.offer_single(2).is_ok());
        assert_eq!(ring.poll_single(), Some(1));
        assert_eq!(ring.poll_single(), Some(2));
        assert_eq!(ring.poll_single(), None);
    }

    #[test]
    fn offer_fails_when_full() {
        let ring = Ring::with_capacity(2);
        assert!(ring.offer_multi(1).is_ok());
        assert!(ring.offer_multi(2).is_ok());
        assert_eq!(ring.offer_multi(3), Err(3));
    }

    #[test]
    fn spsc_cross_thread_preserves_all_elements() {
        use std::sync::Arc;
        let ring = Arc::new(Ring::with_capacity(16));
        let producer = ring.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..10_000_u64 {
                loop {
                    if producer.offer_single(i).is_ok() {
                        break;
                    }
                }
            }
            producer.fence_offer();
        });

        let mut sum = 0_u64;
        let mut received = 0_u64;
        while received < 10_000 {
            if let Some(v) = ring.poll_single() {
                sum += v;
                received += 1;
            }
        }
        ring.fence_poll();
        handle.join().unwrap();
        assert_eq!(sum, 10_000 * 9_999 / 2);
    }
}
