// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! [`SyncBufferedSubscriber`]: the lock-protected fast path for downstreams
//! whose `on_next` is known to resolve synchronously, skipping the
//! trampoline/executor indirection [`crate::BufferedSubscriber`] pays for to
//! support asynchronous acks.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use conflux_core::sync::Mutex;
use conflux_core::{Ack, AckValue, Observer, OverflowStrategy};
use conflux_error::ConfluxError;

use crate::buffered_subscriber::Queue;
use crate::config::BufferedSubscriberConfig;

struct Inner<T> {
    downstream: Arc<dyn Observer<T>>,
    strategy: OverflowStrategy<T>,
    queue: Queue<T>,
    /// Serializes producers: whichever thread holds this lock owns draining
    /// the buffer until empty before returning. No separate consumer loop
    /// exists in this fast path — the calling producer *is* the consumer.
    lock: Mutex<()>,
    dropped_count: AtomicUsize,
    terminated: AtomicBool,
}

impl<T: Send + 'static> Inner<T> {
    /// Drains the buffer under the caller's lock guard until empty or the
    /// downstream stops. Must only be called while holding `lock`.
    fn drain_locked(&self) {
        loop {
            if self.strategy.signals_drops() {
                let dropped = self.dropped_count.swap(0, Ordering::AcqRel);
                if dropped > 0 {
                    if let Some(signal) = self.strategy.build_signal(dropped) {
                        if !self.deliver(signal) {
                            return;
                        }
                        continue;
                    }
                }
            }

            self.queue.fence_poll();
            match self.queue.poll() {
                Some(item) => {
                    if !self.deliver(item) {
                        return;
                    }
                }
                None => return,
            }
        }
    }

    /// Delivers one item downstream. Returns `false` once the downstream has
    /// stopped, so the caller can abandon the rest of the buffer.
    fn deliver(&self, item: T) -> bool {
        match self.downstream.on_next(item).try_resolved() {
            Some(AckValue::Stop) => {
                self.terminated.store(true, Ordering::Release);
                false
            }
            Some(AckValue::Continue) => true,
            None => {
                crate::warn!(
                    "synchronous BufferedSubscriber fast path received a pending Ack; \
                     treating it as Continue. Use the trampolined BufferedSubscriber for \
                     downstreams that can suspend"
                );
                true
            }
        }
    }

    fn on_next(self: &Arc<Self>, value: T) -> Ack {
        if self.terminated.load(Ordering::Acquire) {
            return Ack::Stop;
        }
        let _guard = self.lock.lock();
        if self.terminated.load(Ordering::Acquire) {
            return Ack::Stop;
        }

        match &self.strategy {
            OverflowStrategy::Unbounded => {
                let _ = self.queue.offer(value);
            }
            OverflowStrategy::Fail(capacity) => {
                if self.queue.offer(value).is_err() {
                    self.terminated.store(true, Ordering::Release);
                    self.downstream
                        .on_error(ConfluxError::buffer_overflow(*capacity));
                    return Ack::Stop;
                }
            }
            OverflowStrategy::BackPressure(_) => {
                if self.queue.offer(value).is_err() {
                    // This fast path has no independent consumer loop for a
                    // suspended producer to wait on, so a full buffer here
                    // cannot honor the BackPressure liveness guarantee the
                    // trampolined BufferedSubscriber provides.
                    self.terminated.store(true, Ordering::Release);
                    self.downstream.on_error(ConfluxError::protocol_violation(
                        "BackPressure has no liveness guarantee on the synchronous \
                         fast path; use the trampolined BufferedSubscriber instead",
                    ));
                    return Ack::Stop;
                }
            }
            OverflowStrategy::DropNew(_) | OverflowStrategy::DropNewAndSignal(..) => {
                if self.queue.offer(value).is_err() {
                    self.dropped_count.fetch_add(1, Ordering::AcqRel);
                }
            }
            OverflowStrategy::DropOld(_) | OverflowStrategy::DropOldAndSignal(..) => {
                if let Err(rejected) = self.queue.offer(value) {
                    let _ = self.queue.poll();
                    self.dropped_count.fetch_add(1, Ordering::AcqRel);
                    let _ = self.queue.offer(rejected);
                }
            }
            OverflowStrategy::ClearBuffer(_) | OverflowStrategy::ClearBufferAndSignal(..) => {
                if let Err(rejected) = self.queue.offer(value) {
                    let cleared = self.queue.clear();
                    self.dropped_count.fetch_add(cleared, Ordering::AcqRel);
                    let _ = self.queue.offer(rejected);
                }
            }
        }

        self.drain_locked();
        if self.terminated.load(Ordering::Acquire) {
            Ack::Stop
        } else {
            Ack::Continue
        }
    }

    fn on_error(self: &Arc<Self>, error: ConfluxError) {
        let _guard = self.lock.lock();
        self.drain_locked();
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        self.downstream.on_error(error);
    }

    fn on_complete(self: &Arc<Self>) {
        let _guard = self.lock.lock();
        self.drain_locked();
        if self.terminated.swap(true, Ordering::AcqRel) {
            return;
        }
        self.downstream.on_complete();
    }
}

/// Linearizes producer calls behind a `parking_lot::Mutex` rather than a
/// trampolined consumer loop. Use this only for downstreams whose `on_next`
/// always resolves to `Continue`/`Stop` synchronously — an downstream that
/// ever returns `Ack::Pending` breaks the non-blocking assumption this type
/// makes and only gets a lenient, logged fallback, not correct backpressure.
pub struct SyncBufferedSubscriber<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for SyncBufferedSubscriber<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static> SyncBufferedSubscriber<T> {
    /// Build a new synchronous buffered subscriber in front of `downstream`.
    #[must_use]
    pub fn new(
        downstream: Arc<dyn Observer<T>>,
        strategy: OverflowStrategy<T>,
        config: BufferedSubscriberConfig,
    ) -> Self {
        let queue = Queue::for_strategy(&strategy, config.buffer_chunk_size);
        Self {
            inner: Arc::new(Inner {
                downstream,
                strategy,
                queue,
                lock: Mutex::new(()),
                dropped_count: AtomicUsize::new(0),
                terminated: AtomicBool::new(false),
            }),
        }
    }
}

impl<T: Send + 'static> Observer<T> for SyncBufferedSubscriber<T> {
    fn on_next(&self, item: T) -> Ack {
        self.inner.on_next(item)
    }

    fn on_error(&self, error: ConfluxError) {
        self.inner.on_error(error);
    }

    fn on_complete(&self) {
        self.inner.on_complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_test_utils::RecordingObserver;

    #[test]
    fn delivers_items_in_order_without_an_executor() {
        let downstream = Arc::new(RecordingObserver::<u32>::new());
        let subscriber = SyncBufferedSubscriber::new(
            downstream.clone(),
            OverflowStrategy::Unbounded,
            BufferedSubscriberConfig::default(),
        );
        assert!(matches!(subscriber.on_next(1), Ack::Continue));
        assert!(matches!(subscriber.on_next(2), Ack::Continue));
        subscriber.on_complete();
        assert_eq!(downstream.items(), vec![1, 2]);
        assert!(downstream.is_completed());
    }

    #[test]
    fn fail_strategy_reports_overflow_and_stops() {
        let downstream = Arc::new(RecordingObserver::<u32>::new());
        let subscriber = SyncBufferedSubscriber::new(
            downstream.clone(),
            OverflowStrategy::Fail(2),
            BufferedSubscriberConfig::default(),
        );
        subscriber.inner.queue.offer(1).expect("room for first item");
        subscriber.inner.queue.offer(2).expect("room for second item");

        assert!(matches!(subscriber.on_next(3), Ack::Stop));
        downstream.with_error(|error| {
            assert!(matches!(
                error,
                Some(ConfluxError::BufferOverflow { capacity: 2 })
            ));
        });
    }

    #[test]
    fn downstream_stop_halts_further_delivery() {
        let downstream = Arc::new(RecordingObserver::<u32>::with_stop_after(2));
        let subscriber = SyncBufferedSubscriber::new(
            downstream.clone(),
            OverflowStrategy::Unbounded,
            BufferedSubscriberConfig::default(),
        );
        assert!(matches!(subscriber.on_next(1), Ack::Continue));
        assert!(matches!(subscriber.on_next(2), Ack::Stop));
        assert!(matches!(subscriber.on_next(3), Ack::Stop));
        assert_eq!(downstream.items(), vec![1, 2]);
    }

    #[test]
    fn backpressure_is_a_protocol_violation_on_the_sync_path() {
        let downstream = Arc::new(RecordingObserver::<u32>::new());
        let subscriber = SyncBufferedSubscriber::new(
            downstream.clone(),
            OverflowStrategy::BackPressure(1),
            BufferedSubscriberConfig::default(),
        );
        subscriber.inner.queue.offer(1).expect("room for first item");
        assert!(matches!(subscriber.on_next(2), Ack::Stop));
        downstream.with_error(|error| {
            assert!(matches!(error, Some(ConfluxError::ProtocolViolation { .. })));
        });
    }
}
