// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! [`BufferedSubscriber`]: linearizes concurrent producer calls into the
//! serial [`Observer`] contract under a chosen [`OverflowStrategy`].

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicIsize, AtomicUsize, Ordering};
use std::sync::Arc;

use conflux_core::{pending_ack, Ack, AckResolver, AckValue, ChannelType, Observer, OverflowStrategy};
use conflux_error::ConfluxError;
use conflux_queue::{ConcurrentQueue, UnboundedQueue};
use conflux_runtime::Executor;
use parking_lot::Mutex;

use crate::config::BufferedSubscriberConfig;
use crate::trampoline;

/// Shared between [`BufferedSubscriber`] and `buffered_sync`'s lock-protected
/// fast path: either backing store honors the same overflow-strategy
/// capacity/chunking rules, only the draining mechanism around it differs.
pub(crate) enum Queue<T> {
    Bounded(ConcurrentQueue<T>),
    Unbounded(UnboundedQueue<T>),
}

impl<T> Queue<T> {
    pub(crate) fn for_strategy(strategy: &OverflowStrategy<T>, buffer_chunk_size: usize) -> Self {
        match strategy.capacity() {
            Some(capacity) => Self::Bounded(ConcurrentQueue::new(capacity, ChannelType::MPSC)),
            None => Self::Unbounded(UnboundedQueue::new(buffer_chunk_size)),
        }
    }

    pub(crate) fn offer(&self, value: T) -> Result<(), T> {
        match self {
            Self::Bounded(q) => q.offer(value),
            Self::Unbounded(q) => {
                q.offer(value);
                Ok(())
            }
        }
    }

    pub(crate) fn poll(&self) -> Option<T> {
        match self {
            Self::Bounded(q) => q.poll(),
            Self::Unbounded(q) => q.poll(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Self::Bounded(q) => q.is_empty(),
            Self::Unbounded(q) => q.is_empty(),
        }
    }

    pub(crate) fn clear(&self) -> usize {
        match self {
            Self::Bounded(q) => q.clear(),
            Self::Unbounded(q) => q.clear(),
        }
    }

    pub(crate) fn fence_poll(&self) {
        if let Self::Bounded(q) = self {
            q.fence_poll();
        }
    }
}

enum DrainOutcome {
    Continue,
    Stopped,
    Idle,
    Pending,
}

struct Inner<T, E> {
    downstream: Arc<dyn Observer<T>>,
    strategy: OverflowStrategy<T>,
    queue: Queue<T>,
    executor: E,
    config: BufferedSubscriberConfig,

    /// Positive: items queued but not yet observed by the consumer loop.
    /// `0`: idle. `-1`: terminated and fully drained.
    items_to_push: AtomicIsize,
    upstream_is_complete: AtomicBool,
    downstream_is_done: AtomicBool,
    error_thrown: Mutex<Option<ConfluxError>>,
    dropped_count: AtomicUsize,
    /// Producers waiting under `BackPressure` for room to free up, each with
    /// its own ack — per the spec's own recommendation, one pending ack per
    /// producer rather than one shared slot that can go stale under a race
    /// between drain and overflow.
    backpressure_waiters: Mutex<VecDeque<(T, AckResolver)>>,
}

impl<T: Send + 'static, E: Executor + Clone + 'static> Inner<T, E> {
    fn schedule_consumer(self: &Arc<Self>) {
        let this = self.clone();
        let executor = self.executor.clone();
        trampoline::execute(&executor, Box::new(move || this.drain_loop()));
    }

    fn mark_terminated_if_first(&self, error: Option<ConfluxError>) -> bool {
        if self
            .upstream_is_complete
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // A terminal is already in flight; per "Stop wins" / suppressed-
            // companion policy, fold a second error into the first instead
            // of redelivering it.
            if let Some(new_error) = error {
                let mut slot = self.error_thrown.lock();
                *slot = Some(match slot.take() {
                    Some(existing) => existing.with_suppressed(new_error),
                    None => new_error,
                });
            }
            return false;
        }
        if let Some(error) = error {
            *self.error_thrown.lock() = Some(error);
        }
        true
    }

    /// The single gate a producer or a terminal event goes through to make
    /// sure a consumer loop is running: only the caller that brings
    /// `items_to_push` from `0` to `1` actually schedules one. `-1` is a
    /// distinct "terminated and drained" sentinel, not part of the idle
    /// range, so a late caller racing a finished subscriber (`previous ==
    /// -1`) must not re-trigger scheduling.
    fn wake_consumer(self: &Arc<Self>) {
        let previous = self.items_to_push.fetch_add(1, Ordering::AcqRel);
        if previous == 0 {
            self.schedule_consumer();
        }
    }

    fn on_next(self: &Arc<Self>, value: T) -> Ack {
        if self.upstream_is_complete.load(Ordering::Acquire)
            || self.downstream_is_done.load(Ordering::Acquire)
        {
            return Ack::Stop;
        }

        match &self.strategy {
            OverflowStrategy::Unbounded => {
                let _ = self.queue.offer(value);
                self.wake_consumer();
                Ack::Continue
            }
            OverflowStrategy::Fail(capacity) => match self.queue.offer(value) {
                Ok(()) => {
                    self.wake_consumer();
                    Ack::Continue
                }
                Err(_) => {
                    self.mark_terminated_if_first(Some(ConfluxError::buffer_overflow(*capacity)));
                    self.wake_consumer();
                    Ack::Stop
                }
            },
            OverflowStrategy::BackPressure(_) => match self.queue.offer(value) {
                Ok(()) => {
                    self.wake_consumer();
                    Ack::Continue
                }
                Err(rejected) => {
                    let (resolver, ack) = pending_ack();
                    self.backpressure_waiters
                        .lock()
                        .push_back((rejected, resolver));
                    ack
                }
            },
            OverflowStrategy::DropNew(_) | OverflowStrategy::DropNewAndSignal(..) => {
                match self.queue.offer(value) {
                    Ok(()) => self.wake_consumer(),
                    Err(_) => {
                        self.dropped_count.fetch_add(1, Ordering::AcqRel);
                    }
                }
                Ack::Continue
            }
            OverflowStrategy::DropOld(_) | OverflowStrategy::DropOldAndSignal(..) => {
                if let Err(rejected) = self.queue.offer(value) {
                    let _ = self.queue.poll();
                    self.dropped_count.fetch_add(1, Ordering::AcqRel);
                    let _ = self.queue.offer(rejected);
                }
                self.wake_consumer();
                Ack::Continue
            }
            OverflowStrategy::ClearBuffer(_) | OverflowStrategy::ClearBufferAndSignal(..) => {
                if let Err(rejected) = self.queue.offer(value) {
                    let cleared = self.queue.clear();
                    self.dropped_count.fetch_add(cleared, Ordering::AcqRel);
                    let _ = self.queue.offer(rejected);
                }
                self.wake_consumer();
                Ack::Continue
            }
        }
    }

    fn on_error(self: &Arc<Self>, error: ConfluxError) {
        if self.mark_terminated_if_first(Some(error)) {
            self.wake_consumer();
        }
    }

    fn on_complete(self: &Arc<Self>) {
        if self.mark_terminated_if_first(None) {
            self.wake_consumer();
        }
    }

    fn release_backpressure_waiters(self: &Arc<Self>) {
        if !matches!(self.strategy, OverflowStrategy::BackPressure(_)) {
            return;
        }
        loop {
            let Some((value, resolver)) = self.backpressure_waiters.lock().pop_front() else {
                return;
            };
            match self.queue.offer(value) {
                Ok(()) => {
                    self.items_to_push.fetch_add(1, Ordering::AcqRel);
                    resolver.resolve(AckValue::Continue);
                }
                Err(value) => {
                    self.backpressure_waiters
                        .lock()
                        .push_front((value, resolver));
                    return;
                }
            }
        }
    }

    /// Runs up to `config.batch_size` drain iterations synchronously, then
    /// either returns (queue empty, terminal delivered, or an async ack is
    /// outstanding) or re-submits itself through the trampoline to bound how
    /// long one call monopolizes the executing thread.
    fn drain_loop(self: Arc<Self>) {
        for _ in 0..self.config.batch_size {
            match self.drain_one() {
                DrainOutcome::Continue => {}
                DrainOutcome::Stopped | DrainOutcome::Idle | DrainOutcome::Pending => return,
            }
        }
        self.schedule_consumer();
    }

    fn drain_one(self: &Arc<Self>) -> DrainOutcome {
        if self.strategy.signals_drops() {
            let dropped = self.dropped_count.swap(0, Ordering::AcqRel);
            if dropped > 0 {
                if let Some(signal) = self.strategy.build_signal(dropped) {
                    return self.dispatch(signal);
                }
            }
        }

        self.queue.fence_poll();
        match self.queue.poll() {
            Some(item) => self.dispatch(item),
            None => self.handle_empty_queue(),
        }
    }

    fn handle_empty_queue(self: &Arc<Self>) -> DrainOutcome {
        if !self.upstream_is_complete.load(Ordering::Acquire) {
            self.items_to_push.store(0, Ordering::Release);
            return DrainOutcome::Idle;
        }

        let error = self.error_thrown.lock().take();
        match error {
            Some(error) => {
                self.downstream.on_error(error);
                self.finish(false);
                DrainOutcome::Stopped
            }
            None if self.queue.is_empty() => {
                self.downstream.on_complete();
                self.finish(false);
                DrainOutcome::Stopped
            }
            None => DrainOutcome::Continue,
        }
    }

    fn dispatch(self: &Arc<Self>, item: T) -> DrainOutcome {
        let ack = self.downstream.on_next(item);
        match ack.try_resolved() {
            Some(AckValue::Continue) => {
                self.items_to_push.fetch_sub(1, Ordering::AcqRel);
                self.release_backpressure_waiters();
                DrainOutcome::Continue
            }
            Some(AckValue::Stop) => {
                self.finish(true);
                DrainOutcome::Stopped
            }
            None => {
                let this = self.clone();
                let executor = self.executor.clone();
                let submitted = executor.submit(Box::pin(async move {
                    match ack.await {
                        AckValue::Continue => {
                            this.items_to_push.fetch_sub(1, Ordering::AcqRel);
                            this.release_backpressure_waiters();
                            this.schedule_consumer();
                        }
                        AckValue::Stop => this.finish(true),
                    }
                }));
                if submitted.is_err() {
                    self.finish(true);
                    return DrainOutcome::Stopped;
                }
                DrainOutcome::Pending
            }
        }
    }

    fn finish(&self, downstream_stopped: bool) {
        self.downstream_is_done.store(true, Ordering::Release);
        if downstream_stopped {
            let mut waiters = self.backpressure_waiters.lock();
            for (_, resolver) in waiters.drain(..) {
                resolver.resolve(AckValue::Stop);
            }
        }
        self.items_to_push.store(-1, Ordering::Release);
    }
}

/// Linearizes `on_next` calls from any number of producer threads into a
/// serial call sequence on a downstream [`Observer`], buffering under an
/// [`OverflowStrategy`].
pub struct BufferedSubscriber<T, E> {
    inner: Arc<Inner<T, E>>,
}

impl<T, E> Clone for BufferedSubscriber<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Send + 'static, E: Executor + Clone + 'static> BufferedSubscriber<T, E> {
    /// Build a new buffered subscriber in front of `downstream`.
    #[must_use]
    pub fn new(
        downstream: Arc<dyn Observer<T>>,
        strategy: OverflowStrategy<T>,
        executor: E,
        config: BufferedSubscriberConfig,
    ) -> Self {
        let queue = Queue::for_strategy(&strategy, config.buffer_chunk_size);
        Self {
            inner: Arc::new(Inner {
                downstream,
                strategy,
                queue,
                executor,
                config,
                items_to_push: AtomicIsize::new(0),
                upstream_is_complete: AtomicBool::new(false),
                downstream_is_done: AtomicBool::new(false),
                error_thrown: Mutex::new(None),
                dropped_count: AtomicUsize::new(0),
                backpressure_waiters: Mutex::new(VecDeque::new()),
            }),
        }
    }
}

impl<T: Send + 'static, E: Executor + Clone + 'static> Observer<T> for BufferedSubscriber<T, E> {
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
    use conflux_test_utils::{ManualExecutor, RecordingObserver};
    use std::task::Poll;

    fn noop_context() -> std::task::Context<'static> {
        struct NoopWaker;
        impl std::task::Wake for NoopWaker {
            fn wake(self: Arc<Self>) {}
        }
        static WAKER: std::sync::OnceLock<std::task::Waker> = std::sync::OnceLock::new();
        let waker = WAKER.get_or_init(|| std::task::Waker::from(Arc::new(NoopWaker)));
        std::task::Context::from_waker(waker)
    }

    /// Scenario S2: a `Fail` strategy delivers a `BufferOverflow` error
    /// downstream and `Stop`s the offending producer once the buffer fills.
    ///
    /// A single synchronous producer thread never actually observes a full
    /// queue through the public API alone — the trampoline drains inline
    /// before the next `on_next` call begins — so the test fills the ring
    /// directly through `Inner`'s private queue handle first, the way two
    /// genuinely concurrent producers racing ahead of the drain loop would.
    #[test]
    fn fail_strategy_reports_overflow_and_stops_the_producer() {
        let downstream = Arc::new(RecordingObserver::<u32>::new());
        let executor = ManualExecutor::new();
        let subscriber: BufferedSubscriber<u32, ManualExecutor> = BufferedSubscriber::new(
            downstream.clone(),
            OverflowStrategy::Fail(2),
            executor.clone(),
            BufferedSubscriberConfig::default(),
        );
        subscriber.inner.queue.offer(1).expect("room for first item");
        subscriber.inner.queue.offer(2).expect("room for second item");

        assert!(matches!(subscriber.on_next(3), Ack::Stop));

        executor.run_until_idle();

        assert_eq!(downstream.items(), vec![1, 2]);
        downstream.with_error(|error| {
            assert!(matches!(
                error,
                Some(ConfluxError::BufferOverflow { capacity: 2 })
            ));
        });
        assert!(!downstream.is_completed());
    }

    /// Scenario S3: under `DropOldAndSignal`, offering into a full buffer
    /// evicts the oldest element and the next drain emits one signal item
    /// carrying the cumulative drop count.
    #[test]
    fn drop_old_and_signal_emits_one_cumulative_drop_count() {
        let downstream = Arc::new(RecordingObserver::<i64>::new());
        let executor = ManualExecutor::new();
        let strategy =
            OverflowStrategy::DropOldAndSignal(2, Arc::new(|dropped| -(dropped as i64)));
        let subscriber: BufferedSubscriber<i64, ManualExecutor> = BufferedSubscriber::new(
            downstream.clone(),
            strategy,
            executor.clone(),
            BufferedSubscriberConfig::default(),
        );
        subscriber.inner.queue.offer(1).expect("room for first item");
        subscriber.inner.queue.offer(2).expect("room for second item");

        // The buffer is already full; this evicts item 1 and queues item 3.
        assert!(matches!(subscriber.on_next(3), Ack::Continue));

        executor.run_until_idle();

        // Item 1 was evicted; the drop signal (-1) precedes the surviving
        // items 2 and 3 because pending drops flush at the start of a drain.
        assert_eq!(downstream.items(), vec![-1, 2, 3]);
    }

    /// Scenario S1: under `BackPressure`, producers racing a full buffer get
    /// a pending ack that always eventually resolves to `Continue` as the
    /// consumer loop drains room for them — liveness, not deadlock.
    #[test]
    fn backpressure_resolves_every_producer_eventually() {
        let downstream = Arc::new(RecordingObserver::<u32>::new());
        let executor = ManualExecutor::new();
        let subscriber: BufferedSubscriber<u32, ManualExecutor> = BufferedSubscriber::new(
            downstream.clone(),
            OverflowStrategy::BackPressure(1),
            executor.clone(),
            BufferedSubscriberConfig::default(),
        );

        let handles: Vec<_> = [0u32, 100, 200, 300]
            .into_iter()
            .map(|base| {
                let subscriber = subscriber.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let mut ack = subscriber.on_next(base + i);
                        loop {
                            match ack.try_resolved() {
                                Some(AckValue::Continue) => break,
                                Some(AckValue::Stop) => panic!("unexpected stop"),
                                None => {
                                    match Pin::new(&mut ack).poll(&mut noop_context()) {
                                        Poll::Ready(AckValue::Continue) => break,
                                        Poll::Ready(AckValue::Stop) => panic!("unexpected stop"),
                                        Poll::Pending => std::thread::yield_now(),
                                    }
                                }
                            }
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("producer thread panicked");
        }

        executor.run_until_idle();
        assert_eq!(downstream.len(), 100);
    }

    use std::future::Future;
    use std::pin::Pin;
}
