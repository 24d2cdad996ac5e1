// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A deterministic, hand-cranked [`conflux_runtime::Executor`] for tests that
//! need to control exactly when submitted work runs instead of racing a real
//! runtime.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Wake, Waker};

use conflux_error::Result;
use conflux_runtime::Executor;
use futures::future::BoxFuture;
use parking_lot::Mutex;

/// Re-queues the future it wakes onto the executor it came from, so a
/// `Pending` poll isn't lost: the next `run_once`/`run_until_idle` call will
/// see it again.
struct Requeue {
    queue: Weak<Mutex<VecDeque<BoxFuture<'static, ()>>>>,
    future: Mutex<Option<BoxFuture<'static, ()>>>,
}

impl Wake for Requeue {
    fn wake(self: Arc<Self>) {
        self.wake_by_ref();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        if let (Some(queue), Some(future)) = (self.queue.upgrade(), self.future.lock().take()) {
            queue.lock().push_back(future);
        }
    }
}

/// Queues every future submitted to it; nothing runs until the test calls
/// [`ManualExecutor::run_once`] or [`ManualExecutor::run_until_idle`].
///
/// Grounded on the same "submit now, drive later" shape as the rest of the
/// executor abstraction, but with draining under the caller's control so
/// tests don't depend on a real runtime's scheduling order.
#[derive(Clone, Default)]
pub struct ManualExecutor {
    queue: Arc<Mutex<VecDeque<BoxFuture<'static, ()>>>>,
}

impl ManualExecutor {
    /// An executor with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of futures currently queued (including ones re-queued after a
    /// `Pending` poll).
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Poll every future currently in the queue exactly once. Futures that
    /// complete are dropped; futures that return `Pending` without having
    /// registered a waker are lost (matching a real executor's behavior).
    /// Returns how many futures were polled this round.
    pub fn run_once(&self) -> usize {
        let batch: Vec<_> = self.queue.lock().drain(..).collect();
        let ran = batch.len();
        for mut future in batch {
            let requeue = Arc::new(Requeue {
                queue: Arc::downgrade(&self.queue),
                future: Mutex::new(None),
            });
            let waker = Waker::from(requeue.clone());
            let mut cx = Context::from_waker(&waker);
            if Pin::new(&mut future).poll(&mut cx) == Poll::Pending {
                *requeue.future.lock() = Some(future);
            }
        }
        ran
    }

    /// Run rounds until the queue is empty. Panics if it does not converge
    /// within a generous round budget, since an infinite loop here means a
    /// test bug, not legitimate backpressure.
    pub fn run_until_idle(&self) {
        let mut rounds = 0;
        while !self.queue.lock().is_empty() {
            self.run_once();
            rounds += 1;
            assert!(
                rounds < 100_000,
                "ManualExecutor::run_until_idle did not converge after {rounds} rounds"
            );
        }
    }
}

impl Executor for ManualExecutor {
    fn submit(&self, future: BoxFuture<'static, ()>) -> Result<()> {
        self.queue.lock().push_back(future);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn run_once_drains_everything_queued_at_call_time() {
        let executor = ManualExecutor::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let count = count.clone();
            executor
                .submit(Box::pin(async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }))
                .unwrap();
        }
        assert_eq!(executor.pending(), 5);
        let ran = executor.run_once();
        assert_eq!(ran, 5);
        assert_eq!(count.load(Ordering::SeqCst), 5);
        assert_eq!(executor.pending(), 0);
    }

    #[test]
    fn run_until_idle_drains_futures_that_resubmit_themselves() {
        let executor = ManualExecutor::new();
        let depth = Arc::new(AtomicUsize::new(0));

        fn chain(executor: ManualExecutor, depth: Arc<AtomicUsize>, remaining: usize) {
            executor
                .clone()
                .submit(Box::pin(async move {
                    depth.fetch_add(1, Ordering::SeqCst);
                    if remaining > 0 {
                        chain(executor, depth.clone(), remaining - 1);
                    }
                }))
                .unwrap();
        }

        chain(executor.clone(), depth.clone(), 99);
        executor.run_until_idle();
        assert_eq!(depth.load(Ordering::SeqCst), 100);
    }
}
