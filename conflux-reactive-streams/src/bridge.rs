// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! [`ObserverSubscriber`]: wraps a Conflux [`Observer`] as a standards
//! `Subscriber`, doing the request-count accounting a `Publisher` expects.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use conflux_core::{Ack, Observer};
use conflux_error::ConfluxError;
use parking_lot::Mutex;

use crate::subscription::{Subscriber, Subscription};

/// The default request chunk size, per spec: 128.
pub const DEFAULT_REQUEST_COUNT: u64 = 128;

/// Wraps `downstream` as a standards `Subscriber`, re-requesting in chunks
/// of `request_count` as the upstream `Publisher` satisfies demand.
pub struct ObserverSubscriber<T> {
    downstream: Arc<dyn Observer<T>>,
    subscription: Mutex<Option<Arc<dyn Subscription>>>,
    expecting_count: AtomicU64,
    request_count: u64,
    is_canceled: AtomicBool,
}

impl<T: Send + 'static> ObserverSubscriber<T> {
    /// Build a subscriber requesting `request_count` elements at a time.
    ///
    /// # Errors
    /// Returns [`ConfluxError::ProtocolViolation`] if `request_count` is not
    /// strictly positive.
    pub fn new(
        downstream: Arc<dyn Observer<T>>,
        request_count: u64,
    ) -> Result<Self, ConfluxError> {
        if request_count == 0 {
            return Err(ConfluxError::protocol_violation(
                "Reactive Streams request count must be strictly positive",
            ));
        }
        Ok(Self {
            downstream,
            subscription: Mutex::new(None),
            expecting_count: AtomicU64::new(0),
            request_count,
            is_canceled: AtomicBool::new(false),
        })
    }

    fn cancel(&self) {
        if self
            .is_canceled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Some(subscription) = self.subscription.lock().as_ref() {
                subscription.cancel();
            }
        }
    }
}

impl<T: Send + 'static> Subscriber<T> for ObserverSubscriber<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Subscription>) {
        let mut slot = self.subscription.lock();
        if slot.is_some() || self.is_canceled.load(Ordering::Acquire) {
            subscription.cancel();
            return;
        }
        self.expecting_count.store(self.request_count, Ordering::Release);
        subscription.request(self.request_count);
        *slot = Some(subscription);
    }

    fn on_next(&self, item: T) {
        if self.is_canceled.load(Ordering::Acquire) {
            return;
        }

        // Decrement outstanding demand before forwarding, per the bridge's
        // contract: a downstream `on_next` that re-enters `cancel` (or a
        // nested `request`) must see the post-decrement count.
        let remaining = self.expecting_count.fetch_sub(1, Ordering::AcqRel) - 1;

        match self.downstream.on_next(item) {
            Ack::Continue => {
                if remaining == 0 {
                    self.expecting_count
                        .store(self.request_count, Ordering::Release);
                    if let Some(subscription) = self.subscription.lock().as_ref() {
                        subscription.request(self.request_count);
                    }
                }
            }
            Ack::Stop => self.cancel(),
            Ack::Pending(_) => {
                // A synchronous-only bridge never sees this: `to_reactive_subscriber`
                // always wraps non-synchronous observers in a BufferedSubscriber
                // with an Unbounded strategy first, whose own `on_next` always
                // resolves synchronously. Treat it as `Continue` defensively.
                if remaining == 0 {
                    self.expecting_count
                        .store(self.request_count, Ordering::Release);
                    if let Some(subscription) = self.subscription.lock().as_ref() {
                        subscription.request(self.request_count);
                    }
                }
            }
        }
    }

    fn on_error(&self, error: ConfluxError) {
        if self
            .is_canceled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.downstream.on_error(error);
        }
    }

    fn on_complete(&self) {
        if self
            .is_canceled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.downstream.on_complete();
        }
    }
}

