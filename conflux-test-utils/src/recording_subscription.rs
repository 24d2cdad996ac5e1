// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! [`RecordingSubscription`]: a test `Subscription` that records cumulative
//! requested demand and whether it was canceled, for asserting Reactive
//! Streams request accounting (scenario S4).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use conflux_reactive_streams::Subscription;

/// A `Subscription` double that never delivers anything itself; it only
/// records what demand and cancellation it was asked for.
#[derive(Default)]
pub struct RecordingSubscription {
    requested_total: AtomicU64,
    request_calls: AtomicU64,
    canceled: AtomicBool,
}

impl RecordingSubscription {
    /// A subscription with no recorded activity yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of every `n` ever passed to `request`.
    #[must_use]
    pub fn requested_total(&self) -> u64 {
        self.requested_total.load(Ordering::Acquire)
    }

    /// Number of times `request` was called.
    #[must_use]
    pub fn request_calls(&self) -> u64 {
        self.request_calls.load(Ordering::Acquire)
    }

    /// `true` once `cancel` has been called.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

impl Subscription for RecordingSubscription {
    fn request(&self, n: u64) {
        self.requested_total.fetch_add(n, Ordering::AcqRel);
        self.request_calls.fetch_add(1, Ordering::AcqRel);
    }

    fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_requested_demand() {
        let subscription = RecordingSubscription::new();
        subscription.request(128);
        subscription.request(128);
        assert_eq!(subscription.requested_total(), 256);
        assert_eq!(subscription.request_calls(), 2);
        assert!(!subscription.is_canceled());
    }

    #[test]
    fn records_cancellation() {
        let subscription = RecordingSubscription::new();
        subscription.cancel();
        assert!(subscription.is_canceled());
    }
}
