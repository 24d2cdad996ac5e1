// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! A Reactive Streams bridge: wraps a Conflux [`conflux_core::Observer`] as a
//! standards-shaped [`Subscriber`], translating the demand (`request`/`cancel`)
//! protocol into `Ack` and back.

#![allow(clippy::multiple_crate_versions)]

pub mod bridge;
pub mod factory;
pub mod subscription;

pub use bridge::{ObserverSubscriber, DEFAULT_REQUEST_COUNT};
pub use factory::{to_reactive_subscriber, to_reactive_subscriber_default, to_reactive_subscriber_sync};
pub use subscription::{CancelableSubscription, Subscriber, Subscription};

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_core::{Ack, Observer};
    use conflux_error::ConfluxError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    struct RecordingDownstream {
        items: Mutex<Vec<u32>>,
    }

    impl Observer<u32> for RecordingDownstream {
        fn on_next(&self, item: u32) -> Ack {
            self.items.lock().push(item);
            Ack::Continue
        }
        fn on_error(&self, _error: ConfluxError) {}
        fn on_complete(&self) {}
    }

    struct RecordingSubscription {
        requested: AtomicU64,
        canceled: std::sync::atomic::AtomicBool,
    }

    impl Subscription for RecordingSubscription {
        fn request(&self, n: u64) {
            self.requested.fetch_add(n, Ordering::AcqRel);
        }
        fn cancel(&self) {
            self.canceled.store(true, Ordering::Release);
        }
    }

    #[test]
    fn on_subscribe_requests_the_configured_chunk() {
        let downstream = Arc::new(RecordingDownstream {
            items: Mutex::new(Vec::new()),
        });
        let subscriber = ObserverSubscriber::new(downstream, 4).unwrap();
        let subscription = Arc::new(RecordingSubscription {
            requested: AtomicU64::new(0),
            canceled: std::sync::atomic::AtomicBool::new(false),
        });
        subscriber.on_subscribe(subscription.clone());
        assert_eq!(subscription.requested.load(Ordering::Acquire), 4);
    }

    #[test]
    fn exhausting_the_chunk_triggers_a_re_request() {
        let downstream = Arc::new(RecordingDownstream {
            items: Mutex::new(Vec::new()),
        });
        let subscriber = ObserverSubscriber::new(downstream.clone(), 2).unwrap();
        let subscription = Arc::new(RecordingSubscription {
            requested: AtomicU64::new(0),
            canceled: std::sync::atomic::AtomicBool::new(false),
        });
        subscriber.on_subscribe(subscription.clone());
        assert_eq!(subscription.requested.load(Ordering::Acquire), 2);

        subscriber.on_next(1);
        assert_eq!(subscription.requested.load(Ordering::Acquire), 2);
        subscriber.on_next(2);
        assert_eq!(subscription.requested.load(Ordering::Acquire), 4);

        assert_eq!(*downstream.items.lock(), vec![1, 2]);
    }

    #[test]
    fn zero_request_count_is_a_protocol_violation() {
        let downstream = Arc::new(RecordingDownstream {
            items: Mutex::new(Vec::new()),
        });
        assert!(matches!(
            ObserverSubscriber::new(downstream, 0),
            Err(ConfluxError::ProtocolViolation { .. })
        ));
    }

    #[test]
    fn second_on_subscribe_cancels_the_new_subscription() {
        let downstream = Arc::new(RecordingDownstream {
            items: Mutex::new(Vec::new()),
        });
        let subscriber = ObserverSubscriber::new(downstream, 4).unwrap();
        let first = Arc::new(RecordingSubscription {
            requested: AtomicU64::new(0),
            canceled: std::sync::atomic::AtomicBool::new(false),
        });
        let second = Arc::new(RecordingSubscription {
            requested: AtomicU64::new(0),
            canceled: std::sync::atomic::AtomicBool::new(false),
        });
        subscriber.on_subscribe(first);
        subscriber.on_subscribe(second.clone());
        assert!(second.canceled.load(Ordering::Acquire));
    }
}
