// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! # Conflux
//!
//! A push-pull reactive streaming core: bounded buffering with a choice of
//! overflow strategies, a trampolined consumer loop that linearizes
//! concurrent producers into a single-writer [`Observer`] contract, and a
//! Reactive Streams bridge over that contract.
//!
//! ## Design Philosophy
//!
//! The core never creates a thread and never calls a concrete async runtime
//! directly: all asynchrony is delegated to an injected
//! [`conflux_runtime::Executor`]. Producers call [`Observer::on_next`] and
//! get back an [`Ack`] — `Continue`, `Stop`, or a pending ack that resolves
//! once the downstream (or buffer) catches up. Only one logical consumer
//! ever runs per subscription, however many producer threads feed it.
//!
//! ## Quick Start
//!
//! ```rust
//! use conflux::prelude::*;
//! use conflux_runtime::TokioExecutor;
//! use std::sync::Arc;
//!
//! struct PrintObserver;
//! impl Observer<u32> for PrintObserver {
//!     fn on_next(&self, item: u32) -> Ack {
//!         println!("{item}");
//!         Ack::Continue
//!     }
//!     fn on_error(&self, _error: conflux_error::ConfluxError) {}
//!     fn on_complete(&self) {}
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let subscriber = conflux::buffered(
//!     Arc::new(PrintObserver),
//!     OverflowStrategy::Unbounded,
//!     TokioExecutor,
//! );
//! subscriber.on_next(1);
//! subscriber.on_next(2);
//! subscriber.on_complete();
//! # }
//! ```

#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

pub use conflux_core::{
    pending_ack, Ack, AckResolver, AckValue, BooleanCancelable, Cancelable, CancellationToken,
    Cancelled, ChannelType, CompositeCancelable, ConsumerType, FnCancelable, Observer,
    OverflowStrategy, ProducerType,
};
pub use conflux_error::{ConfluxError, Result, ResultExt};
pub use conflux_exec::{
    config::{
        AUTO_CANCELABLE_RUN_LOOPS, FUSION_MAX_STACK_DEPTH, RECOMMENDED_BATCH_SIZE,
        RECOMMENDED_BUFFER_CHUNK_SIZE,
    },
    BufferedSubscriber, BufferedSubscriberConfig, SyncBufferedSubscriber,
};
pub use conflux_queue::ConcurrentQueue;
pub use conflux_reactive_streams::{
    to_reactive_subscriber, to_reactive_subscriber_default, to_reactive_subscriber_sync,
    ObserverSubscriber, Subscriber, Subscription, DEFAULT_REQUEST_COUNT,
};
pub use conflux_runtime::{Executor, Runtime, Timer};

#[cfg(feature = "runtime-tokio")]
pub use conflux_runtime::{TokioExecutor, TokioRuntime, TokioTimer};

/// Wrap `downstream` in a trampolined [`BufferedSubscriber`], buffering
/// under `strategy` and scheduling consumer iterations on `executor`.
///
/// For a downstream known to resolve every [`Ack`] synchronously, prefer
/// [`buffered::sync`], which skips the trampoline/executor entirely.
#[must_use]
pub fn buffered<T, E>(
    downstream: Arc<dyn Observer<T>>,
    strategy: OverflowStrategy<T>,
    executor: E,
) -> BufferedSubscriber<T, E>
where
    T: Send + 'static,
    E: Executor + Clone + 'static,
{
    BufferedSubscriber::new(
        downstream,
        strategy,
        executor,
        BufferedSubscriberConfig::default(),
    )
}

/// The lock-protected fast path of [`buffered`], for downstreams whose
/// `on_next` is known to resolve synchronously.
pub mod buffered {
    use std::sync::Arc;

    use conflux_core::{Observer, OverflowStrategy};
    use conflux_exec::{BufferedSubscriberConfig, SyncBufferedSubscriber};

    /// Wrap `downstream` behind a `parking_lot::Mutex` instead of a
    /// trampolined consumer loop — no executor required.
    #[must_use]
    pub fn sync<T: Send + 'static>(
        downstream: Arc<dyn Observer<T>>,
        strategy: OverflowStrategy<T>,
    ) -> SyncBufferedSubscriber<T> {
        SyncBufferedSubscriber::new(downstream, strategy, BufferedSubscriberConfig::default())
    }
}

/// Build a bounded [`ConcurrentQueue`] of at least `capacity` elements
/// (rounded up to a power of two) for the given producer/consumer
/// multiplicity.
#[must_use]
pub fn queue<T>(capacity: usize, channel_type: ChannelType) -> ConcurrentQueue<T> {
    ConcurrentQueue::new(capacity, channel_type)
}

/// Convenient imports for consumers of this crate.
pub mod prelude {
    pub use crate::{buffered, queue};
    pub use conflux_core::{
        Ack, AckValue, Cancelable, CancellationToken, ChannelType, Observer, OverflowStrategy,
    };
    pub use conflux_error::ConfluxError;
    pub use conflux_exec::{BufferedSubscriber, BufferedSubscriberConfig, SyncBufferedSubscriber};
    pub use conflux_reactive_streams::{Subscriber, Subscription};
    pub use conflux_runtime::Executor;
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflux_runtime::TokioExecutor;
    use conflux_test_utils::RecordingObserver;

    #[test]
    fn buffered_factory_delivers_in_order() {
        let downstream = Arc::new(RecordingObserver::<u32>::new());
        let subscriber = buffered(downstream.clone(), OverflowStrategy::Unbounded, TokioExecutor);
        assert!(matches!(subscriber.on_next(1), Ack::Continue));
        assert!(matches!(subscriber.on_next(2), Ack::Continue));
    }

    #[test]
    fn buffered_sync_factory_delivers_without_an_executor() {
        let downstream = Arc::new(RecordingObserver::<u32>::new());
        let subscriber = buffered::sync(downstream.clone(), OverflowStrategy::Unbounded);
        assert!(matches!(subscriber.on_next(1), Ack::Continue));
        subscriber.on_complete();
        assert_eq!(downstream.items(), vec![1]);
        assert!(downstream.is_completed());
    }

    #[test]
    fn queue_factory_builds_a_bounded_queue() {
        let q: ConcurrentQueue<u32> = queue(4, ChannelType::MPSC);
        assert!(q.capacity() >= 4);
    }

    #[test]
    fn to_reactive_subscriber_rejects_zero_request_count() {
        let downstream = Arc::new(RecordingObserver::<u32>::new());
        let result = to_reactive_subscriber_sync(downstream, 0);
        assert!(matches!(result, Err(ConfluxError::ProtocolViolation { .. })));
    }
}
