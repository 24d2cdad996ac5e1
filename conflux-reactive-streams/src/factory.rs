// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Factory functions building a [`Subscriber`] over a Conflux [`Observer`].

use std::sync::Arc;

use conflux_core::Observer;
use conflux_error::ConfluxError;
use conflux_exec::{BufferedSubscriber, BufferedSubscriberConfig};
use conflux_runtime::Executor;

use crate::bridge::{ObserverSubscriber, DEFAULT_REQUEST_COUNT};
use crate::subscription::Subscriber;

/// Wrap `downstream` as a standards `Subscriber`, requesting `request_count`
/// elements at a time (defaulting to [`DEFAULT_REQUEST_COUNT`] via
/// [`to_reactive_subscriber_default`]).
///
/// `downstream` is not assumed to return only synchronous `Ack`s, so it is
/// first wrapped in a [`BufferedSubscriber`] with an `Unbounded` strategy:
/// the standards contract requires `onNext` never to block the calling
/// `Publisher`, and an unbounded buffer is the only strategy that can
/// guarantee that without ever rejecting an event.
///
/// # Errors
/// Returns [`ConfluxError::ProtocolViolation`] if `request_count` is zero.
pub fn to_reactive_subscriber<T, E>(
    downstream: Arc<dyn Observer<T>>,
    request_count: u64,
    executor: E,
) -> Result<Arc<dyn Subscriber<T>>, ConfluxError>
where
    T: Send + 'static,
    E: Executor + Clone + 'static,
{
    let buffered = BufferedSubscriber::new(
        downstream,
        conflux_core::OverflowStrategy::Unbounded,
        executor,
        BufferedSubscriberConfig::default(),
    );
    Ok(Arc::new(ObserverSubscriber::new(
        Arc::new(buffered),
        request_count,
    )?))
}

/// Like [`to_reactive_subscriber`] with [`DEFAULT_REQUEST_COUNT`].
///
/// # Errors
/// Propagates [`to_reactive_subscriber`]'s errors (none possible with the
/// fixed default, but the signature stays fallible for symmetry).
pub fn to_reactive_subscriber_default<T, E>(
    downstream: Arc<dyn Observer<T>>,
    executor: E,
) -> Result<Arc<dyn Subscriber<T>>, ConfluxError>
where
    T: Send + 'static,
    E: Executor + Clone + 'static,
{
    to_reactive_subscriber(downstream, DEFAULT_REQUEST_COUNT, executor)
}

/// Wrap a downstream known to return only synchronous `Ack`s directly,
/// skipping the `BufferedSubscriber` indirection `to_reactive_subscriber`
/// otherwise pays for. Misusing this with an observer that can return
/// `Ack::Pending` breaks the standards non-blocking-`onNext` contract.
///
/// # Errors
/// Returns [`ConfluxError::ProtocolViolation`] if `request_count` is zero.
pub fn to_reactive_subscriber_sync<T>(
    downstream: Arc<dyn Observer<T>>,
    request_count: u64,
) -> Result<Arc<dyn Subscriber<T>>, ConfluxError>
where
    T: Send + 'static,
{
    Ok(Arc::new(ObserverSubscriber::new(downstream, request_count)?))
}
