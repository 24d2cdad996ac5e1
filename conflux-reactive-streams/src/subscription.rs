// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The standards-shaped `Subscriber`/`Subscription` pair this bridge speaks.

/// A standards-shaped demand-driven subscription: `request(n)` signals
/// readiness for up to `n` more elements, `cancel()` stops delivery.
///
/// Mirrors the `reactive-streams` `Subscription` interface used across the
/// async ecosystem. No external crate for it exists in this workspace's
/// dependency set, so the bridge defines its own minimal version here.
pub trait Subscription: Send + Sync {
    /// Request up to `n` more elements. Additive: a second `request` call
    /// before the first is satisfied increases outstanding demand.
    fn request(&self, n: u64);

    /// Cancel the subscription. Idempotent.
    fn cancel(&self);
}

/// A standards-shaped `Subscriber<T>`: the counterpart a `Publisher` drives.
pub trait Subscriber<T>: Send {
    /// Called exactly once, before any other method, with the subscription
    /// to drive demand through. A second call (or a call after cancellation)
    /// must cancel the offered subscription instead of replacing the stored one.
    fn on_subscribe(&self, subscription: std::sync::Arc<dyn Subscription>);

    /// Deliver one element. Must only be called up to the outstanding
    /// requested demand, and never after `on_error`/`on_complete`/cancel.
    fn on_next(&self, item: T);

    /// Deliver the terminal error. At most one terminal call total.
    fn on_error(&self, error: conflux_error::ConfluxError);

    /// Deliver terminal completion. At most one terminal call total.
    fn on_complete(&self);
}

/// Adapts a [`Cancelable`](conflux_core::Cancelable) into a [`Subscription`]:
/// `request` is a no-op (the adapted side has no demand protocol of its own),
/// `cancel` passes through, and repeated `cancel` calls stay idempotent.
pub struct CancelableSubscription<C> {
    cancelable: C,
}

impl<C: conflux_core::Cancelable + Send + Sync> CancelableSubscription<C> {
    /// Wrap `cancelable` as a [`Subscription`].
    pub fn new(cancelable: C) -> Self {
        Self { cancelable }
    }
}

impl<C: conflux_core::Cancelable + Send + Sync> Subscription for CancelableSubscription<C> {
    fn request(&self, _n: u64) {}

    fn cancel(&self) {
        self.cancelable.cancel();
    }
}
