// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The optional clock abstraction `spec.md` reserves for timeouts.
//!
//! Nothing in the core currently constructs a timeout on its own; this
//! exists as the seam a caller plugs into when it wants one (e.g. bounding
//! how long a `BackPressure` producer waits before treating the stream as
//! stalled).

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

/// A source of the current time plus a way to wait for a duration.
pub trait Timer: Clone + Send + Sync + Debug + 'static {
    /// The future returned by [`Self::sleep`].
    type Sleep: Future<Output = ()> + Send;

    /// Wait for `duration` to elapse.
    fn sleep(&self, duration: Duration) -> Self::Sleep;

    /// The current instant, per this timer's clock.
    fn now(&self) -> std::time::Instant;
}
