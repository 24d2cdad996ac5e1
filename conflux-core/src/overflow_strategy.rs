// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Overflow policies for bounded, multi-producer buffering.

use std::fmt;
use std::sync::Arc;

/// What a bounded buffer does when a producer offers into a full buffer.
///
/// `T` is the element type of the buffer; the `*AndSignal` variants carry a
/// callback that synthesizes a downstream item describing how many elements
/// were dropped, so the consumer can observe the loss instead of silently
/// missing data.
pub enum OverflowStrategy<T> {
    /// The buffer grows without bound. Producers never block or drop.
    Unbounded,
    /// The buffer holds at most `capacity` elements. Offering into a full
    /// buffer fails the whole subscription with a buffer-overflow error.
    Fail(usize),
    /// The buffer holds at most `capacity` elements. Offering into a full
    /// buffer suspends the producer (via a pending [`Ack`](crate::Ack)) until
    /// space frees up.
    BackPressure(usize),
    /// The buffer holds at most `capacity` elements. The newly offered
    /// element is dropped; already-buffered elements are unaffected.
    DropNew(usize),
    /// Like `DropNew`, but also emits one signal item (built from the
    /// cumulative drop count) the next time the consumer drains the buffer.
    DropNewAndSignal(usize, Arc<dyn Fn(usize) -> T + Send + Sync>),
    /// The buffer holds at most `capacity` elements. The oldest buffered
    /// element is evicted to make room for the new one.
    DropOld(usize),
    /// Like `DropOld`, but also emits one signal item describing the
    /// cumulative drop count the next time the consumer drains the buffer.
    DropOldAndSignal(usize, Arc<dyn Fn(usize) -> T + Send + Sync>),
    /// The buffer holds at most `capacity` elements. On overflow the entire
    /// buffer is cleared and the new element becomes the sole occupant.
    ClearBuffer(usize),
    /// Like `ClearBuffer`, but also emits one signal item describing how
    /// many elements were discarded.
    ClearBufferAndSignal(usize, Arc<dyn Fn(usize) -> T + Send + Sync>),
}

impl<T> fmt::Debug for OverflowStrategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("Unbounded"),
            Self::Fail(cap) => f.debug_tuple("Fail").field(cap).finish(),
            Self::BackPressure(cap) => f.debug_tuple("BackPressure").field(cap).finish(),
            Self::DropNew(cap) => f.debug_tuple("DropNew").field(cap).finish(),
            Self::DropNewAndSignal(cap, _) => {
                f.debug_tuple("DropNewAndSignal").field(cap).finish()
            }
            Self::DropOld(cap) => f.debug_tuple("DropOld").field(cap).finish(),
            Self::DropOldAndSignal(cap, _) => {
                f.debug_tuple("DropOldAndSignal").field(cap).finish()
            }
            Self::ClearBuffer(cap) => f.debug_tuple("ClearBuffer").field(cap).finish(),
            Self::ClearBufferAndSignal(cap, _) => {
                f.debug_tuple("ClearBufferAndSignal").field(cap).finish()
            }
        }
    }
}

impl<T> OverflowStrategy<T> {
    /// The buffer's declared capacity, or `None` for `Unbounded`.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::Fail(cap)
            | Self::BackPressure(cap)
            | Self::DropNew(cap)
            | Self::DropNewAndSignal(cap, _)
            | Self::DropOld(cap)
            | Self::DropOldAndSignal(cap, _)
            | Self::ClearBuffer(cap)
            | Self::ClearBufferAndSignal(cap, _) => Some(*cap),
        }
    }

    /// `true` for strategies that attach a drop-count signal callback.
    #[must_use]
    pub fn signals_drops(&self) -> bool {
        matches!(
            self,
            Self::DropNewAndSignal(..) | Self::DropOldAndSignal(..) | Self::ClearBufferAndSignal(..)
        )
    }

    /// Build the signal item for `dropped` elements, if this strategy signals drops.
    pub fn build_signal(&self, dropped: usize) -> Option<T> {
        match self {
            Self::DropNewAndSignal(_, f)
            | Self::DropOldAndSignal(_, f)
            | Self::ClearBufferAndSignal(_, f) => Some(f(dropped)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_reports_none_for_unbounded() {
        let s: OverflowStrategy<u32> = OverflowStrategy::Unbounded;
        assert_eq!(s.capacity(), None);
    }

    #[test]
    fn capacity_reports_declared_bound() {
        let s: OverflowStrategy<u32> = OverflowStrategy::DropOld(128);
        assert_eq!(s.capacity(), Some(128));
    }

    #[test]
    fn signal_strategies_build_items() {
        let s: OverflowStrategy<String> =
            OverflowStrategy::DropOldAndSignal(16, Arc::new(|n| format!("dropped {n}")));
        assert!(s.signals_drops());
        assert_eq!(s.build_signal(3), Some("dropped 3".to_string()));
    }

    #[test]
    fn non_signal_strategies_build_nothing() {
        let s: OverflowStrategy<u32> = OverflowStrategy::Fail(4);
        assert!(!s.signals_drops());
        assert_eq!(s.build_signal(1), None);
    }
}
