// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The three-valued acknowledgement returned by [`Observer::on_next`](crate::Observer::on_next).
//!
//! `Ack` lets a downstream consumer acknowledge an event either synchronously
//! (`Continue`/`Stop`, no allocation, identity-comparable singletons) or
//! asynchronously (`Pending`, a single-slot future resolved later on whatever
//! executor the consumer chooses). The producer must treat both forms
//! identically: await the `Ack` before issuing the next `on_next`.

use event_listener::{Event, EventListener};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// The resolved value of an [`Ack`]: either the consumer wants more (`Continue`)
/// or it is done and no further events may be delivered (`Stop`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AckValue {
    /// The consumer accepted the event and wants more.
    Continue,
    /// The consumer is done; no further `on_next`/terminal calls are permitted.
    Stop,
}

impl AckValue {
    /// `true` for `Continue`.
    #[must_use]
    pub const fn is_continue(self) -> bool {
        matches!(self, Self::Continue)
    }

    /// `true` for `Stop`.
    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Stop)
    }
}

const UNRESOLVED: u8 = 0;
const RESOLVED_CONTINUE: u8 = 1;
const RESOLVED_STOP: u8 = 2;

struct AckCell {
    state: AtomicU8,
    event: Event,
}

/// The producer-facing half of a pending acknowledgement.
///
/// Exactly one of [`Self::resolve`] must be called; subsequent calls are no-ops,
/// matching the "at most one terminal" idempotency the rest of the crate relies on.
pub struct AckResolver {
    cell: Arc<AckCell>,
}

impl AckResolver {
    /// Resolve the pending ack with `value`. Idempotent: only the first call wins.
    pub fn resolve(&self, value: AckValue) {
        let target = match value {
            AckValue::Continue => RESOLVED_CONTINUE,
            AckValue::Stop => RESOLVED_STOP,
        };
        if self
            .cell
            .state
            .compare_exchange(UNRESOLVED, target, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.cell.event.notify(usize::MAX);
        }
    }
}

/// A deferred `Ack` completion: the future half of [`AckResolver`].
pub struct PendingAck {
    cell: Arc<AckCell>,
    listener: Option<EventListener>,
}

impl fmt::Debug for PendingAck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingAck").finish_non_exhaustive()
    }
}

impl Future for PendingAck {
    type Output = AckValue;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<AckValue> {
        loop {
            match self.cell.state.load(Ordering::Acquire) {
                RESOLVED_CONTINUE => return Poll::Ready(AckValue::Continue),
                RESOLVED_STOP => return Poll::Ready(AckValue::Stop),
                _ => {}
            }

            if self.listener.is_none() {
                self.listener = Some(self.cell.event.listen());
                // Re-check: resolve() may have raced between our load and listen().
                continue;
            }

            match Pin::new(self.listener.as_mut().expect("listener set above")).poll(cx) {
                Poll::Ready(()) => {
                    self.listener = None;
                    continue;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Create a fresh pending acknowledgement: a `(resolver, ack)` pair.
#[must_use]
pub fn pending_ack() -> (AckResolver, Ack) {
    let cell = Arc::new(AckCell {
        state: AtomicU8::new(UNRESOLVED),
        event: Event::new(),
    });
    let resolver = AckResolver { cell: cell.clone() };
    let ack = Ack::Pending(PendingAck {
        cell,
        listener: None,
    });
    (resolver, ack)
}

/// The return type of [`Observer::on_next`](crate::Observer::on_next).
///
/// `Continue` and `Stop` are synchronous singletons; implementations may
/// identity-compare them as a fast path but must not require it, since a
/// `Pending` ack that resolves to the same value is value-equal.
pub enum Ack {
    /// Synchronous: the consumer wants more.
    Continue,
    /// Synchronous: the consumer is done.
    Stop,
    /// Asynchronous: resolves to `Continue` or `Stop` on some executor.
    Pending(PendingAck),
}

impl fmt::Debug for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => write!(f, "Ack::Continue"),
            Self::Stop => write!(f, "Ack::Stop"),
            Self::Pending(_) => write!(f, "Ack::Pending"),
        }
    }
}

impl Ack {
    /// If this ack is already resolved (synchronously or because the pending
    /// future is immediately ready), return its value without blocking.
    #[must_use]
    pub fn try_resolved(&self) -> Option<AckValue> {
        match self {
            Self::Continue => Some(AckValue::Continue),
            Self::Stop => Some(AckValue::Stop),
            Self::Pending(pending) => match pending.cell.state.load(Ordering::Acquire) {
                RESOLVED_CONTINUE => Some(AckValue::Continue),
                RESOLVED_STOP => Some(AckValue::Stop),
                _ => None,
            },
        }
    }
}

impl Future for Ack {
    type Output = AckValue;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<AckValue> {
        // Safety: we only ever move out of the Pending variant's inner field,
        // never relocate `self` itself.
        let this = self.get_mut();
        match this {
            Self::Continue => Poll::Ready(AckValue::Continue),
            Self::Stop => Poll::Ready(AckValue::Stop),
            Self::Pending(pending) => Pin::new(pending).poll(cx),
        }
    }
}

impl From<AckValue> for Ack {
    fn from(value: AckValue) -> Self {
        match value {
            AckValue::Continue => Self::Continue,
            AckValue::Stop => Self::Stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::task::Wake;

    struct NoopWaker;
    impl Wake for NoopWaker {
        fn wake(self: Arc<Self>) {}
    }

    fn noop_context() -> Context<'static> {
        static WAKER: std::sync::OnceLock<std::task::Waker> = std::sync::OnceLock::new();
        let waker = WAKER.get_or_init(|| std::task::Waker::from(Arc::new(NoopWaker)));
        Context::from_waker(waker)
    }

    #[test]
    fn synchronous_acks_resolve_immediately() {
        assert_eq!(Ack::Continue.try_resolved(), Some(AckValue::Continue));
        assert_eq!(Ack::Stop.try_resolved(), Some(AckValue::Stop));
    }

    #[test]
    fn pending_ack_resolves_once() {
        let (resolver, mut ack) = pending_ack();
        assert_eq!(ack.try_resolved(), None);

        let mut cx = noop_context();
        assert!(matches!(Pin::new(&mut ack).poll(&mut cx), Poll::Pending));

        resolver.resolve(AckValue::Continue);
        // A second resolve must not change the outcome.
        resolver.resolve(AckValue::Stop);

        assert_eq!(ack.try_resolved(), Some(AckValue::Continue));
    }

    #[test]
    fn pending_ack_wakes_a_parked_poll() {
        let (resolver, mut ack) = pending_ack();
        let mut cx = noop_context();
        assert!(matches!(Pin::new(&mut ack).poll(&mut cx), Poll::Pending));
        resolver.resolve(AckValue::Stop);
        assert!(matches!(
            Pin::new(&mut ack).poll(&mut cx),
            Poll::Ready(AckValue::Stop)
        ));
    }
}
