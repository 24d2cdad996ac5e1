// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Idempotent, one-shot, composable resource release.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A resource that can be released exactly once, from any thread, any number
/// of times with no effect beyond the first.
pub trait Cancelable: Send + Sync {
    /// Release the resource. Idempotent.
    fn cancel(&self);

    /// `true` once [`Self::cancel`] has run (possibly from another thread).
    fn is_canceled(&self) -> bool;
}

/// A boolean flag implementing [`Cancelable`] with no attached cleanup.
///
/// Useful as a cooperative-cancellation signal for a consumer loop, or as a
/// building block composed with other cancelables.
#[derive(Debug, Default)]
pub struct BooleanCancelable {
    canceled: AtomicBool,
}

impl BooleanCancelable {
    /// Create a fresh, not-yet-canceled flag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            canceled: AtomicBool::new(false),
        }
    }
}

impl Cancelable for BooleanCancelable {
    fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

/// Runs a closure exactly once, on the first call to `cancel()`.
///
/// Grounds cancellation of a subscription in an actual side effect (closing a
/// channel, releasing a slot) rather than just flipping a flag.
pub struct FnCancelable {
    canceled: AtomicBool,
    action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl FnCancelable {
    /// Wrap `action` so it runs at most once, on the first `cancel()`.
    pub fn new<F: FnOnce() + Send + 'static>(action: F) -> Self {
        Self {
            canceled: AtomicBool::new(false),
            action: Mutex::new(Some(Box::new(action))),
        }
    }
}

impl Cancelable for FnCancelable {
    fn cancel(&self) {
        if self
            .canceled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Some(action) = self.action.lock().take() {
                action();
            }
        }
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

/// Cancels every member when cancelled itself. Cancelling the composite more
/// than once, or cancelling an already-cancelled member, is a no-op.
#[derive(Clone, Default)]
pub struct CompositeCancelable {
    members: Arc<Mutex<Vec<Arc<dyn Cancelable>>>>,
    canceled: Arc<AtomicBool>,
}

impl CompositeCancelable {
    /// Create an empty composite.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member. If the composite is already cancelled, `member` is
    /// cancelled immediately instead of being retained.
    pub fn add(&self, member: Arc<dyn Cancelable>) {
        if self.canceled.load(Ordering::Acquire) {
            member.cancel();
            return;
        }
        self.members.lock().push(member);
    }
}

impl Cancelable for CompositeCancelable {
    fn cancel(&self) {
        if self
            .canceled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            for member in self.members.lock().drain(..) {
                member.cancel();
            }
        }
    }

    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_cancelable_is_idempotent() {
        let c = BooleanCancelable::new();
        assert!(!c.is_canceled());
        c.cancel();
        c.cancel();
        assert!(c.is_canceled());
    }

    #[test]
    fn fn_cancelable_runs_action_once() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let c = FnCancelable::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        c.cancel();
        c.cancel();
        c.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn composite_cancels_all_members() {
        let composite = CompositeCancelable::new();
        let a = Arc::new(BooleanCancelable::new());
        let b = Arc::new(BooleanCancelable::new());
        composite.add(a.clone());
        composite.add(b.clone());
        composite.cancel();
        assert!(a.is_canceled());
        assert!(b.is_canceled());
    }

    #[test]
    fn composite_cancels_late_additions_immediately() {
        let composite = CompositeCancelable::new();
        composite.cancel();
        let late = Arc::new(BooleanCancelable::new());
        composite.add(late.clone());
        assert!(late.is_canceled());
    }
}
