// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! [`RecordingObserver`]: captures the exact call sequence a
//! [`conflux_core::Observer`] receives, for assertion in tests.

use std::sync::atomic::{AtomicBool, Ordering};

use conflux_core::{Ack, Observer};
use conflux_error::ConfluxError;
use parking_lot::Mutex;

/// Records every `on_next` item (in delivery order), the terminal error (if
/// any), and whether `on_complete` was observed.
///
/// Optionally returns `Ack::Stop` after a configured number of items, to
/// exercise a downstream that cancels mid-stream without needing a second
/// test double.
pub struct RecordingObserver<T> {
    items: Mutex<Vec<T>>,
    error: Mutex<Option<ConfluxError>>,
    completed: AtomicBool,
    stop_after: Option<usize>,
}

impl<T> RecordingObserver<T> {
    /// A recorder that always acknowledges `Continue`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            error: Mutex::new(None),
            completed: AtomicBool::new(false),
            stop_after: None,
        }
    }

    /// A recorder that returns `Ack::Stop` once it has recorded `limit` items.
    #[must_use]
    pub fn with_stop_after(limit: usize) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            error: Mutex::new(None),
            completed: AtomicBool::new(false),
            stop_after: Some(limit),
        }
    }

    /// `true` once `on_complete` has been delivered.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// The terminal error, if `on_error` was delivered.
    #[must_use]
    pub fn error(&self) -> Option<ConfluxError> {
        self.error.lock().clone()
    }

    /// Run `f` with a reference to the terminal error, if any.
    pub fn with_error<R>(&self, f: impl FnOnce(Option<&ConfluxError>) -> R) -> R {
        f(self.error.lock().as_ref())
    }

    /// Number of items recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// `true` if no items have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T: Clone> RecordingObserver<T> {
    /// A snapshot of every item recorded so far, in delivery order.
    #[must_use]
    pub fn items(&self) -> Vec<T> {
        self.items.lock().clone()
    }
}

impl<T> Default for RecordingObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Observer<T> for RecordingObserver<T> {
    fn on_next(&self, item: T) -> Ack {
        let mut items = self.items.lock();
        items.push(item);
        match self.stop_after {
            Some(limit) if items.len() >= limit => Ack::Stop,
            _ => Ack::Continue,
        }
    }

    fn on_error(&self, error: ConfluxError) {
        *self.error.lock() = Some(error);
    }

    fn on_complete(&self) {
        self.completed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_items_in_order() {
        let observer: RecordingObserver<u32> = RecordingObserver::new();
        observer.on_next(1);
        observer.on_next(2);
        observer.on_next(3);
        assert_eq!(observer.items(), vec![1, 2, 3]);
        assert!(!observer.is_completed());
    }

    #[test]
    fn stops_after_the_configured_limit() {
        let observer: RecordingObserver<u32> = RecordingObserver::with_stop_after(2);
        assert!(matches!(observer.on_next(1), Ack::Continue));
        assert!(matches!(observer.on_next(2), Ack::Stop));
    }

    #[test]
    fn records_completion_and_error() {
        let observer: RecordingObserver<u32> = RecordingObserver::new();
        observer.on_complete();
        assert!(observer.is_completed());

        let observer: RecordingObserver<u32> = RecordingObserver::new();
        observer.on_error(ConfluxError::protocol_violation("boom"));
        observer.with_error(|e| assert!(e.is_some()));
    }
}
