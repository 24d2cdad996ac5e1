// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Poison-tolerant `std::sync::Mutex` access.
//!
//! The hot paths in this crate use [`parking_lot`](crate::sync), which never
//! poisons. This module exists for the rarer case of a caller-supplied
//! `std::sync::Mutex` at a crate boundary, where a poisoned lock should
//! become a reportable [`ConfluxError`] rather than an unwinding panic.

use conflux_error::{ConfluxError, Result};
use std::sync::{Arc, Mutex, MutexGuard};

/// Lock `mutex`, recovering the guard even if a previous holder panicked
/// while holding it.
///
/// A poisoned lock means some data invariant may be broken; we still return
/// the guard (the caller asked for best-effort recovery, not a hard stop)
/// but log the poisoning at `warn` level when the `tracing` feature is on.
///
/// # Errors
/// This implementation always recovers rather than erroring, but returns
/// `Result` to leave room for a future policy that refuses to recover.
pub fn safe_lock<'a, T>(mutex: &'a Arc<Mutex<T>>, context: &str) -> Result<MutexGuard<'a, T>> {
    match mutex.lock() {
        Ok(guard) => Ok(guard),
        Err(poisoned) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(context, "mutex poisoned; recovering data");
            #[cfg(not(feature = "tracing"))]
            let _ = context;
            Ok(poisoned.into_inner())
        }
    }
}

/// Alias for [`safe_lock`] used at call sites that want to name the
/// operation being performed rather than the resource being locked.
///
/// # Errors
/// See [`safe_lock`].
pub fn try_lock<'a, T>(mutex: &'a Arc<Mutex<T>>, operation: &str) -> Result<MutexGuard<'a, T>> {
    safe_lock(mutex, operation)
}
