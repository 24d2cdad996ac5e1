// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The `Executor` seam: the core never spawns a thread itself, it submits
//! units of work here.

use conflux_error::{ConfluxError, Result};
use futures::future::BoxFuture;

/// A "submit this runnable" abstraction. `BufferedSubscriber`'s consumer
/// loop and the `Trampoline`'s fork-on-exception path both go through this
/// rather than calling a concrete async runtime directly.
pub trait Executor: Send + Sync + 'static {
    /// Schedule `future` to run, detached from the caller.
    ///
    /// # Errors
    /// Returns [`ConfluxError::ExecutorRejected`] if the runtime refuses the
    /// submission (e.g. it is shutting down).
    fn submit(&self, future: BoxFuture<'static, ()>) -> Result<()>;
}

impl<E: Executor + ?Sized> Executor for std::sync::Arc<E> {
    fn submit(&self, future: BoxFuture<'static, ()>) -> Result<()> {
        (**self).submit(future)
    }
}

#[cfg(feature = "runtime-tokio")]
pub use crate::impls::tokio::TokioExecutor;
