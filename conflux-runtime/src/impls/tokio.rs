// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::time::Duration;

use conflux_error::{ConfluxError, Result};
use futures::future::BoxFuture;

use crate::executor::Executor;
use crate::runtime::Runtime;
use crate::timer::Timer;

/// Submits work to whatever Tokio runtime is current when `submit` is called.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioExecutor;

impl TokioExecutor {
    /// Bind to the currently entered Tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self
    }
}

impl Executor for TokioExecutor {
    fn submit(&self, future: BoxFuture<'static, ()>) -> Result<()> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ConfluxError::executor_rejected(
                "no Tokio runtime is current",
            ));
        }
        tokio::spawn(future);
        Ok(())
    }
}

/// [`Timer`] backed by `tokio::time`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    type Sleep = tokio::time::Sleep;

    fn sleep(&self, duration: Duration) -> Self::Sleep {
        tokio::time::sleep(duration)
    }

    fn now(&self) -> std::time::Instant {
        std::time::Instant::now()
    }
}

/// The [`Runtime`] bundle for Tokio: [`TokioExecutor`] + [`TokioTimer`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioRuntime;

impl Runtime for TokioRuntime {
    type Executor = TokioExecutor;
    type Timer = TokioTimer;
}
