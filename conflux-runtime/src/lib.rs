// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The `Executor`/`Timer` seam the Conflux core is parameterized over, plus
//! a Tokio implementation of both.

pub mod executor;
pub mod impls;
pub mod runtime;
pub mod timer;

pub use executor::Executor;
pub use runtime::Runtime;
pub use timer::Timer;

#[cfg(feature = "runtime-tokio")]
pub use impls::tokio::{TokioExecutor, TokioRuntime, TokioTimer};
