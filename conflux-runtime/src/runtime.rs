// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Bundles the concrete `Executor` and `Timer` a caller wires the core to.

use crate::{executor::Executor, timer::Timer};

/// A named bundle of the runtime facilities the core needs: somewhere to
/// submit work, and (optionally, for timeout-bearing callers) a clock.
pub trait Runtime: 'static {
    /// The executor this runtime submits work to.
    type Executor: Executor + Clone;
    /// The clock this runtime uses for timeouts.
    type Timer: Timer + Default;
}
