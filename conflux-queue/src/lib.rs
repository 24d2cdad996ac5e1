// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The concurrent queue substrate behind the Conflux buffered subscriber:
//! a bounded lock-free ring selected by [`conflux_core::ChannelType`], and
//! an unbounded chunked queue for the `Unbounded` overflow strategy.

mod ring;
pub mod queue;
pub mod unbounded;

pub use queue::ConcurrentQueue;
pub use unbounded::UnboundedQueue;
