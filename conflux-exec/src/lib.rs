// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The Trampoline and BufferedSubscriber that drive the Conflux core's
//! consumer loop: the concurrency machinery that sits between arbitrary
//! producer threads and a single serially-called [`conflux_core::Observer`].

#![allow(clippy::multiple_crate_versions)]

#[macro_use]
mod logging;

pub mod buffered_subscriber;
pub mod buffered_sync;
pub mod config;
pub mod trampoline;

pub use buffered_subscriber::BufferedSubscriber;
pub use buffered_sync::SyncBufferedSubscriber;
pub use config::BufferedSubscriberConfig;
