// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Test doubles shared across the Conflux workspace.
//!
//! Every crate's `dev-dependencies` pulls this one in: a [`RecordingObserver`]
//! for asserting exact `on_next`/`on_error`/`on_complete` sequences, a
//! [`ManualExecutor`] for deterministic step-by-step draining (needed to make
//! timing-sensitive scenarios like backpressure liveness and trampoline
//! stack-depth reproducible instead of racy), and a [`RecordingSubscription`]
//! for asserting Reactive Streams demand accounting.

#![allow(clippy::multiple_crate_versions)]

pub mod manual_executor;
pub mod recording_observer;
pub mod recording_subscription;

pub use manual_executor::ManualExecutor;
pub use recording_observer::RecordingObserver;
pub use recording_subscription::RecordingSubscription;
