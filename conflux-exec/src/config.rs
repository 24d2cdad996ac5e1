// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Tunables for the Trampoline and BufferedSubscriber.
//!
//! These are compiled-in defaults, overridable per construction via
//! [`BufferedSubscriberConfig`]; there is no environment or file-based
//! configuration loading, and no reconfiguration after a subscription
//! exists.

/// Default number of synchronous `Continue` iterations the consumer loop
/// runs before yielding back to the executor. Must be a power of two ≥ 2.
pub const RECOMMENDED_BATCH_SIZE: usize = 1024;

/// Default growth chunk size for the `Unbounded` overflow strategy's
/// backing queue. Must be a power of two.
pub const RECOMMENDED_BUFFER_CHUNK_SIZE: usize = 256;

/// Whether a `BufferedSubscriber`'s run loop cancels itself automatically
/// once the downstream is done, rather than requiring an explicit cancel.
pub const AUTO_CANCELABLE_RUN_LOOPS: bool = true;

/// Retained for API parity with the external interface this crate exposes:
/// a recursive trampoline would use this as its self-fork threshold, the
/// nested-call depth past which the remainder is handed to the executor
/// instead of growing the native stack further. This crate's
/// [`crate::trampoline`] flattens nested submissions into a FIFO queue
/// instead of recursing, so no native stack growth ever needs bounding;
/// the constant is exposed anyway so callers porting a depth-sensitive
/// policy from elsewhere have somewhere to put the number. A power-of-two-
/// minus-one.
pub const FUSION_MAX_STACK_DEPTH: usize = 127;

/// Per-construction overrides for [`RECOMMENDED_BATCH_SIZE`] and
/// [`RECOMMENDED_BUFFER_CHUNK_SIZE`].
#[derive(Clone, Copy, Debug)]
pub struct BufferedSubscriberConfig {
    /// See [`RECOMMENDED_BATCH_SIZE`].
    pub batch_size: usize,
    /// See [`RECOMMENDED_BUFFER_CHUNK_SIZE`].
    pub buffer_chunk_size: usize,
}

impl Default for BufferedSubscriberConfig {
    fn default() -> Self {
        Self {
            batch_size: RECOMMENDED_BATCH_SIZE,
            buffer_chunk_size: RECOMMENDED_BUFFER_CHUNK_SIZE,
        }
    }
}
