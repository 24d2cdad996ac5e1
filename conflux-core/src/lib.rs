// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(clippy::multiple_crate_versions)]

//! Core types of the Conflux push-pull reactive streaming core.
//!
//! This crate has no notion of a buffer or an executor: it defines the
//! vocabulary ([`Ack`], [`Observer`], [`Cancelable`], [`OverflowStrategy`],
//! [`ChannelType`]) that the buffering and execution layers
//! (`conflux-queue`, `conflux-exec`) build on.

pub mod ack;
pub mod cancelable;
pub mod cancellation_token;
pub mod channel_type;
pub mod lock_utilities;
pub mod observer;
pub mod overflow_strategy;
pub mod sync;

pub use ack::{Ack, AckResolver, AckValue, PendingAck, pending_ack};
pub use cancelable::{BooleanCancelable, Cancelable, CompositeCancelable, FnCancelable};
pub use cancellation_token::{CancellationToken, Cancelled};
pub use channel_type::{ChannelType, ConsumerType, ProducerType};
pub use observer::Observer;
pub use overflow_strategy::OverflowStrategy;
