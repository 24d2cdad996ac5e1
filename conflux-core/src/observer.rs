// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! The push-style `Observer` contract: `on_next` / `on_error` / `on_complete`.

use crate::Ack;
use conflux_error::ConfluxError;

/// A single-writer, terminal-once push consumer.
///
/// Contract (enforced cooperatively by callers, not by the type system):
///
/// - The caller must wait for the previous `on_next`'s [`Ack`] to resolve
///   before issuing the next call.
/// - After `on_next` resolves to [`AckValue::Stop`](crate::AckValue::Stop), no
///   further calls may be made.
/// - After any terminal (`on_error` or `on_complete`), no further calls at all.
///
/// Implementations that synchronously panic or otherwise fail from `on_next`
/// are a contract violation on the *downstream's* part; callers report such
/// failures through their own failure reporter and treat the subscription as
/// stopped rather than propagating the panic.
pub trait Observer<T>: Send {
    /// Push one item downstream, returning an acknowledgement.
    fn on_next(&self, item: T) -> Ack;

    /// Deliver the terminal error. At most one terminal is ever delivered.
    fn on_error(&self, error: ConfluxError);

    /// Deliver terminal completion. At most one terminal is ever delivered.
    fn on_complete(&self);
}

impl<T, O: Observer<T> + ?Sized> Observer<T> for std::sync::Arc<O> {
    fn on_next(&self, item: T) -> Ack {
        (**self).on_next(item)
    }

    fn on_error(&self, error: ConfluxError) {
        (**self).on_error(error);
    }

    fn on_complete(&self) {
        (**self).on_complete();
    }
}
