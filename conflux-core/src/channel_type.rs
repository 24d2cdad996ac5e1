// Copyright 2025 Conflux Contributors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Producer/consumer multiplicity selecting a queue's synchronization path.

use std::fmt;

/// How many threads may call the producer-side (`offer`) operation concurrently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProducerType {
    /// Exactly one thread ever offers. The offer path may use relaxed loads
    /// and stores instead of a CAS loop, at the cost of requiring the caller
    /// to invoke `fence_offer()` before handing the queue to another thread.
    Single,
    /// Any number of threads may offer concurrently. The offer path always
    /// synchronizes itself with a CAS loop; no external fence is needed.
    Multi,
}

/// How many threads may call the consumer-side (`poll`) operation concurrently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConsumerType {
    /// Exactly one thread ever polls. Mirrors [`ProducerType::Single`]:
    /// relaxed fast path, caller must invoke `fence_poll()` on handoff.
    Single,
    /// Any number of threads may poll concurrently; self-synchronizing.
    Multi,
}

/// The producer/consumer shape of a [`ConcurrentQueue`](crate::ConcurrentQueue),
/// selecting which fast path its `offer`/`poll` implementation takes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelType {
    pub producer: ProducerType,
    pub consumer: ConsumerType,
}

impl ChannelType {
    /// Multi-producer, multi-consumer: fully self-synchronizing on both sides.
    pub const MPMC: Self = Self {
        producer: ProducerType::Multi,
        consumer: ConsumerType::Multi,
    };
    /// Single-producer, multi-consumer.
    pub const SPMC: Self = Self {
        producer: ProducerType::Single,
        consumer: ConsumerType::Multi,
    };
    /// Multi-producer, single-consumer.
    pub const MPSC: Self = Self {
        producer: ProducerType::Multi,
        consumer: ConsumerType::Single,
    };
    /// Single-producer, single-consumer: both sides take the relaxed fast
    /// path and both `fence_offer()`/`fence_poll()` become the caller's
    /// responsibility on any cross-thread handoff.
    pub const SPSC: Self = Self {
        producer: ProducerType::Single,
        consumer: ConsumerType::Single,
    };

    /// `true` if the producer side must self-synchronize (no fence needed).
    #[must_use]
    pub const fn producer_is_multi(&self) -> bool {
        matches!(self.producer, ProducerType::Multi)
    }

    /// `true` if the consumer side must self-synchronize (no fence needed).
    #[must_use]
    pub const fn consumer_is_multi(&self) -> bool {
        matches!(self.consumer, ConsumerType::Multi)
    }
}

impl fmt::Debug for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match (self.producer, self.consumer) {
            (ProducerType::Multi, ConsumerType::Multi) => "MPMC",
            (ProducerType::Single, ConsumerType::Multi) => "SPMC",
            (ProducerType::Multi, ConsumerType::Single) => "MPSC",
            (ProducerType::Single, ConsumerType::Single) => "SPSC",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spsc_is_single_on_both_sides() {
        assert!(!ChannelType::SPSC.producer_is_multi());
        assert!(!ChannelType::SPSC.consumer_is_multi());
    }

    #[test]
    fn mpmc_is_multi_on_both_sides() {
        assert!(ChannelType::MPMC.producer_is_multi());
        assert!(ChannelType::MPMC.consumer_is_multi());
    }

    #[test]
    fn debug_names_match_conventional_acronyms() {
        assert_eq!(format!("{:?}", ChannelType::MPSC), "MPSC");
        assert_eq!(format!("{:?}", ChannelType::SPMC), "SPMC");
    }
}
