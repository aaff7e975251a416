//! Error types for ring construction.
//!
//! Offer and poll never produce an error value: a full or empty ring, or a
//! lost race, is reported through `bool`/`Option` so the hot path stays
//! allocation- and branch-light.

use thiserror::Error;

/// Errors raised while validating a [`Config`](crate::Config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// Capacity is not a power of two, or is smaller than 2.
    #[error("capacity {capacity} must be a power of two and at least 2")]
    InvalidCapacity {
        /// The rejected slot count.
        capacity: usize,
    },

    /// Requested ring is larger than the supported maximum.
    #[error("ring_bits {ring_bits} exceeds the maximum of {max}")]
    CapacityTooLarge {
        /// The requested size exponent.
        ring_bits: u8,
        /// The largest accepted exponent.
        max: u8,
    },

    /// A batched poll must be allowed to claim at least one slot.
    #[error("batch limit must be at least 1")]
    InvalidBatchLimit,
}
