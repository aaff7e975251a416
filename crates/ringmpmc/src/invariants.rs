//! Debug assertion macros for the slot-stamp protocol.
//!
//! Only active in debug builds (`#[cfg(debug_assertions)]`), so release builds
//! carry no overhead.

// =============================================================================
// Stamp transitions
// =============================================================================

/// Assert that a published stamp is exactly `position + 1`.
///
/// Used in: `try_offer()` before the release store
macro_rules! debug_assert_publish_stamp {
    ($stamp:expr, $pos:expr) => {
        debug_assert!(
            $stamp == $pos.wrapping_add(1),
            "stamp {} does not publish position {}",
            $stamp,
            $pos
        )
    };
}

/// Assert that a re-armed stamp is exactly `position + capacity`.
///
/// A slot re-armed to anything else would either be offered twice in the
/// same lap or never again.
///
/// Used in: `release_slot()` after a poll takes the value
macro_rules! debug_assert_rearm_stamp {
    ($stamp:expr, $pos:expr, $capacity:expr) => {
        debug_assert!(
            $stamp == $pos.wrapping_add($capacity as u64),
            "stamp {} does not re-arm position {} for capacity {}",
            $stamp,
            $pos,
            $capacity
        )
    };
}

// =============================================================================
// Position counters
// =============================================================================

/// Assert that the ring never holds more than `capacity` values.
///
/// **Invariant**: `tail - head ≤ capacity`
///
/// Used in: `Drop` where both counters are quiescent
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

/// Assert that a batched claim stays within the configured limit.
///
/// Used in: `poll_n_batched()` before the head CAS
macro_rules! debug_assert_batch_within_limit {
    ($available:expr, $limit:expr) => {
        debug_assert!(
            $available >= 1 && $available <= $limit,
            "batch run of {} outside 1..={}",
            $available,
            $limit
        )
    };
}

pub(crate) use debug_assert_batch_within_limit;
pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_publish_stamp;
pub(crate) use debug_assert_rearm_stamp;
