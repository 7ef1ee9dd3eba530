//! Debug assertion macros for shared-memory ring invariants.
//!
//! These macros provide runtime checks for the data-model invariants
//! documented on the ring's header and data-area layout. They are only
//! active in debug builds (`#[cfg(debug_assertions)]` via `debug_assert!`),
//! so there is zero overhead in release builds.

// =============================================================================
// INV-1: Power of two capacity
// =============================================================================

/// Assert that the data-area capacity is a power of two and `mask = capacity - 1`.
///
/// Used in: `RegionLayout::attach` right after reading `mask` from the header.
macro_rules! debug_assert_power_of_two_capacity {
    ($mask:expr) => {
        debug_assert!(
            ($mask.wrapping_add(1)) & $mask == 0,
            "INV-1 violated: mask {} does not correspond to a power-of-two capacity",
            $mask
        )
    };
}

// =============================================================================
// INV-2: Indices stay within the data area
// =============================================================================

/// Assert an index lies in `[0, capacity)`.
///
/// Used in: after every load of `producer_index`/`consumer_index`.
macro_rules! debug_assert_index_in_range {
    ($name:literal, $idx:expr, $capacity:expr) => {
        debug_assert!(
            $idx < $capacity,
            "INV-2 violated: {} {} not in [0, {})",
            $name,
            $idx,
            $capacity
        )
    };
}

// =============================================================================
// INV-3: Item header stays within the data area
// =============================================================================

/// Assert a record's header + payload lies entirely within `[0, capacity)`.
///
/// Used in: `Reserve` and `Peek` just before returning the payload address.
macro_rules! debug_assert_item_in_bounds {
    ($start:expr, $total_len:expr, $capacity:expr) => {
        debug_assert!(
            $start + $total_len <= $capacity,
            "INV-3 violated: item at {} of length {} crosses the end of the {}-byte data area",
            $start,
            $total_len,
            $capacity
        )
    };
}

// =============================================================================
// INV-5: Record length bound
// =============================================================================

/// Assert a requested/observed record length never exceeds `capacity / 2`.
///
/// Used in: `Reserve` before publishing the length word, and in `Peek` after
/// decoding `item_len`.
macro_rules! debug_assert_len_within_half_capacity {
    ($len:expr, $capacity:expr) => {
        debug_assert!(
            ($len as u64) <= $capacity / 2,
            "INV-5 violated: record length {} exceeds half the {}-byte capacity",
            $len,
            $capacity
        )
    };
}

// =============================================================================
// INV-6: No partially-committed item is observable
// =============================================================================

/// Assert the length word was fully published (non-zero) before any consumer
/// could have observed the new tail.
///
/// Used in: `Reserve`, immediately after the length-word CAS succeeds and
/// before `CommitProduce` is called.
macro_rules! debug_assert_length_word_published {
    ($len:expr) => {
        debug_assert!(
            $len != 0,
            "INV-6 violated: length word was not published before commit"
        )
    };
}

pub(crate) use debug_assert_index_in_range;
pub(crate) use debug_assert_item_in_bounds;
pub(crate) use debug_assert_len_within_half_capacity;
pub(crate) use debug_assert_length_word_published;
pub(crate) use debug_assert_power_of_two_capacity;
