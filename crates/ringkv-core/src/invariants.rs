//! Debug assertion macros for hash table, grow, and ring invariants.
//!
//! These provide runtime checks for the invariants documented in spec.md
//! §8 "Testable Properties". They are only active in debug builds
//! (`#[cfg(debug_assertions)]`), so there is zero overhead in release
//! builds.

// =============================================================================
// INV-SIZE-01: Monotone Size
// =============================================================================

/// Assert that a table's `size` only ever increases.
///
/// **Invariant**: for all t1 <= t2, `size(t1) <= size(t2)`.
///
/// Used in: `Table::try_insert` after the size CAS loop.
macro_rules! debug_assert_size_monotonic {
    ($old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "INV-SIZE-01 violated: size decreased from {} to {}",
            $old,
            $new
        )
    };
}

// =============================================================================
// INV-GROW-01: Load Factor Bound
// =============================================================================

/// Assert that a grow leaves the table at most half full.
///
/// **Invariant**: on grow completion, `size <= capacity / 2`.
///
/// Used in: `grow::run` after the new table is fully populated.
macro_rules! debug_assert_load_factor_bound {
    ($size:expr, $capacity:expr) => {
        debug_assert!(
            ($size as f64) <= ($capacity as f64) / 2.0,
            "INV-GROW-01 violated: size {} exceeds half of capacity {} after grow",
            $size,
            $capacity
        )
    };
}

// =============================================================================
// INV-GROW-02: Size Preserved Across Grow
// =============================================================================

/// Assert that a grow neither adds nor drops entries.
///
/// **Invariant**: `new_table.size() == old_table.size()`.
///
/// Used in: `grow::run` after all helper workers join.
macro_rules! debug_assert_size_preserved {
    ($old:expr, $new:expr) => {
        debug_assert_eq!(
            $old, $new,
            "INV-GROW-02 violated: grow changed size from {} to {}",
            $old, $new
        )
    };
}

// =============================================================================
// INV-RING-01: Bounded Occupancy
// =============================================================================

/// Assert that the ring's claimed-but-unpublished region never exceeds
/// capacity.
///
/// **Invariant**: `(p_head - c_tail) mod RING_SIZE < RING_SIZE`.
///
/// Used in: `Ring::submit` after a successful head claim.
macro_rules! debug_assert_ring_bounded {
    ($occupancy:expr, $capacity:expr) => {
        debug_assert!(
            $occupancy < $capacity,
            "INV-RING-01 violated: occupancy {} reaches capacity {}",
            $occupancy,
            $capacity
        )
    };
}

pub(crate) use debug_assert_load_factor_bound;
pub(crate) use debug_assert_ring_bounded;
pub(crate) use debug_assert_size_monotonic;
pub(crate) use debug_assert_size_preserved;
