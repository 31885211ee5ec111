//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert a counter to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Ratio of two counters, returning 0.0 when the denominator is zero.
#[must_use]
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    u64_to_f64(numerator) / u64_to_f64(denominator)
}

/// Widen a `usize` index or count into the `u64` counter domain.
#[must_use]
pub fn usize_to_u64(value: usize) -> u64 {
    cast::<usize, u64>(value).unwrap_or(u64::MAX)
}

/// Narrow an attempt count into `usize` for indexing.
#[must_use]
pub fn u32_to_usize(value: u32) -> usize {
    cast::<u32, usize>(value).unwrap_or(usize::MAX)
}
