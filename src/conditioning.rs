// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Methods to turn random bits into more constrained data types.

use crate::rngs::RNG;

/// Largest f64 strictly below 1.0.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Maps `value` in `[0, m]` to `value / (m + 1)` in `[0, 1)`.
/// For moduli close to 2**64 the division rounds up to 1.0, those results
/// are clamped to the largest float below one.
pub fn normalize_value(value: u64, m: u64) -> f64 {
    (value as f64 / (m as f64 + 1.0)).min(BELOW_ONE)
}

/// Generate integer between 'lower' (inclusive) and 'upper' (exclusive).
/// Uses rejection sampling so the number of rng calls required is theoretically unbounded.
pub fn rs_random_int(test_rng: &mut impl RNG, lower: u64, upper: u64) -> u64 {
    assert!(upper > lower);
    let range: u64 = upper - lower;
    if range == 1 {
        return lower;
    }
    let mut rn;
    loop {
        rn = test_rng.next() & (u64::MAX >> (range - 1).leading_zeros());
        if rn < range {
            break;
        }
    }
    rn + lower
}

/// Maps a value of a map trajectory in [0, 1] onto `[0, m]`.
pub fn unit_to_range(x: f64, m: u64) -> u64 {
    let scaled = x * (m as f64 + 1.0);
    if scaled.is_nan() || scaled <= 0.0 {
        0
    } else {
        // `as` saturates at u64::MAX for huge values
        (scaled as u64).min(m)
    }
}

/// Scale a value in [0, 1) to a 53 bit integer so it can be mixed into
/// integer state.
pub fn unit_to_bits(x: f64) -> u64 {
    (x * (1u64 << 53) as f64) as u64
}
