// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Fixed-point activation functions
//!
//! `tanh` is a concave piecewise-linear curve on `|x|` with knots at
//! 0.25, 0.5, 0.75, 1.0, 1.5 and 2.25, saturating at 1.0 beyond the last
//! knot. Slopes only use small numerators and power-of-two denominators so
//! the evaluation is shifts and adds. `sigmoid` is derived from it as
//! `(tanh(x / 2) + 1) / 2`.
//!
//! Every function here has the signature `fn(FixedPoint, u8) -> FixedPoint`
//! and can be handed to [`crate::vector::apply`].

use crate::scalar::{FixedPoint, MAX_PRECISION};

/// Knot positions in quarters of 1.0
const KNOT_QUARTERS: [i32; 6] = [1, 2, 3, 4, 6, 9];

/// Slope of the segment ending at each knot, as (numerator, right shift)
const SLOPES: [(i32, u32); 6] = [(1, 0), (13, 4), (11, 4), (1, 1), (5, 4), (1, 3)];

/// tanh(|x|) in raw units of `one`
fn tanh_magnitude(x: i32, one: i32) -> i32 {
    let mut start = 0;
    let mut y = 0;

    for (&quarters, &(numerator, shift)) in KNOT_QUARTERS.iter().zip(SLOPES.iter()) {
        let end = (quarters * one) >> 2;
        if x <= end {
            return (y + ((numerator * (x - start)) >> shift)).min(one);
        }
        y += (numerator * (end - start)) >> shift;
        start = end;
    }

    one
}

/// Signed tanh on a raw i32 input, result in raw units
fn tanh_raw(x: i32, precision: u8) -> i32 {
    let one = 1i32 << precision.min(MAX_PRECISION);
    let magnitude = tanh_magnitude(x.abs(), one);
    if x < 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Hyperbolic tangent approximation
///
/// Monotonic, odd, and saturating to ±1.0. Precision above
/// [`MAX_PRECISION`] is evaluated at [`MAX_PRECISION`].
///
/// # Example
/// ```
/// use adleak_fixed::{activation, FixedPoint};
///
/// assert_eq!(activation::tanh(FixedPoint::from_raw(1024), 10).raw(), 768);
/// assert_eq!(activation::tanh(FixedPoint::from_raw(-4000), 10).raw(), -1024);
/// ```
pub fn tanh(x: FixedPoint, precision: u8) -> FixedPoint {
    FixedPoint::saturating_from_i32(tanh_raw(i32::from(x.raw()), precision))
}

/// Logistic sigmoid approximation, `(tanh(x / 2) + 1) / 2`
///
/// Monotonic and bounded to `[0, 1.0]`.
///
/// # Example
/// ```
/// use adleak_fixed::{activation, FixedPoint};
///
/// assert_eq!(activation::sigmoid(FixedPoint::ZERO, 10).raw(), 512);
/// assert_eq!(activation::sigmoid(FixedPoint::from_raw(-5000), 10).raw(), 0);
/// ```
pub fn sigmoid(x: FixedPoint, precision: u8) -> FixedPoint {
    let one = 1i32 << precision.min(MAX_PRECISION);
    let half_x = i32::from(x.raw()) >> 1;
    FixedPoint::saturating_from_i32((tanh_raw(half_x, precision) + one) >> 1)
}

/// Rectified linear unit; precision is unused
pub fn relu(x: FixedPoint, _precision: u8) -> FixedPoint {
    x.relu()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(raw: i16) -> FixedPoint {
        FixedPoint::from_raw(raw)
    }

    #[test]
    fn test_tanh_reference_points() {
        let inputs = [0, 512, -512, 1024, 2040, 4000];
        let expected = [0, 464, -464, 768, 991, 1024];
        for (x, y) in inputs.iter().zip(expected.iter()) {
            assert_eq!(tanh(fx(*x), 10).raw(), *y, "tanh({})", x);
        }
    }

    #[test]
    fn test_sigmoid_reference_points() {
        let inputs = [0, 512, -512, 1024, 2040, 5000, -5000];
        let expected = [512, 640, 384, 744, 895, 1024, 0];
        for (x, y) in inputs.iter().zip(expected.iter()) {
            assert_eq!(sigmoid(fx(*x), 10).raw(), *y, "sigmoid({})", x);
        }
    }

    #[test]
    fn test_tanh_monotonic_and_bounded() {
        for precision in [0u8, 4, 8, 10, 13] {
            let one = FixedPoint::one(precision).raw();
            let mut previous = tanh(FixedPoint::MIN, precision);
            assert_eq!(previous.raw(), -one);

            let mut raw = FixedPoint::MIN.raw();
            while raw < FixedPoint::MAX.raw() - 97 {
                raw += 97;
                let current = tanh(fx(raw), precision);
                assert!(current >= previous, "p={} x={}", precision, raw);
                assert!(current.raw().abs() <= one);
                previous = current;
            }
            assert_eq!(tanh(FixedPoint::MAX, precision).raw(), one);
        }
    }

    #[test]
    fn test_sigmoid_monotonic_and_bounded() {
        let precision = 10;
        let mut previous = sigmoid(FixedPoint::MIN, precision);
        assert_eq!(previous, FixedPoint::ZERO);

        for raw in (-6000i16..6000).step_by(13) {
            let current = sigmoid(fx(raw), precision);
            assert!(current >= previous, "x={}", raw);
            assert!(current.raw() >= 0 && current.raw() <= 1024);
            previous = current;
        }
    }

    #[test]
    fn test_full_precision_stays_in_range() {
        // At precision 15 the whole input range lies below 1.0
        assert_eq!(tanh(FixedPoint::MAX, 15).raw(), 24575);
        assert_eq!(tanh(FixedPoint::MIN, 15).raw(), -24575);
        assert_eq!(sigmoid(FixedPoint::ZERO, 15).raw(), 16384);
    }

    #[test]
    fn test_precision_above_calibrated_range_is_clamped() {
        assert_eq!(tanh(fx(1000), 20), tanh(fx(1000), MAX_PRECISION));
    }

    #[test]
    fn test_relu_ignores_precision() {
        assert_eq!(relu(fx(-40), 3), FixedPoint::ZERO);
        assert_eq!(relu(fx(40), 3).raw(), 40);
    }
}
