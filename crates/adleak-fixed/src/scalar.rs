// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Saturating fixed-point scalar
//!
//! A [`FixedPoint`] is a signed 16-bit word read as `raw / 2^precision`.
//! Precision is not stored in the value; operations that rescale (multiply,
//! activations) take it as an argument.
//!
//! The representable range is symmetric, `[-32767, 32767]`. `i16::MIN` is
//! never produced, so `abs` and negation are total.

use core::fmt;
use core::ops::{Add, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest fractional-bit count the kernel is calibrated for
pub const MAX_PRECISION: u8 = 15;

/// Shift amount for a rescale, bounded so that `i32 >> n` is always defined.
#[inline(always)]
pub(crate) const fn shift_amount(precision: u8) -> u32 {
    if precision > 31 {
        31
    } else {
        precision as u32
    }
}

/// Signed 16-bit fixed-point value with saturating arithmetic
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "i16", into = "i16"))]
#[repr(transparent)]
pub struct FixedPoint(i16);

impl FixedPoint {
    /// Largest representable value (`INT16_MAX`)
    pub const MAX: Self = Self(i16::MAX);

    /// Smallest representable value (`INT16_MIN + 1`)
    pub const MIN: Self = Self(i16::MIN + 1);

    /// Zero at any precision
    pub const ZERO: Self = Self(0);

    /// Wrap a raw word, clamping `i16::MIN` up to [`FixedPoint::MIN`]
    ///
    /// # Example
    /// ```
    /// use adleak_fixed::FixedPoint;
    ///
    /// assert_eq!(FixedPoint::from_raw(-512).raw(), -512);
    /// assert_eq!(FixedPoint::from_raw(i16::MIN), FixedPoint::MIN);
    /// ```
    #[inline]
    pub const fn from_raw(raw: i16) -> Self {
        if raw < Self::MIN.0 {
            Self::MIN
        } else {
            Self(raw)
        }
    }

    /// Clamp a wide intermediate result into range
    #[inline]
    pub const fn saturating_from_i32(value: i32) -> Self {
        if value > Self::MAX.0 as i32 {
            Self::MAX
        } else if value < Self::MIN.0 as i32 {
            Self::MIN
        } else {
            Self(value as i16)
        }
    }

    /// The raw word
    #[inline]
    pub const fn raw(self) -> i16 {
        self.0
    }

    /// 1.0 at the given precision (saturates to MAX at precision 15)
    #[inline]
    pub const fn one(precision: u8) -> Self {
        if precision >= MAX_PRECISION {
            Self::MAX
        } else {
            Self(1i16 << precision)
        }
    }

    #[inline]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Saturating addition
    ///
    /// # Example
    /// ```
    /// use adleak_fixed::FixedPoint;
    ///
    /// let near_max = FixedPoint::from_raw(32000);
    /// assert_eq!(near_max.saturating_add(near_max), FixedPoint::MAX);
    /// ```
    #[inline]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self::saturating_from_i32(self.0 as i32 + other.0 as i32)
    }

    /// Saturating subtraction
    #[inline]
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self::saturating_from_i32(self.0 as i32 - other.0 as i32)
    }

    /// Absolute value; total because MIN is symmetric with MAX
    #[inline]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Fixed-point product
    ///
    /// Forms the full 32-bit product, shifts right arithmetically by
    /// `precision` (rounding toward negative infinity) and saturates.
    ///
    /// # Example
    /// ```
    /// use adleak_fixed::FixedPoint;
    ///
    /// let a = FixedPoint::from_raw(-560);
    /// let b = FixedPoint::from_raw(-1284);
    /// assert_eq!(a.multiply(b, 10).raw(), 702);
    /// ```
    #[inline]
    pub const fn multiply(self, other: Self, precision: u8) -> Self {
        let product = self.0 as i32 * other.0 as i32;
        Self::saturating_from_i32(product >> shift_amount(precision))
    }

    /// Largest of `self` and zero
    #[inline]
    pub const fn relu(self) -> Self {
        if self.0 < 0 {
            Self::ZERO
        } else {
            self
        }
    }
}

impl Add for FixedPoint {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        self.saturating_add(other)
    }
}

impl Sub for FixedPoint {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        self.saturating_sub(other)
    }
}

impl Neg for FixedPoint {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl From<i16> for FixedPoint {
    #[inline]
    fn from(raw: i16) -> Self {
        Self::from_raw(raw)
    }
}

impl From<FixedPoint> for i16 {
    #[inline]
    fn from(value: FixedPoint) -> Self {
        value.0
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_saturates_high() {
        let a = FixedPoint::from_raw(30000);
        let b = FixedPoint::from_raw(5000);
        assert_eq!(a + b, FixedPoint::MAX);
        assert_eq!(b + a, FixedPoint::MAX);
    }

    #[test]
    fn test_add_saturates_low() {
        let a = FixedPoint::from_raw(-30000);
        let b = FixedPoint::from_raw(-5000);
        assert_eq!(a + b, FixedPoint::MIN);
        assert_eq!(FixedPoint::MIN.raw(), -32767);
    }

    #[test]
    fn test_sub_saturates() {
        assert_eq!(FixedPoint::MIN - FixedPoint::from_raw(1), FixedPoint::MIN);
        assert_eq!(FixedPoint::MAX - FixedPoint::from_raw(-1), FixedPoint::MAX);
        assert_eq!(
            FixedPoint::from_raw(100) - FixedPoint::from_raw(250),
            FixedPoint::from_raw(-150)
        );
    }

    #[test]
    fn test_neg_and_abs_are_total() {
        assert_eq!(-FixedPoint::MIN, FixedPoint::MAX);
        assert_eq!(FixedPoint::MIN.abs(), FixedPoint::MAX);
        assert_eq!(FixedPoint::from_raw(i16::MIN).abs(), FixedPoint::MAX);
    }

    #[test]
    fn test_multiply_truncates_toward_negative_infinity() {
        // -3 * 1 at precision 1 is -1.5, which floors to -2
        let a = FixedPoint::from_raw(-3);
        let b = FixedPoint::from_raw(1);
        assert_eq!(a.multiply(b, 1).raw(), -2);
        assert_eq!(FixedPoint::from_raw(3).multiply(b, 1).raw(), 1);
    }

    #[test]
    fn test_multiply_reference_values() {
        let pairs: [(i16, i16, i16); 4] = [
            (-560, -1284, 702),
            (-1751, -214, 365),
            (-586, -567, 324),
            (-1333, 1255, -1634),
        ];
        for (a, b, expected) in pairs {
            let product = FixedPoint::from_raw(a).multiply(FixedPoint::from_raw(b), 10);
            assert_eq!(product.raw(), expected, "{} * {}", a, b);
        }
    }

    #[test]
    fn test_multiply_saturates() {
        let big = FixedPoint::from_raw(20000);
        assert_eq!(big.multiply(big, 0), FixedPoint::MAX);
        assert_eq!(big.multiply(-big, 0), FixedPoint::MIN);
    }

    #[test]
    fn test_one() {
        assert_eq!(FixedPoint::one(0).raw(), 1);
        assert_eq!(FixedPoint::one(10).raw(), 1024);
        assert_eq!(FixedPoint::one(15), FixedPoint::MAX);
    }

    #[test]
    fn test_relu() {
        assert_eq!(FixedPoint::from_raw(-5).relu(), FixedPoint::ZERO);
        assert_eq!(FixedPoint::from_raw(5).relu().raw(), 5);
    }
}
