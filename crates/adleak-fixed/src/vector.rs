// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Vector kernel over borrowed slices
//!
//! A vector is a caller-owned `[FixedPoint]`; nothing here allocates.
//! Every operation validates all operand lengths before touching `dst`, so a
//! [`FixedPointError::ShapeMismatch`](crate::FixedPointError) leaves the
//! output exactly as it was.

use crate::error::{check_len, Result};
use crate::scalar::FixedPoint;

/// Fill `dst` with a constant
#[inline]
pub fn set(dst: &mut [FixedPoint], value: FixedPoint) {
    dst.fill(value);
}

/// Elementwise saturating sum
pub fn add(dst: &mut [FixedPoint], a: &[FixedPoint], b: &[FixedPoint]) -> Result<()> {
    zip_into(dst, a, b, |x, y| x.saturating_add(y))
}

/// Elementwise saturating difference `a - b`
pub fn sub(dst: &mut [FixedPoint], a: &[FixedPoint], b: &[FixedPoint]) -> Result<()> {
    zip_into(dst, a, b, |x, y| x.saturating_sub(y))
}

/// Elementwise saturating `|a - b|`
pub fn absolute_diff(dst: &mut [FixedPoint], a: &[FixedPoint], b: &[FixedPoint]) -> Result<()> {
    zip_into(dst, a, b, |x, y| x.saturating_sub(y).abs())
}

/// Elementwise fixed-point product
pub fn multiply(
    dst: &mut [FixedPoint],
    a: &[FixedPoint],
    b: &[FixedPoint],
    precision: u8,
) -> Result<()> {
    zip_into(dst, a, b, |x, y| x.multiply(y, precision))
}

/// Gated interpolation between two vectors
///
/// `dst[i] = gate * a[i] + (1 - gate) * b[i]`, where `gate` lies in
/// `[0, 2^precision]` and both products use the kernel multiply. With `a` as
/// the new observation and `b` as the running state this is one step of an
/// exponential moving average.
///
/// # Example
/// ```
/// use adleak_fixed::{vector, FixedPoint};
///
/// let a = [FixedPoint::from_raw(513), FixedPoint::from_raw(-1660)];
/// let b = [FixedPoint::from_raw(1555), FixedPoint::from_raw(1880)];
/// let mut dst = [FixedPoint::ZERO; 2];
///
/// vector::gated_add_scalar(&mut dst, &a, &b, FixedPoint::from_raw(256), 10).unwrap();
/// assert_eq!(dst, [FixedPoint::from_raw(1294), FixedPoint::from_raw(995)]);
/// ```
pub fn gated_add_scalar(
    dst: &mut [FixedPoint],
    a: &[FixedPoint],
    b: &[FixedPoint],
    gate: FixedPoint,
    precision: u8,
) -> Result<()> {
    let complement = FixedPoint::one(precision).saturating_sub(gate);
    zip_into(dst, a, b, |x, y| {
        gate.multiply(x, precision)
            .saturating_add(complement.multiply(y, precision))
    })
}

/// Saturating L1 norm
///
/// Accumulates `|v[i]|` with a clamp after every step, so an overflowing
/// vector reports exactly [`FixedPoint::MAX`] and never a wrapped value.
pub fn norm(v: &[FixedPoint]) -> FixedPoint {
    v.iter()
        .fold(FixedPoint::ZERO, |acc, x| acc.saturating_add(x.abs()))
}

/// Saturating L1 norm of `a - b`, computed without a scratch buffer
///
/// # Example
/// ```
/// use adleak_fixed::{vector, FixedPoint};
///
/// let a = [709, 600, -1899, -737].map(FixedPoint::from_raw);
/// let b = [1428, -1688, 1910, 334].map(FixedPoint::from_raw);
/// assert_eq!(vector::diff_norm(&a, &b).unwrap().raw(), 7887);
/// ```
pub fn diff_norm(a: &[FixedPoint], b: &[FixedPoint]) -> Result<FixedPoint> {
    check_len(a.len(), b.len())?;
    Ok(a.iter().zip(b).fold(FixedPoint::ZERO, |acc, (x, y)| {
        acc.saturating_add(x.saturating_sub(*y).abs())
    }))
}

/// Saturating dot product, accumulated left to right
pub fn dot_prod(a: &[FixedPoint], b: &[FixedPoint], precision: u8) -> Result<FixedPoint> {
    check_len(a.len(), b.len())?;
    Ok(a.iter().zip(b).fold(FixedPoint::ZERO, |acc, (x, y)| {
        acc.saturating_add(x.multiply(*y, precision))
    }))
}

/// Concatenate `a` then `b` into `dst`
pub fn stack(dst: &mut [FixedPoint], a: &[FixedPoint], b: &[FixedPoint]) -> Result<()> {
    check_len(a.len() + b.len(), dst.len())?;
    let (head, tail) = dst.split_at_mut(a.len());
    head.copy_from_slice(a);
    tail.copy_from_slice(b);
    Ok(())
}

/// Standardize: `dst[i] = (v[i] - mean[i]) * scale[i]`
pub fn scale(
    dst: &mut [FixedPoint],
    v: &[FixedPoint],
    mean: &[FixedPoint],
    scale: &[FixedPoint],
    precision: u8,
) -> Result<()> {
    check_len(v.len(), mean.len())?;
    check_len(v.len(), scale.len())?;
    check_len(v.len(), dst.len())?;

    for (((out, x), m), s) in dst.iter_mut().zip(v).zip(mean).zip(scale) {
        *out = x.saturating_sub(*m).multiply(*s, precision);
    }
    Ok(())
}

/// Apply a unary fixed-point function elementwise
///
/// # Example
/// ```
/// use adleak_fixed::{activation, vector, FixedPoint};
///
/// let v = [0, 512, -512].map(FixedPoint::from_raw);
/// let mut dst = [FixedPoint::ZERO; 3];
/// vector::apply(&mut dst, &v, activation::tanh, 10).unwrap();
/// assert_eq!(dst, [0, 464, -464].map(FixedPoint::from_raw));
/// ```
pub fn apply<F>(dst: &mut [FixedPoint], v: &[FixedPoint], function: F, precision: u8) -> Result<()>
where
    F: Fn(FixedPoint, u8) -> FixedPoint,
{
    check_len(v.len(), dst.len())?;
    for (out, x) in dst.iter_mut().zip(v) {
        *out = function(*x, precision);
    }
    Ok(())
}

/// Shared shape check and loop for binary elementwise operations
#[inline]
fn zip_into<F>(dst: &mut [FixedPoint], a: &[FixedPoint], b: &[FixedPoint], op: F) -> Result<()>
where
    F: Fn(FixedPoint, FixedPoint) -> FixedPoint,
{
    check_len(a.len(), b.len())?;
    check_len(a.len(), dst.len())?;

    for ((out, x), y) in dst.iter_mut().zip(a).zip(b) {
        *out = op(*x, *y);
    }
    Ok(())
}
