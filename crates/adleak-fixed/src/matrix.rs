// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Row-major matrix view and matrix-vector product

use crate::error::{check_len, FixedPointError, Result};
use crate::scalar::FixedPoint;
use crate::vector;

/// Borrowed row-major matrix
///
/// Element `(r, c)` lives at `data[r * cols + c]`. The view does not own its
/// storage, so weights can sit in a `static` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matrix<'a> {
    data: &'a [FixedPoint],
    rows: usize,
    cols: usize,
}

impl<'a> Matrix<'a> {
    /// Wrap `data` as a `rows x cols` matrix
    ///
    /// # Errors
    /// [`FixedPointError::ShapeMismatch`] if `data.len() != rows * cols`.
    pub fn new(data: &'a [FixedPoint], rows: usize, cols: usize) -> Result<Self> {
        let expected = rows
            .checked_mul(cols)
            .ok_or(FixedPointError::ShapeMismatch {
                expected: usize::MAX,
                actual: data.len(),
            })?;
        check_len(expected, data.len())?;
        Ok(Self { data, rows, cols })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Underlying row-major storage
    #[inline]
    pub fn as_slice(&self) -> &'a [FixedPoint] {
        self.data
    }

    /// Row `r`, or `None` when out of range
    pub fn row(&self, r: usize) -> Option<&'a [FixedPoint]> {
        if r >= self.rows {
            return None;
        }
        let start = r * self.cols;
        self.data.get(start..start + self.cols)
    }

    /// Iterate rows in order; yields `rows` empty slices when `cols == 0`
    pub fn iter_rows(&self) -> impl Iterator<Item = &'a [FixedPoint]> + '_ {
        (0..self.rows).filter_map(move |r| self.row(r))
    }
}

/// `dst = mat * v`
///
/// Each output element is the saturating dot product of a matrix row with
/// `v`, accumulated left to right.
///
/// # Example
/// ```
/// use adleak_fixed::{matrix, FixedPoint};
///
/// let data = [1024, 0, 0, 2048].map(FixedPoint::from_raw);
/// let mat = matrix::Matrix::new(&data, 2, 2).unwrap();
/// let v = [100, -50].map(FixedPoint::from_raw);
/// let mut dst = [FixedPoint::ZERO; 2];
///
/// matrix::matrix_vector_prod(&mut dst, &mat, &v, 10).unwrap();
/// assert_eq!(dst, [100, -100].map(FixedPoint::from_raw));
/// ```
pub fn matrix_vector_prod(
    dst: &mut [FixedPoint],
    mat: &Matrix<'_>,
    v: &[FixedPoint],
    precision: u8,
) -> Result<()> {
    check_len(mat.cols(), v.len())?;
    check_len(mat.rows(), dst.len())?;

    for (out, row) in dst.iter_mut().zip(mat.iter_rows()) {
        *out = vector::dot_prod(row, v, precision)?;
    }
    Ok(())
}
