// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for kernel operations
//!
//! Numeric overflow is never an error here: it is absorbed by saturation.
//! The only failure a kernel call can report is a shape mismatch, and every
//! operation checks shapes before writing its output.

use core::fmt;

/// Kernel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedPointError {
    /// Operand length or matrix dimension mismatch
    ShapeMismatch {
        /// Length the operation required
        expected: usize,
        /// Length it was given
        actual: usize,
    },
}

impl fmt::Display for FixedPointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixedPointError::ShapeMismatch { expected, actual } => {
                write!(f, "Shape mismatch: expected {}, got {}", expected, actual)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FixedPointError {}

/// Result type for kernel operations
pub type Result<T> = core::result::Result<T, FixedPointError>;

/// Fail with [`FixedPointError::ShapeMismatch`] unless the lengths agree.
#[inline]
pub(crate) fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(FixedPointError::ShapeMismatch { expected, actual })
    }
}
