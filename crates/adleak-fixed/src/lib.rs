// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Adaptive Leakage Fixed-Point Kernel
//!
//! Saturating 16-bit arithmetic for sensing devices without an FPU:
//! - **Scalar**: [`FixedPoint`] with saturating add, sub and multiply
//! - **Vector**: elementwise ops, norms, dot product, gated EMA update
//! - **Matrix**: row-major views and matrix-vector product
//! - **Activation**: shift-and-add `tanh`, `sigmoid` and `relu`
//!
//! Nothing in this crate allocates. Operands are borrowed slices and results
//! are written into caller-provided buffers.
//!
//! ## Target Platforms
//! - ✅ Desktop (Linux, macOS, Windows)
//! - ✅ Embedded (MSP430, ARM Cortex-M)
//! - ✅ WASM

#![no_std]

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(feature = "std")]
extern crate std;

pub mod activation;
pub mod error;
pub mod matrix;
pub mod scalar;
pub mod vector;

pub use error::{FixedPointError, Result};
pub use matrix::Matrix;
pub use scalar::{FixedPoint, MAX_PRECISION};
