// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # adleak - Adaptive Leakage Sampling
//!
//! Low-power sensors collect a window of feature vectors, keep only the
//! samples worth sending, and pack them into a message whose size is bounded
//! by a byte budget. This crate bundles the pieces:
//!
//! - **`fixed`**: saturating 16-bit fixed-point kernel (scalar, vector, matrix)
//! - **`policy`**: uniform, heuristic and deviation retention policies plus the wire codec
//! - **`config`** (`std`): TOML configuration with environment and CLI overrides
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! adleak = "0.1"  # Default: std + configuration loader
//! ```
//!
//! For a microcontroller build:
//!
//! ```toml
//! [dependencies]
//! adleak = { version = "0.1", default-features = false, features = ["platform-no-std"] }
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use adleak::prelude::*;
//!
//! let config = PolicyConfig::default();
//! let mut policy: AdaptiveLeakPolicy<23, 10> = AdaptiveLeakPolicy::new(config)?;
//!
//! for t in 0..23i16 {
//!     policy.collect(&[FixedPoint::from_raw(t * 40); 10])?;
//! }
//!
//! let mut message = [0u8; 178];
//! let written = policy.encode(&mut message)?;
//! let window = decode::<23, 10>(&config, &message[..written])?;
//! assert!(!window.is_empty());
//! # Ok::<(), adleak::policy::PolicyError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Kernel: adleak-fixed                                   │
//! │  (FixedPoint, vector ops, matrix-vector product)        │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Sampling: adleak-policy                                │
//! │  (retention rule, window state, bitmask codec)          │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Host tooling: adleak-config                            │
//! │  (TOML file, env/CLI overrides, validation)             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

#![cfg_attr(not(feature = "std"), no_std)]

// Re-export kernel
pub use adleak_fixed as fixed;

// Re-export sampling
pub use adleak_policy as policy;

// Re-export host tooling
#[cfg(feature = "std")]
pub use adleak_config as config;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::fixed::{FixedPoint, FixedPointError, Matrix};
    pub use crate::policy::{
        decode, AdaptiveLeakPolicy, DecodedWindow, Decision, EncodingMode, PolicyConfig,
        PolicyError, PolicyKind, WindowState,
    };

    #[cfg(feature = "std")]
    pub use crate::config::{load_config, AdleakConfig, ConfigError};
}
