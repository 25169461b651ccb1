// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Adaptive Leakage Sampling Policy
//!
//! Decides which feature vectors of a measurement window to transmit and
//! packs them into a fixed byte budget:
//! - **Policy**: uniform, distance-triggered and deviation-triggered retention
//! - **Window**: per-window retained samples and skip counters
//! - **Codec**: bitmask + bit-packed payload, with group width reduction
//!
//! Capacities are const generics, so a policy lives entirely on the stack or
//! in a `static` and never allocates.
//!
//! ## Quick Start
//!
//! ```
//! use adleak_fixed::FixedPoint;
//! use adleak_policy::{decode, AdaptiveLeakPolicy, PolicyConfig};
//!
//! let config = PolicyConfig::default();
//! let mut policy: AdaptiveLeakPolicy<23, 10> = AdaptiveLeakPolicy::new(config).unwrap();
//!
//! for t in 0..23i16 {
//!     let sample = [FixedPoint::from_raw((t % 5) * 100); 10];
//!     policy.collect(&sample).unwrap();
//! }
//!
//! let mut message = [0u8; 178];
//! let written = policy.encode(&mut message).unwrap();
//! let window = decode::<23, 10>(&config, &message[..written]).unwrap();
//! assert_eq!(window.indices()[0], 0);
//! ```

#![no_std]

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod codec;
pub mod config;
pub mod error;
pub mod policy;
pub mod window;

pub use codec::{decode, DecodedWindow};
pub use config::{EncodingMode, PolicyConfig, PolicyKind, MAX_WIDTH, MIN_WIDTH};
pub use error::{ConfigIssue, PolicyError, Result};
pub use policy::{AdaptiveLeakPolicy, PolicyStats};
pub use window::{CollectedWindow, Decision, WindowState};
