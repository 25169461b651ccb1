// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for policy operations

use core::fmt;

use adleak_fixed::FixedPointError;

/// A single configuration check that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    /// `seq_length` is zero or above the compiled sequence capacity
    SeqLength { value: usize, capacity: usize },

    /// `num_features` differs from the compiled feature capacity
    NumFeatures { value: usize, capacity: usize },

    /// `bitmask_bytes` is not `ceil(seq_length / 8)`
    BitmaskBytes { value: usize, required: usize },

    /// Value width outside `1..=16`
    Width(u8),

    /// Precision above 15
    Precision(u8),

    /// `bitmask_bytes + target_data_bytes` exceeds `target_bytes`
    TargetBytes {
        bitmask_bytes: usize,
        target_data_bytes: usize,
        target_bytes: usize,
    },

    /// `max_collected` is zero or above `seq_length`
    MaxCollected { value: usize, seq_length: usize },

    /// `min_skip` greater than `max_skip`
    SkipBounds { min_skip: usize, max_skip: usize },

    /// Retention threshold below zero
    NegativeThreshold(i16),

    /// The largest reachable window cannot be packed into the payload budget
    PayloadUnreachable {
        required_bits: usize,
        available_bits: usize,
    },

    /// Group encoding needs a default width of at least the minimum width
    GroupWidth { width: u8, min_width: u8 },

    /// Gate precision above 15
    GatePrecision(u8),

    /// EMA gate outside `[0, 1.0]` at the gate precision
    Gate { value: i16, one: i16 },
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::SeqLength { value, capacity } => {
                write!(f, "seq_length {} must be in 1..={}", value, capacity)
            }
            ConfigIssue::NumFeatures { value, capacity } => {
                write!(f, "num_features {} must equal {}", value, capacity)
            }
            ConfigIssue::BitmaskBytes { value, required } => {
                write!(f, "bitmask_bytes {} must be {}", value, required)
            }
            ConfigIssue::Width(width) => write!(f, "width {} must be in 1..=16", width),
            ConfigIssue::Precision(precision) => {
                write!(f, "precision {} must be at most 15", precision)
            }
            ConfigIssue::TargetBytes {
                bitmask_bytes,
                target_data_bytes,
                target_bytes,
            } => write!(
                f,
                "bitmask_bytes {} + target_data_bytes {} exceeds target_bytes {}",
                bitmask_bytes, target_data_bytes, target_bytes
            ),
            ConfigIssue::MaxCollected { value, seq_length } => {
                write!(f, "max_collected {} must be in 1..={}", value, seq_length)
            }
            ConfigIssue::SkipBounds { min_skip, max_skip } => {
                write!(f, "min_skip {} exceeds max_skip {}", min_skip, max_skip)
            }
            ConfigIssue::NegativeThreshold(threshold) => {
                write!(f, "threshold {} must not be negative", threshold)
            }
            ConfigIssue::PayloadUnreachable {
                required_bits,
                available_bits,
            } => write!(
                f,
                "largest window needs {} payload bits, budget is {}",
                required_bits, available_bits
            ),
            ConfigIssue::GroupWidth { width, min_width } => write!(
                f,
                "group encoding needs width >= {}, got {}",
                min_width, width
            ),
            ConfigIssue::GatePrecision(precision) => {
                write!(f, "gate_precision {} must be at most 15", precision)
            }
            ConfigIssue::Gate { value, one } => {
                write!(f, "gate {} must be in 0..={}", value, one)
            }
        }
    }
}

/// Policy errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyError {
    /// Feature vector length differs from the configured feature count
    ShapeMismatch { expected: usize, actual: usize },

    /// Encoded window does not fit the payload budget or the output buffer
    BudgetExceeded { required: usize, available: usize },

    /// Configuration rejected at construction or decode time
    InvalidConfiguration(ConfigIssue),

    /// All `seq_length` samples of the window were already collected
    WindowComplete { seq_length: usize },

    /// Encode called before any sample was collected
    EmptyWindow,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyError::ShapeMismatch { expected, actual } => {
                write!(f, "Shape mismatch: expected {}, got {}", expected, actual)
            }
            PolicyError::BudgetExceeded {
                required,
                available,
            } => write!(
                f,
                "Budget exceeded: required {} bytes, available {}",
                required, available
            ),
            PolicyError::InvalidConfiguration(issue) => {
                write!(f, "Invalid configuration: {}", issue)
            }
            PolicyError::WindowComplete { seq_length } => {
                write!(f, "Window complete: all {} samples collected", seq_length)
            }
            PolicyError::EmptyWindow => write!(f, "Empty window: no samples collected"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PolicyError {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigIssue {}

impl From<FixedPointError> for PolicyError {
    fn from(error: FixedPointError) -> Self {
        match error {
            FixedPointError::ShapeMismatch { expected, actual } => {
                PolicyError::ShapeMismatch { expected, actual }
            }
        }
    }
}

impl From<ConfigIssue> for PolicyError {
    fn from(issue: ConfigIssue) -> Self {
        PolicyError::InvalidConfiguration(issue)
    }
}

/// Result type for policy operations
pub type Result<T> = core::result::Result<T, PolicyError>;
