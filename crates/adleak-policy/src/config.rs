// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Policy configuration
//!
//! [`PolicyConfig`] is immutable once a policy is built from it. Every
//! consistency check lives in [`PolicyConfig::for_each_issue`], which reports
//! all problems without allocating; [`PolicyConfig::validate`] stops at the
//! first one.

use adleak_fixed::{FixedPoint, MAX_PRECISION};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigIssue;

/// Narrowest per-value width group encoding may fall back to
pub const MIN_WIDTH: u8 = 5;

/// Widest per-value width (one `FixedPoint` word)
pub const MAX_WIDTH: u8 = 16;

/// Retention rule applied to each collected sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PolicyKind {
    /// Retain every `min_skip + 1` samples
    Uniform,
    /// Retain when the L1 distance to the last retained sample reaches the threshold
    AdaptiveHeuristic,
    /// Retain when the EMA absolute deviation grows by at least the threshold
    AdaptiveDeviation,
}

impl PolicyKind {
    pub const fn name(&self) -> &'static str {
        match self {
            PolicyKind::Uniform => "uniform",
            PolicyKind::AdaptiveHeuristic => "adaptive_heuristic",
            PolicyKind::AdaptiveDeviation => "adaptive_deviation",
        }
    }

    /// Parse a policy name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        [
            PolicyKind::Uniform,
            PolicyKind::AdaptiveHeuristic,
            PolicyKind::AdaptiveDeviation,
        ]
        .into_iter()
        .find(|kind| kind.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Payload packing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EncodingMode {
    /// Every value at the configured width; oversized windows are rejected
    Standard,
    /// One shared width per window, lowered until the payload fits
    Group,
}

impl EncodingMode {
    pub const fn name(&self) -> &'static str {
        match self {
            EncodingMode::Standard => "standard",
            EncodingMode::Group => "group",
        }
    }

    /// Parse an encoding name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        [EncodingMode::Standard, EncodingMode::Group]
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Immutable policy parameters
///
/// Field names follow the device build parameters (`SEQ_LENGTH`,
/// `TARGET_BYTES`, ...). `threshold` is a fixed-point value at `precision`
/// fractional bits. `alpha` and `beta` are gates in `[0, 1.0]` at
/// `gate_precision` fractional bits, so fractional gates stay representable
/// when values are integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolicyConfig {
    /// Samples per measurement window
    pub seq_length: usize,
    /// Values per feature vector
    pub num_features: usize,
    /// Size of the retention bitmask, `ceil(seq_length / 8)`
    pub bitmask_bytes: usize,
    /// Bits per packed value
    pub width: u8,
    /// Fractional bits of every value
    pub precision: u8,
    /// Upper bound on the encoded message
    pub target_bytes: usize,
    /// Upper bound on the payload region
    pub target_data_bytes: usize,
    pub encoding: EncodingMode,
    /// Zero-pad every message to exactly `target_bytes`
    pub pad_to_target: bool,
    pub policy: PolicyKind,
    /// Retention cap per window
    pub max_collected: usize,
    pub threshold: FixedPoint,
    /// Minimum skipped samples between two retentions
    pub min_skip: usize,
    /// Skipped samples after which retention is forced
    pub max_skip: usize,
    /// Fractional bits of `alpha` and `beta`
    pub gate_precision: u8,
    /// EMA gate for the running mean (deviation policy)
    pub alpha: FixedPoint,
    /// EMA gate for the running deviation (deviation policy)
    pub beta: FixedPoint,
}

impl Default for PolicyConfig {
    /// Parameters of the reference MSP430 deployment
    fn default() -> Self {
        Self {
            seq_length: 23,
            num_features: 10,
            bitmask_bytes: 3,
            width: 16,
            precision: 0,
            target_bytes: 178,
            target_data_bytes: 160,
            encoding: EncodingMode::Group,
            pad_to_target: false,
            policy: PolicyKind::AdaptiveHeuristic,
            max_collected: 22,
            threshold: FixedPoint::from_raw(292),
            min_skip: 1,
            max_skip: 2,
            gate_precision: 8,
            alpha: FixedPoint::from_raw(179),
            beta: FixedPoint::from_raw(179),
        }
    }
}

impl PolicyConfig {
    /// Bitmask size required for `seq_length` samples
    pub const fn required_bitmask_bytes(seq_length: usize) -> usize {
        seq_length.div_ceil(8)
    }

    /// Most samples any window can retain
    ///
    /// Retentions are at least `min_skip + 1` samples apart and the first
    /// sample is always kept.
    pub fn max_retained(&self) -> usize {
        let spacing = self.min_skip.saturating_add(1);
        let reachable = 1 + self.seq_length.saturating_sub(1) / spacing;
        reachable.min(self.max_collected)
    }

    /// Payload width for a window holding `retained` samples
    ///
    /// `None` when no permitted width fits `target_data_bytes`.
    pub fn payload_width(&self, retained: usize) -> Option<u8> {
        let available = self.target_data_bytes.saturating_mul(8);
        let values = retained.saturating_mul(self.num_features);

        if values.saturating_mul(usize::from(self.width)) <= available {
            return Some(self.width);
        }

        match self.encoding {
            EncodingMode::Standard => None,
            EncodingMode::Group => {
                let width = available / values;
                (width >= usize::from(MIN_WIDTH)).then_some(width as u8)
            }
        }
    }

    /// Payload length in bytes for `retained` samples at `width` bits
    pub fn payload_bytes(&self, retained: usize, width: u8) -> usize {
        (retained * self.num_features * usize::from(width)).div_ceil(8)
    }

    /// Check the configuration against the compiled capacities
    ///
    /// # Errors
    /// The first [`ConfigIssue`] found.
    pub fn validate(&self, seq_capacity: usize, feature_capacity: usize) -> Result<(), ConfigIssue> {
        let mut first = None;
        self.for_each_issue(Some(seq_capacity), Some(feature_capacity), |issue| {
            first.get_or_insert(issue);
        });
        match first {
            Some(issue) => Err(issue),
            None => Ok(()),
        }
    }

    /// Report every failed check
    ///
    /// Capacity checks are skipped when the capacity is `None`, which is how
    /// host-side tooling validates a file before a device build fixes them.
    pub fn for_each_issue<F>(
        &self,
        seq_capacity: Option<usize>,
        feature_capacity: Option<usize>,
        mut report: F,
    ) where
        F: FnMut(ConfigIssue),
    {
        let seq_limit = seq_capacity.unwrap_or(usize::MAX);
        if self.seq_length == 0 || self.seq_length > seq_limit {
            report(ConfigIssue::SeqLength {
                value: self.seq_length,
                capacity: seq_limit,
            });
        }

        if let Some(capacity) = feature_capacity {
            if self.num_features != capacity {
                report(ConfigIssue::NumFeatures {
                    value: self.num_features,
                    capacity,
                });
            }
        }

        let required = Self::required_bitmask_bytes(self.seq_length);
        if self.bitmask_bytes != required {
            report(ConfigIssue::BitmaskBytes {
                value: self.bitmask_bytes,
                required,
            });
        }

        if self.width == 0 || self.width > MAX_WIDTH {
            report(ConfigIssue::Width(self.width));
        }

        if self.precision > MAX_PRECISION {
            report(ConfigIssue::Precision(self.precision));
        }

        if self.bitmask_bytes.saturating_add(self.target_data_bytes) > self.target_bytes {
            report(ConfigIssue::TargetBytes {
                bitmask_bytes: self.bitmask_bytes,
                target_data_bytes: self.target_data_bytes,
                target_bytes: self.target_bytes,
            });
        }

        if self.max_collected == 0 || self.max_collected > self.seq_length {
            report(ConfigIssue::MaxCollected {
                value: self.max_collected,
                seq_length: self.seq_length,
            });
        }

        if self.min_skip > self.max_skip {
            report(ConfigIssue::SkipBounds {
                min_skip: self.min_skip,
                max_skip: self.max_skip,
            });
        }

        if self.threshold.is_negative() {
            report(ConfigIssue::NegativeThreshold(self.threshold.raw()));
        }

        let packed_width = match self.encoding {
            EncodingMode::Standard => self.width,
            EncodingMode::Group => {
                if self.width < MIN_WIDTH {
                    report(ConfigIssue::GroupWidth {
                        width: self.width,
                        min_width: MIN_WIDTH,
                    });
                }
                self.width.min(MIN_WIDTH)
            }
        };

        let required_bits = self
            .max_retained()
            .saturating_mul(self.num_features)
            .saturating_mul(usize::from(packed_width));
        let available_bits = self.target_data_bytes.saturating_mul(8);
        if required_bits > available_bits {
            report(ConfigIssue::PayloadUnreachable {
                required_bits,
                available_bits,
            });
        }

        if self.gate_precision > MAX_PRECISION {
            report(ConfigIssue::GatePrecision(self.gate_precision));
        }

        let one = FixedPoint::one(self.gate_precision);
        for gate in [self.alpha, self.beta] {
            if gate.is_negative() || gate > one {
                report(ConfigIssue::Gate {
                    value: gate.raw(),
                    one: one.raw(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_device_build() {
        let config = PolicyConfig::default();
        assert_eq!(config.validate(23, 10), Ok(()));
        assert_eq!(config.max_retained(), 12);
        assert_eq!(config.payload_width(12), Some(10));
        assert_eq!(config.payload_width(8), Some(16));
        assert_eq!(config.payload_bytes(12, 10), 150);
    }

    #[test]
    fn test_capacity_checks() {
        let config = PolicyConfig::default();
        assert_eq!(
            config.validate(16, 10),
            Err(ConfigIssue::SeqLength {
                value: 23,
                capacity: 16
            })
        );
        assert_eq!(
            config.validate(23, 4),
            Err(ConfigIssue::NumFeatures {
                value: 10,
                capacity: 4
            })
        );
    }

    #[test]
    fn test_reports_every_issue() {
        let config = PolicyConfig {
            bitmask_bytes: 2,
            precision: 16,
            min_skip: 3,
            max_skip: 1,
            threshold: FixedPoint::from_raw(-1),
            ..PolicyConfig::default()
        };

        let mut issues = [None; 8];
        let mut count = 0;
        config.for_each_issue(None, None, |issue| {
            issues[count] = Some(issue);
            count += 1;
        });

        assert_eq!(count, 4);
        assert_eq!(
            issues[0],
            Some(ConfigIssue::BitmaskBytes {
                value: 2,
                required: 3
            })
        );
        assert_eq!(issues[1], Some(ConfigIssue::Precision(16)));
        assert_eq!(
            issues[2],
            Some(ConfigIssue::SkipBounds {
                min_skip: 3,
                max_skip: 1
            })
        );
        assert_eq!(issues[3], Some(ConfigIssue::NegativeThreshold(-1)));
    }

    #[test]
    fn test_standard_mode_needs_full_width_budget() {
        let config = PolicyConfig {
            encoding: EncodingMode::Standard,
            ..PolicyConfig::default()
        };
        assert_eq!(
            config.validate(23, 10),
            Err(ConfigIssue::PayloadUnreachable {
                required_bits: 1920,
                available_bits: 1280
            })
        );
        assert_eq!(config.payload_width(12), None);
    }

    #[test]
    fn test_group_width_floor() {
        let config = PolicyConfig {
            width: 4,
            ..PolicyConfig::default()
        };
        assert_eq!(
            config.validate(23, 10),
            Err(ConfigIssue::GroupWidth {
                width: 4,
                min_width: MIN_WIDTH
            })
        );
    }

    #[test]
    fn test_target_bytes_must_cover_regions() {
        let config = PolicyConfig {
            target_bytes: 162,
            ..PolicyConfig::default()
        };
        assert!(matches!(
            config.validate(23, 10),
            Err(ConfigIssue::TargetBytes { .. })
        ));
    }

    #[test]
    fn test_gate_range() {
        let config = PolicyConfig {
            alpha: FixedPoint::from_raw(257),
            ..PolicyConfig::default()
        };
        assert_eq!(
            config.validate(23, 10),
            Err(ConfigIssue::Gate { value: 257, one: 256 })
        );

        let coarse = PolicyConfig {
            gate_precision: 2,
            beta: FixedPoint::from_raw(5),
            ..PolicyConfig::default()
        };
        let mut issues = [None; 4];
        let mut count = 0;
        coarse.for_each_issue(None, None, |issue| {
            issues[count] = Some(issue);
            count += 1;
        });
        assert_eq!(
            &issues[..count],
            &[
                Some(ConfigIssue::Gate { value: 179, one: 4 }),
                Some(ConfigIssue::Gate { value: 5, one: 4 }),
            ]
        );
    }

    #[test]
    fn test_gates_are_fractional_at_integer_precision() {
        let config = PolicyConfig::default();
        assert_eq!(config.precision, 0);
        let one = FixedPoint::one(config.gate_precision);
        assert!(config.alpha > FixedPoint::ZERO && config.alpha < one);
        assert!(config.beta > FixedPoint::ZERO && config.beta < one);

        let too_fine = PolicyConfig {
            gate_precision: 16,
            ..PolicyConfig::default()
        };
        assert_eq!(too_fine.validate(23, 10), Err(ConfigIssue::GatePrecision(16)));
    }

    #[test]
    fn test_max_retained_respects_spacing_and_cap() {
        let spaced = PolicyConfig {
            min_skip: 0,
            max_collected: 22,
            ..PolicyConfig::default()
        };
        assert_eq!(spaced.max_retained(), 22);

        let sparse = PolicyConfig {
            min_skip: 2,
            max_skip: 2,
            ..PolicyConfig::default()
        };
        assert_eq!(sparse.max_retained(), 8);
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in [
            PolicyKind::Uniform,
            PolicyKind::AdaptiveHeuristic,
            PolicyKind::AdaptiveDeviation,
        ] {
            assert_eq!(PolicyKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(PolicyKind::from_name(" Adaptive_Heuristic "), Some(PolicyKind::AdaptiveHeuristic));
        assert_eq!(EncodingMode::from_name("GROUP"), Some(EncodingMode::Group));
        assert_eq!(EncodingMode::from_name("huffman"), None);
    }
}
