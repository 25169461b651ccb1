// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! These structs map to sections in `adleak_configuration.toml`. Every field
//! has a default, so a file only needs the values it changes.

use adleak_fixed::FixedPoint;
use adleak_policy::{AdaptiveLeakPolicy, EncodingMode, PolicyConfig, PolicyKind};
use serde::{Deserialize, Serialize};

use crate::ConfigResult;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdleakConfig {
    pub window: WindowConfig,
    pub encoding: EncodingConfig,
    pub policy: PolicySettings,
}

/// Measurement window shape
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub seq_length: usize,
    pub num_features: usize,
    /// Derived from `seq_length` when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitmask_bytes: Option<usize>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        let device = PolicyConfig::default();
        Self {
            seq_length: device.seq_length,
            num_features: device.num_features,
            bitmask_bytes: None,
        }
    }
}

/// Wire format and byte budget
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EncodingConfig {
    pub mode: EncodingMode,
    pub width: u8,
    pub precision: u8,
    pub target_bytes: usize,
    pub target_data_bytes: usize,
    pub pad_to_target: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        let device = PolicyConfig::default();
        Self {
            mode: device.encoding,
            width: device.width,
            precision: device.precision,
            target_bytes: device.target_bytes,
            target_data_bytes: device.target_data_bytes,
            pad_to_target: device.pad_to_target,
        }
    }
}

/// Retention rule parameters
///
/// `threshold` is a raw fixed-point word at `encoding.precision`. `alpha`
/// and `beta` are raw words at `gate_precision`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicySettings {
    pub kind: PolicyKind,
    pub max_collected: usize,
    pub threshold: FixedPoint,
    pub min_skip: usize,
    pub max_skip: usize,
    pub gate_precision: u8,
    pub alpha: FixedPoint,
    pub beta: FixedPoint,
}

impl Default for PolicySettings {
    fn default() -> Self {
        let device = PolicyConfig::default();
        Self {
            kind: device.policy,
            max_collected: device.max_collected,
            threshold: device.threshold,
            min_skip: device.min_skip,
            max_skip: device.max_skip,
            gate_precision: device.gate_precision,
            alpha: device.alpha,
            beta: device.beta,
        }
    }
}

impl AdleakConfig {
    /// Bitmask size, explicit or derived from the sequence length
    pub fn bitmask_bytes(&self) -> usize {
        self.window
            .bitmask_bytes
            .unwrap_or_else(|| PolicyConfig::required_bitmask_bytes(self.window.seq_length))
    }

    /// Flatten into the parameters a policy is built from
    pub fn to_policy_config(&self) -> PolicyConfig {
        PolicyConfig {
            seq_length: self.window.seq_length,
            num_features: self.window.num_features,
            bitmask_bytes: self.bitmask_bytes(),
            width: self.encoding.width,
            precision: self.encoding.precision,
            target_bytes: self.encoding.target_bytes,
            target_data_bytes: self.encoding.target_data_bytes,
            encoding: self.encoding.mode,
            pad_to_target: self.encoding.pad_to_target,
            policy: self.policy.kind,
            max_collected: self.policy.max_collected,
            threshold: self.policy.threshold,
            min_skip: self.policy.min_skip,
            max_skip: self.policy.max_skip,
            gate_precision: self.policy.gate_precision,
            alpha: self.policy.alpha,
            beta: self.policy.beta,
        }
    }

    /// Build a policy for a device with the given compiled capacities
    ///
    /// # Errors
    /// `ConfigError::Policy` when the file does not fit `SEQ`/`FEATURES` or
    /// fails a policy check.
    pub fn build_policy<const SEQ: usize, const FEATURES: usize>(
        &self,
    ) -> ConfigResult<AdaptiveLeakPolicy<SEQ, FEATURES>> {
        Ok(AdaptiveLeakPolicy::new(self.to_policy_config())?)
    }
}

impl From<&PolicyConfig> for AdleakConfig {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            window: WindowConfig {
                seq_length: config.seq_length,
                num_features: config.num_features,
                bitmask_bytes: Some(config.bitmask_bytes),
            },
            encoding: EncodingConfig {
                mode: config.encoding,
                width: config.width,
                precision: config.precision,
                target_bytes: config.target_bytes,
                target_data_bytes: config.target_data_bytes,
                pad_to_target: config.pad_to_target,
            },
            policy: PolicySettings {
                kind: config.policy,
                max_collected: config.max_collected,
                threshold: config.threshold,
                min_skip: config.min_skip,
                max_skip: config.max_skip,
                gate_precision: config.gate_precision,
                alpha: config.alpha,
                beta: config.beta,
            },
        }
    }
}
