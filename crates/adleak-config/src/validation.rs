// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Runs the same consistency checks a policy runs at construction, plus the
//! checks that only make sense for a file, and reports all of them together.

use adleak_policy::ConfigIssue;

use crate::{AdleakConfig, ConfigError, ConfigResult};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// A policy consistency check failed
    Policy(ConfigIssue),
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Policy(issue) => write!(f, "{}", issue),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Collect every validation error without failing fast
pub fn collect_validation_errors(config: &AdleakConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();

    validate_window_shape(config, &mut errors);

    config
        .to_policy_config()
        .for_each_issue(None, None, |issue| errors.push(ConfigValidationError::Policy(issue)));

    errors
}

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every failed check
pub fn validate_config(config: &AdleakConfig) -> ConfigResult<()> {
    let errors = collect_validation_errors(config);
    if errors.is_empty() {
        return Ok(());
    }

    let error_messages = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::ValidationError(format!(
        "Configuration validation failed:\n{}",
        error_messages
    )))
}

fn validate_window_shape(config: &AdleakConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.window.num_features == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "window.num_features".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
}
