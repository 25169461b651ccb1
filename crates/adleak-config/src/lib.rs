// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Adaptive Leakage Configuration
//!
//! Host-side loader for the policy parameters a device build is generated
//! from:
//! - TOML file parsing (`adleak_configuration.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//! - Validation that reports every problem at once
//!
//! ## Usage
//!
//! ```rust,no_run
//! use adleak_config::load_config;
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! let policy_config = config.to_policy_config();
//!
//! println!("Threshold: {}", policy_config.threshold);
//! println!("Target bytes: {}", policy_config.target_bytes);
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod types;
pub mod validation;

pub use loader::{
    apply_cli_overrides, apply_environment_overrides, find_config_file, load_config,
    CONFIG_FILE_NAME, CONFIG_PATH_ENV,
};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

use adleak_policy::PolicyError;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found. Searched: {0}")]
    FileNotFound(String),

    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax: {0}")]
    ParseError(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Policy rejected configuration: {0}")]
    Policy(#[from] PolicyError),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_converts_to_device_parameters() {
        let config = AdleakConfig::default();
        assert_eq!(config.to_policy_config(), adleak_policy::PolicyConfig::default());
    }

    #[test]
    fn test_policy_error_conversion() {
        let error: ConfigError = PolicyError::EmptyWindow.into();
        assert!(matches!(error, ConfigError::Policy(PolicyError::EmptyWindow)));
        assert!(error.to_string().contains("Empty window"));
    }
}
