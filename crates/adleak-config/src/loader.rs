// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use adleak_fixed::FixedPoint;
use adleak_policy::{EncodingMode, PolicyKind};
use tracing::{debug, info, warn};

use crate::validation::validate_config;
use crate::{AdleakConfig, ConfigError, ConfigResult};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "adleak_configuration.toml";

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "ADLEAK_CONFIG_PATH";

/// Find the configuration file
///
/// Search order:
/// 1. `ADLEAK_CONFIG_PATH` environment variable
/// 2. Current working directory: `./adleak_configuration.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by {} not found: {}",
            CONFIG_PATH_ENV,
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.extend(
            cwd.ancestors()
                .take(6)
                .map(|dir| dir.join(CONFIG_FILE_NAME)),
        );
    }

    if let Some(path) = search_paths.iter().find(|path| path.exists()) {
        return Ok(path.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Configuration file '{}' not found in any of these locations:\n{}\n\nSet {} environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list, CONFIG_PATH_ENV
    )))
}

/// Load, override and validate the configuration
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or fails validation
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AdleakConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AdleakConfig = toml::from_str(&content)?;
    info!("Loaded adaptive leak configuration from {}", config_file.display());

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    validate_config(&config)?;
    Ok(config)
}

/// Parse an override value, logging and ignoring values that do not parse
fn parse_override<T: FromStr>(source: &str, value: &str) -> Option<T> {
    match value.trim().parse::<T>() {
        Ok(parsed) => {
            debug!("Applying override {} = {}", source, value);
            Some(parsed)
        }
        Err(_) => {
            warn!("Ignoring override {} = {:?}: not a valid value", source, value);
            None
        }
    }
}

fn parse_named<T>(source: &str, value: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    let parsed = parse(value);
    match parsed {
        Some(_) => debug!("Applying override {} = {}", source, value),
        None => warn!("Ignoring override {} = {:?}: unknown name", source, value),
    }
    parsed
}

fn parse_flag(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `ADLEAK_THRESHOLD` -> `policy.threshold` (raw fixed-point word)
/// - `ADLEAK_MIN_SKIP` -> `policy.min_skip`
/// - `ADLEAK_MAX_SKIP` -> `policy.max_skip`
/// - `ADLEAK_MAX_COLLECTED` -> `policy.max_collected`
/// - `ADLEAK_POLICY` -> `policy.kind`
/// - `ADLEAK_TARGET_BYTES` -> `encoding.target_bytes`
/// - `ADLEAK_TARGET_DATA_BYTES` -> `encoding.target_data_bytes`
/// - `ADLEAK_ENCODING` -> `encoding.mode`
pub fn apply_environment_overrides(config: &mut AdleakConfig) {
    let var = |key: &str| env::var(key).ok().map(|value| (key.to_string(), value));

    if let Some((key, value)) = var("ADLEAK_THRESHOLD") {
        if let Some(raw) = parse_override::<i16>(&key, &value) {
            config.policy.threshold = FixedPoint::from_raw(raw);
        }
    }
    if let Some((key, value)) = var("ADLEAK_MIN_SKIP") {
        if let Some(skip) = parse_override(&key, &value) {
            config.policy.min_skip = skip;
        }
    }
    if let Some((key, value)) = var("ADLEAK_MAX_SKIP") {
        if let Some(skip) = parse_override(&key, &value) {
            config.policy.max_skip = skip;
        }
    }
    if let Some((key, value)) = var("ADLEAK_MAX_COLLECTED") {
        if let Some(count) = parse_override(&key, &value) {
            config.policy.max_collected = count;
        }
    }
    if let Some((key, value)) = var("ADLEAK_POLICY") {
        if let Some(kind) = parse_named(&key, &value, PolicyKind::from_name) {
            config.policy.kind = kind;
        }
    }

    if let Some((key, value)) = var("ADLEAK_TARGET_BYTES") {
        if let Some(bytes) = parse_override(&key, &value) {
            config.encoding.target_bytes = bytes;
        }
    }
    if let Some((key, value)) = var("ADLEAK_TARGET_DATA_BYTES") {
        if let Some(bytes) = parse_override(&key, &value) {
            config.encoding.target_data_bytes = bytes;
        }
    }
    if let Some((key, value)) = var("ADLEAK_ENCODING") {
        if let Some(mode) = parse_named(&key, &value, EncodingMode::from_name) {
            config.encoding.mode = mode;
        }
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - HashMap of CLI arguments (e.g., `{"threshold": "150", "policy": "uniform"}`)
pub fn apply_cli_overrides(config: &mut AdleakConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("threshold") {
        if let Some(raw) = parse_override::<i16>("threshold", value) {
            config.policy.threshold = FixedPoint::from_raw(raw);
        }
    }
    if let Some(value) = cli_args.get("min_skip") {
        if let Some(skip) = parse_override("min_skip", value) {
            config.policy.min_skip = skip;
        }
    }
    if let Some(value) = cli_args.get("max_skip") {
        if let Some(skip) = parse_override("max_skip", value) {
            config.policy.max_skip = skip;
        }
    }
    if let Some(value) = cli_args.get("max_collected") {
        if let Some(count) = parse_override("max_collected", value) {
            config.policy.max_collected = count;
        }
    }
    if let Some(value) = cli_args.get("policy") {
        if let Some(kind) = parse_named("policy", value, PolicyKind::from_name) {
            config.policy.kind = kind;
        }
    }
    if let Some(value) = cli_args.get("encoding") {
        if let Some(mode) = parse_named("encoding", value, EncodingMode::from_name) {
            config.encoding.mode = mode;
        }
    }
    if let Some(value) = cli_args.get("pad_to_target") {
        debug!("Applying override pad_to_target = {}", value);
        config.encoding.pad_to_target = parse_flag(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const OVERRIDE_VARS: [&str; 8] = [
        "ADLEAK_THRESHOLD",
        "ADLEAK_MIN_SKIP",
        "ADLEAK_MAX_SKIP",
        "ADLEAK_MAX_COLLECTED",
        "ADLEAK_POLICY",
        "ADLEAK_TARGET_BYTES",
        "ADLEAK_TARGET_DATA_BYTES",
        "ADLEAK_ENCODING",
    ];

    fn clear_override_vars() {
        for key in OVERRIDE_VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_config.toml");
        File::create(&config_path).unwrap();

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("missing.toml");

        env::set_var(CONFIG_PATH_ENV, config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var(CONFIG_PATH_ENV);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[policy]").unwrap();
        writeln!(file, "threshold = 150").unwrap();
        writeln!(file, "kind = \"adaptive_deviation\"").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.policy.threshold.raw(), 150);
        assert_eq!(config.policy.kind, PolicyKind::AdaptiveDeviation);
        assert_eq!(config.encoding.target_bytes, 178);
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[policy\nthreshold = ").unwrap();

        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_load_rejects_inconsistent_values() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[policy]\nmin_skip = 5\nmax_skip = 1\n").unwrap();

        assert!(matches!(
            load_config(Some(&config_path), None),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = AdleakConfig::default();

        env::set_var("ADLEAK_THRESHOLD", "400");
        env::set_var("ADLEAK_MAX_SKIP", "3");
        env::set_var("ADLEAK_POLICY", "uniform");
        env::set_var("ADLEAK_ENCODING", "standard");
        env::set_var("ADLEAK_TARGET_DATA_BYTES", "not-a-number");

        apply_environment_overrides(&mut config);
        clear_override_vars();

        assert_eq!(config.policy.threshold.raw(), 400);
        assert_eq!(config.policy.max_skip, 3);
        assert_eq!(config.policy.kind, PolicyKind::Uniform);
        assert_eq!(config.encoding.mode, EncodingMode::Standard);
        assert_eq!(config.encoding.target_data_bytes, 160);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AdleakConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("min_skip".to_string(), "0".to_string());
        cli_args.insert("max_collected".to_string(), "12".to_string());
        cli_args.insert("pad_to_target".to_string(), "yes".to_string());
        cli_args.insert("policy".to_string(), "bogus".to_string());

        apply_cli_overrides(&mut config, &cli_args);

        assert_eq!(config.policy.min_skip, 0);
        assert_eq!(config.policy.max_collected, 12);
        assert!(config.encoding.pad_to_target);
        assert_eq!(config.policy.kind, PolicyKind::AdaptiveHeuristic);
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        clear_override_vars();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[policy]").unwrap();
        writeln!(file, "threshold = 100").unwrap();
        writeln!(file, "max_collected = 20").unwrap();

        env::set_var("ADLEAK_THRESHOLD", "200");
        env::set_var("ADLEAK_MAX_COLLECTED", "18");

        let mut cli_args = HashMap::new();
        cli_args.insert("threshold".to_string(), "300".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args));
        clear_override_vars();
        let config = config.unwrap();

        // CLI wins for threshold, env wins for max_collected (no CLI override)
        assert_eq!(config.policy.threshold.raw(), 300);
        assert_eq!(config.policy.max_collected, 18);
    }
}
