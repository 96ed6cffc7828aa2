// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base values, missing keys take defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, TrialConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "listelos_trial.toml";

/// Find the trial configuration file
///
/// Search order:
/// 1. `LISTELOS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./listelos_trial.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("LISTELOS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by LISTELOS_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd;
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent.to_path_buf();
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "Trial configuration file '{}' not found in any of these locations:\n{}\n\nSet LISTELOS_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found or contains invalid TOML.
/// Validation is a separate step (`validate_config`).
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<TrialConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: TrialConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

fn parse_flag(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `LISTELOS_STEP` -> `simulation.step`
/// - `LISTELOS_DURATION` -> `simulation.duration`
/// - `LISTELOS_SEED` -> `simulation.seed`
/// - `LISTELOS_VERBOSE` -> `simulation.verbose`
/// - `LISTELOS_RANK_COUNT` -> `field.rank_count`
/// - `LISTELOS_FIXATION` -> `field.fixation`
/// - `LISTELOS_WORKING_MEMORY` -> `network.working_memory`
/// - `LISTELOS_INPUT_DELAY` -> `network.input_delay`
/// - `LISTELOS_STIM_STRENGTH` -> `stimulation.strength`
///
/// Unparseable values are ignored with a warning.
pub fn apply_environment_overrides(config: &mut TrialConfig) {
    fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
        let value = env::var(key).ok()?;
        match value.parse::<T>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!("Ignoring unparseable {}={:?}", key, value);
                None
            }
        }
    }

    if let Some(step) = parsed::<f64>("LISTELOS_STEP") {
        config.simulation.step = step;
    }
    if let Some(duration) = parsed::<f64>("LISTELOS_DURATION") {
        config.simulation.duration = duration;
    }
    if let Some(seed) = parsed::<u64>("LISTELOS_SEED") {
        config.simulation.seed = seed;
    }
    if let Ok(value) = env::var("LISTELOS_VERBOSE") {
        config.simulation.verbose = parse_flag(&value);
    }

    if let Some(ranks) = parsed::<usize>("LISTELOS_RANK_COUNT") {
        config.field.rank_count = ranks;
    }
    if let Some(fixation) = parsed::<usize>("LISTELOS_FIXATION") {
        config.field.fixation = fixation;
    }

    if let Ok(value) = env::var("LISTELOS_WORKING_MEMORY") {
        config.network.working_memory = parse_flag(&value);
    }
    if let Ok(value) = env::var("LISTELOS_INPUT_DELAY") {
        config.network.input_delay = parse_flag(&value);
    }

    if let Some(strength) = parsed::<f64>("LISTELOS_STIM_STRENGTH") {
        config.stimulation.strength = strength;
    }
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of CLI arguments (e.g., `{"seed": "7", "duration": "1.5"}`)
///
/// # Errors
///
/// Unlike environment overrides, an unknown key or unparseable value is an
/// explicit user mistake and returns `ConfigError::InvalidValue`.
pub fn apply_cli_overrides(
    config: &mut TrialConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    fn parse<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
        value
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(format!("{} = {:?}", key, value)))
    }

    for (key, value) in cli_args {
        match key.as_str() {
            "step" => config.simulation.step = parse(key, value)?,
            "duration" => config.simulation.duration = parse(key, value)?,
            "seed" => config.simulation.seed = parse(key, value)?,
            "verbose" => config.simulation.verbose = parse_flag(value),
            "width" => config.field.width = parse(key, value)?,
            "height" => config.field.height = parse(key, value)?,
            "fixation" => config.field.fixation = parse(key, value)?,
            "rank_count" => config.field.rank_count = parse(key, value)?,
            "working_memory" => config.network.working_memory = parse_flag(value),
            "input_delay" => config.network.input_delay = parse_flag(value),
            "stim_location" => config.stimulation.location = parse(key, value)?,
            "stim_onset" => config.stimulation.onset = parse(key, value)?,
            "stim_offset" => config.stimulation.offset = parse(key, value)?,
            "stim_spread" => config.stimulation.spread = parse(key, value)?,
            "stim_strength" => config.stimulation.strength = parse(key, value)?,
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "unknown override key '{}'",
                    other
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom_trial.toml");
        File::create(&config_path).unwrap();

        env::set_var("LISTELOS_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        env::remove_var("LISTELOS_CONFIG_PATH");

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_find_config_file_env_var_missing() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        env::set_var("LISTELOS_CONFIG_PATH", "/nonexistent/listelos_trial.toml");
        let result = find_config_file();
        env::remove_var("LISTELOS_CONFIG_PATH");

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[field]").unwrap();
        writeln!(file, "rank_count = 6").unwrap();
        writeln!(file, "[cues]").unwrap();
        writeln!(file, "locations = [41, 14]").unwrap();
        writeln!(file, "onsets = [0.0, 0.5]").unwrap();
        writeln!(file, "offsets = [0.5, 1.0]").unwrap();

        let config = load_config(Some(&config_path), None).unwrap();

        assert_eq!(config.field.rank_count, 6);
        assert_eq!(config.field.width, 9);
        assert_eq!(config.cues.locations, vec![41, 14]);
    }

    #[test]
    fn test_load_invalid_toml() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "[simulation\nstep = 0.001").unwrap();

        let result = load_config(Some(&config_path), None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let mut config = TrialConfig::default();

        env::set_var("LISTELOS_SEED", "42");
        env::set_var("LISTELOS_WORKING_MEMORY", "false");
        env::set_var("LISTELOS_DURATION", "not-a-number");

        apply_environment_overrides(&mut config);

        env::remove_var("LISTELOS_SEED");
        env::remove_var("LISTELOS_WORKING_MEMORY");
        env::remove_var("LISTELOS_DURATION");

        assert_eq!(config.simulation.seed, 42);
        assert!(!config.network.working_memory);
        assert_eq!(config.simulation.duration, 2.0);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = TrialConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("stim_strength".to_string(), "0.75".to_string());
        cli_args.insert("input_delay".to_string(), "0".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.stimulation.strength, 0.75);
        assert!(!config.network.input_delay);
    }

    #[test]
    fn test_cli_override_rejects_unknown_key() {
        let mut config = TrialConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("warp_factor".to_string(), "9".to_string());

        let result = apply_cli_overrides(&mut config, &cli_args);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[simulation]").unwrap();
        writeln!(file, "seed = 3").unwrap();
        writeln!(file, "duration = 1.0").unwrap();

        env::set_var("LISTELOS_SEED", "5");
        env::set_var("LISTELOS_DURATION", "1.25");

        let mut cli_args = HashMap::new();
        cli_args.insert("seed".to_string(), "9".to_string());

        let config = load_config(Some(&config_path), Some(&cli_args)).unwrap();

        env::remove_var("LISTELOS_SEED");
        env::remove_var("LISTELOS_DURATION");

        // CLI wins for seed, env wins for duration (no CLI override)
        assert_eq!(config.simulation.seed, 9);
        assert_eq!(config.simulation.duration, 1.25);
    }
}
