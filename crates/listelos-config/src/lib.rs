// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Trial Configuration
//!
//! Type-safe configuration for a single simulated saccade trial with support for:
//! - TOML file parsing
//! - Environment variable overrides
//! - CLI argument overrides
//! - Task presets (sequence recall, gap saccade, microstimulation)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use listelos_config::{load_config, validate_config};
//!
//! let config = load_config(None, None).expect("Failed to load config");
//! validate_config(&config).expect("Invalid trial config");
//!
//! println!("Step: {} s", config.simulation.step);
//! println!("Cues: {:?}", config.cues.locations);
//! ```
//!
//! All time-valued options are in seconds. Locations are 1-based cell indices
//! into a column-major `width x height` field.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod loader;
pub mod presets;
pub mod types;
pub mod validation;

pub use loader::{apply_cli_overrides, apply_environment_overrides, find_config_file, load_config};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError};

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

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
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
    fn test_config_types_compile() {
        let config = TrialConfig::default();
        assert_eq!(config.field.cell_count(), 81);
    }

    #[test]
    fn test_toml_error_maps_to_parse_error() {
        let err = toml::from_str::<TrialConfig>("[simulation\nstep = ").unwrap_err();
        let err: ConfigError = err.into();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }
}
