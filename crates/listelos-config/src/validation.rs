// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Rejects malformed or inconsistent trial configurations before any
//! integration starts. All problems are collected and reported together.

use crate::{ConfigError, ConfigResult, TrialConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
    LocationOutOfField {
        field: String,
        location: usize,
        cells: usize,
    },
    TooManyCues {
        cues: usize,
        ranks: usize,
    },
    InvalidValue {
        field: String,
        reason: String,
    },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "{} has {} entries but cues.locations has {}",
                field, actual, expected
            ),
            Self::LocationOutOfField {
                field,
                location,
                cells,
            } => write!(
                f,
                "{} = {} is outside the field (valid range 1-{})",
                field, location, cells
            ),
            Self::TooManyCues { cues, ranks } => write!(
                f,
                "{} cues exceed field.rank_count = {} rank slots",
                cues, ranks
            ),
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Positive, finite step and duration
/// - Non-empty field and at least one rank slot
/// - Locations inside the field
/// - Parallel cue lists of equal length with finite, non-negative times
/// - Enough rank slots for the cue sequence
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` with details if validation fails
pub fn validate_config(config: &TrialConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_simulation(config, &mut errors);
    validate_field(config, &mut errors);
    validate_cues(config, &mut errors);
    validate_stimulation(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn invalid(field: &str, reason: &str) -> ConfigValidationError {
    ConfigValidationError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_simulation(config: &TrialConfig, errors: &mut Vec<ConfigValidationError>) {
    let sim = &config.simulation;
    if !(sim.step.is_finite() && sim.step > 0.0) {
        errors.push(invalid("simulation.step", "must be positive and finite"));
    }
    if !(sim.duration.is_finite() && sim.duration > 0.0) {
        errors.push(invalid("simulation.duration", "must be positive and finite"));
    } else if sim.step > sim.duration {
        errors.push(invalid(
            "simulation.step",
            "must not exceed simulation.duration",
        ));
    }
}

fn validate_field(config: &TrialConfig, errors: &mut Vec<ConfigValidationError>) {
    let field = &config.field;
    if field.width == 0 || field.height == 0 {
        errors.push(invalid("field.width/field.height", "must be at least 1"));
        return;
    }
    if field.rank_count == 0 {
        errors.push(invalid("field.rank_count", "must be at least 1"));
    }
    if !field.contains(field.fixation) {
        errors.push(ConfigValidationError::LocationOutOfField {
            field: "field.fixation".to_string(),
            location: field.fixation,
            cells: field.cell_count(),
        });
    }
}

fn validate_cues(config: &TrialConfig, errors: &mut Vec<ConfigValidationError>) {
    let cues = &config.cues;
    let expected = cues.locations.len();

    for (name, actual) in [
        ("cues.onsets", cues.onsets.len()),
        ("cues.offsets", cues.offsets.len()),
    ] {
        if actual != expected {
            errors.push(ConfigValidationError::LengthMismatch {
                field: name.to_string(),
                expected,
                actual,
            });
        }
    }

    let cells = config.field.cell_count();
    for (i, &location) in cues.locations.iter().enumerate() {
        if cells > 0 && !config.field.contains(location) {
            errors.push(ConfigValidationError::LocationOutOfField {
                field: format!("cues.locations[{}]", i),
                location,
                cells,
            });
        }
    }

    for (name, times) in [("cues.onsets", &cues.onsets), ("cues.offsets", &cues.offsets)] {
        for (i, &t) in times.iter().enumerate() {
            if !(t.is_finite() && t >= 0.0) {
                errors.push(invalid(
                    &format!("{}[{}]", name, i),
                    "must be finite and non-negative",
                ));
            }
        }
    }

    if config.field.rank_count > 0 && expected > config.field.rank_count {
        errors.push(ConfigValidationError::TooManyCues {
            cues: expected,
            ranks: config.field.rank_count,
        });
    }
}

fn validate_stimulation(config: &TrialConfig, errors: &mut Vec<ConfigValidationError>) {
    let stim = &config.stimulation;
    let cells = config.field.cell_count();
    if cells > 0 && !config.field.contains(stim.location) {
        errors.push(ConfigValidationError::LocationOutOfField {
            field: "stimulation.location".to_string(),
            location: stim.location,
            cells,
        });
    }
    if !(stim.spread.is_finite() && stim.spread > 0.0) {
        errors.push(invalid("stimulation.spread", "must be positive and finite"));
    }
    if !stim.strength.is_finite() {
        errors.push(invalid("stimulation.strength", "must be finite"));
    }
    for (name, t) in [("stimulation.onset", stim.onset), ("stimulation.offset", stim.offset)] {
        if !(t.is_finite() && t >= 0.0) {
            errors.push(invalid(name, "must be finite and non-negative"));
        }
    }
}
