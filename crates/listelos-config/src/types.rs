// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `listelos_trial.toml`.

use serde::{Deserialize, Serialize};

/// Root configuration structure for one trial
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrialConfig {
    pub simulation: SimulationConfig,
    pub field: FieldConfig,
    pub network: NetworkConfig,
    pub cues: CueSchedule,
    pub stimulation: StimulationConfig,
}

/// Integration settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed integration step (seconds)
    pub step: f64,
    /// Trial length (seconds)
    pub duration: f64,
    /// Seed for the working-memory noise stream
    pub seed: u64,
    /// Report saccades and counting-cell updates at info level
    pub verbose: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step: 0.001,
            duration: 2.0,
            seed: 1,
            verbose: false,
        }
    }
}

/// Spatial field and rank slots
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FieldConfig {
    pub width: usize,
    pub height: usize,
    /// Fixation location (1-based)
    pub fixation: usize,
    /// Number of ordinal rank (counting cell) slots
    pub rank_count: usize,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 9,
            height: 9,
            fixation: 41,
            rank_count: 4,
        }
    }
}

impl FieldConfig {
    /// Number of spatial cells in the field
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Whether a 1-based location lies inside the field
    pub fn contains(&self, location: usize) -> bool {
        location >= 1 && location <= self.cell_count()
    }
}

/// Pathway switches
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Load parietal activity into item-order-rank working memory
    pub working_memory: bool,
    /// Apply the 50 ms afferent delay to visual input
    pub input_delay: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            working_memory: true,
            input_delay: true,
        }
    }
}

/// Visual cue schedule. The three lists are parallel.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CueSchedule {
    /// Cue locations (1-based)
    pub locations: Vec<usize>,
    /// Onset times (seconds)
    pub onsets: Vec<f64>,
    /// Offset times (seconds, inclusive)
    pub offsets: Vec<f64>,
}

impl CueSchedule {
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Append one cue
    pub fn push(&mut self, location: usize, onset: f64, offset: f64) {
        self.locations.push(location);
        self.onsets.push(onset);
        self.offsets.push(offset);
    }

    /// Cues at a location other than fixation
    pub fn non_fixation_count(&self, fixation: usize) -> usize {
        self.locations.iter().filter(|&&l| l != fixation).count()
    }
}

/// Focal microstimulation of working memory
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StimulationConfig {
    /// Stimulation site (1-based)
    pub location: usize,
    /// Onset time (seconds)
    pub onset: f64,
    /// Offset time (seconds, inclusive)
    pub offset: f64,
    /// Gaussian spread (cells)
    pub spread: f64,
    /// Peak strength; 0 disables stimulation
    pub strength: f64,
}

impl Default for StimulationConfig {
    fn default() -> Self {
        Self {
            location: 41,
            onset: 0.0,
            offset: 0.0,
            spread: 1.0,
            strength: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TrialConfig = toml::from_str(
            r#"
            [simulation]
            duration = 1.5

            [cues]
            locations = [41, 14]
            onsets = [0.0, 0.5]
            offsets = [0.5, 1.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.duration, 1.5);
        assert_eq!(config.simulation.step, 0.001);
        assert_eq!(config.field, FieldConfig::default());
        assert_eq!(config.cues.len(), 2);
        assert_eq!(config.cues.non_fixation_count(41), 1);
    }

    #[test]
    fn test_field_contains() {
        let field = FieldConfig::default();
        assert!(field.contains(1));
        assert!(field.contains(81));
        assert!(!field.contains(0));
        assert!(!field.contains(82));
    }

    #[test]
    fn test_json_roundtrip_shape() {
        let json = serde_json::to_value(TrialConfig::default()).unwrap();
        assert_eq!(json["field"]["fixation"], 41);
        assert_eq!(json["network"]["working_memory"], true);
    }
}
