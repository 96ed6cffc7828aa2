// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Benchmark task presets
//!
//! Cue timing for the standard tasks. Task scripts may start from one of these
//! and adjust individual fields.

use crate::types::{CueSchedule, NetworkConfig, StimulationConfig, TrialConfig};

impl TrialConfig {
    /// Four-cue memory-guided sequence: fixation at 41 for the first second,
    /// then three 100 ms cues at 38, 14 and 38.
    pub fn sequence_recall() -> Self {
        let mut cues = CueSchedule::default();
        cues.push(41, 0.0, 1.0);
        cues.push(38, 0.1, 0.2);
        cues.push(14, 0.3, 0.4);
        cues.push(38, 0.5, 0.6);
        Self {
            cues,
            ..Self::default()
        }
    }

    /// Visually guided saccade with working memory bypassed.
    ///
    /// Fixation is shown for 0.5 s and the target at 14 appears `gap` seconds
    /// after fixation offset for 0.5 s.
    pub fn gap_saccade(gap: f64) -> Self {
        let mut config = Self::default();
        config.network = NetworkConfig {
            working_memory: false,
            ..NetworkConfig::default()
        };
        config.cues.push(41, 0.0, 0.5);
        config.cues.push(14, 0.5 + gap, 1.0 + gap);
        config.simulation.duration = 1.5 + gap;
        config
    }

    /// Sequence recall with working-memory microstimulation at `site`.
    pub fn microstimulation(site: usize, onset: f64, offset: f64, strength: f64) -> Self {
        Self {
            stimulation: StimulationConfig {
                location: site,
                onset,
                offset,
                strength,
                ..StimulationConfig::default()
            },
            ..Self::sequence_recall()
        }
    }

    /// No cues and no stimulation.
    pub fn quiescent(duration: f64) -> Self {
        let mut config = Self::default();
        config.simulation.duration = duration;
        config
    }
}
