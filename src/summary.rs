// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Compact, serialisable view of a finished trial.
//!
//! The trajectory itself is too large to print; the summary keeps the saccade
//! log, diagnostics and the peak activity of every population.

use ndarray::Axis;
use serde::Serialize;

use listelos_config::TrialConfig;
use listelos_model::{FieldLayout, SaccadeLog, TrialDiagnostics, TrialOutput};

/// Largest value a population reached during the trial
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationPeak {
    pub name: &'static str,
    pub value: f64,
    /// Time of the peak in seconds
    pub time: f64,
    /// Element index within the population
    pub element: usize,
}

/// Summary of one trial
#[derive(Debug, Clone, Serialize)]
pub struct TrialSummary {
    pub config: TrialConfig,
    pub layout: FieldLayout,
    pub state_length: usize,
    pub saccades: SaccadeLog,
    pub diagnostics: TrialDiagnostics,
    pub final_eye: usize,
    pub peaks: Vec<PopulationPeak>,
}

impl TrialSummary {
    pub fn new(config: &TrialConfig, output: &TrialOutput) -> Self {
        let peaks = output
            .layout
            .populations()
            .iter()
            .filter_map(|population| {
                let view = output.population(population.name)?;
                let (mut best, mut at) = (f64::MIN, (0, 0));
                for (n, row) in view.axis_iter(Axis(0)).enumerate() {
                    for (i, &v) in row.iter().enumerate() {
                        if v > best {
                            best = v;
                            at = (n, i);
                        }
                    }
                }
                Some(PopulationPeak {
                    name: population.name,
                    value: best,
                    time: at.0 as f64 * output.step,
                    element: at.1,
                })
            })
            .collect();

        Self {
            config: config.clone(),
            layout: output.layout.clone(),
            state_length: output.layout.len(),
            saccades: output.saccades.clone(),
            diagnostics: output.diagnostics.clone(),
            final_eye: output.final_eye,
            peaks,
        }
    }

    /// Peak record for a population name
    pub fn peak(&self, name: &str) -> Option<&PopulationPeak> {
        self.peaks.iter().find(|p| p.name == name)
    }
}
