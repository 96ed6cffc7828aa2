// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Trial Driver
//!
//! Entry point for one simulated trial:
//!
//! 1. validate the configuration and network parameters
//! 2. rescale every time-valued option to internal units
//! 3. build the layout, cue and stimulation signals, and remap operators
//! 4. integrate with RK4 from the initial state
//! 5. rescale saccade times back to seconds and collect diagnostics
//!
//! Configuration errors are reported before any integration step runs.

use ndarray::{s, Array1, Array2, ArrayView2};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use listelos_config::{validate_config, TrialConfig};

use crate::integrator::{integrate, OdeSystem};
use crate::layout::FieldLayout;
use crate::params::{NetworkParameters, TIME_SCALE};
use crate::remap::Remap;
use crate::session::{SaccadeLog, SessionOptions, TrialDiagnostics, TrialSession};
use crate::signals::{InputSignal, SampleGrid, StimulationSignal};
use crate::types::{ModelError, Result};

/// Largest `step × rate` considered comfortably stable for RK4 on this network
const STABLE_STEP_RATE: f64 = 0.5;

/// Everything a trial produces
#[derive(Debug, Clone, Serialize)]
pub struct TrialOutput {
    pub layout: FieldLayout,
    /// `(steps + 1) x state length`, row `n` at time `n × step`
    #[serde(skip)]
    pub trajectory: Array2<f64>,
    /// Saccade log with times in seconds
    pub saccades: SaccadeLog,
    pub diagnostics: TrialDiagnostics,
    /// Integration step in seconds
    pub step: f64,
    /// Final eye position (1-based)
    pub final_eye: usize,
}

impl TrialOutput {
    /// Trajectory columns of one population, `None` for an unknown name
    pub fn population(&self, name: &str) -> Option<ArrayView2<'_, f64>> {
        let population = self.layout.get(name)?;
        Some(self.trajectory.slice(s![.., population.start..population.end]))
    }

    /// Sample times in seconds
    pub fn time_axis(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.trajectory.nrows(), |n| n as f64 * self.step)
    }

    /// First saccade strictly after `time` seconds, as `(time, target)`
    pub fn first_saccade_after(&self, time: f64) -> Option<(f64, usize)> {
        self.saccades.iter().find(|&(t, _)| t > time)
    }
}

/// Validate and assemble a trial session without integrating it
///
/// # Errors
/// - `ModelError::Config` for an invalid configuration
/// - `ModelError::InvalidParameters` for invalid network parameters
pub fn prepare_session(config: &TrialConfig, params: &NetworkParameters) -> Result<TrialSession> {
    validate_config(config)?;
    params
        .validate()
        .map_err(|reason| ModelError::InvalidParameters(reason.to_string()))?;

    let field = &config.field;
    let step = config.simulation.step * TIME_SCALE;
    let duration = config.simulation.duration * TIME_SCALE;
    let grid = SampleGrid::new(step, duration);
    let layout = FieldLayout::build(field.width, field.height, field.rank_count)?;
    let cells = layout.cells();

    let locations: Vec<usize> = config.cues.locations.iter().map(|&l| l - 1).collect();
    let onsets: Vec<f64> = config.cues.onsets.iter().map(|&t| t * TIME_SCALE).collect();
    let offsets: Vec<f64> = config.cues.offsets.iter().map(|&t| t * TIME_SCALE).collect();
    let input = InputSignal::build(&grid, cells, &locations, &onsets, &offsets);

    let stim = &config.stimulation;
    let stimulation = StimulationSignal::build(
        &grid,
        field.width,
        field.height,
        stim.location - 1,
        stim.onset * TIME_SCALE,
        stim.offset * TIME_SCALE,
        stim.spread,
        stim.strength,
    );

    let remap = Remap::new(cells, field.fixation - 1);

    let stiffness = step * params.fastest_rate();
    if stiffness > STABLE_STEP_RATE {
        warn!(
            "Step {} s with fastest rate {} gives step×rate {:.2}; integration may be unstable",
            config.simulation.step,
            params.fastest_rate(),
            stiffness
        );
    }

    debug!(
        "Prepared trial: {}x{} field, {} ranks, {} state variables, {} steps",
        field.width,
        field.height,
        field.rank_count,
        layout.len(),
        grid.samples()
    );

    let options = SessionOptions {
        working_memory: config.network.working_memory,
        input_delay: config.network.input_delay,
        verbose: config.simulation.verbose,
        seed: config.simulation.seed,
    };

    Ok(TrialSession::new(
        *params,
        layout,
        grid,
        input,
        stimulation,
        remap,
        &locations,
        options,
    ))
}

/// Run one trial with default network parameters
pub fn run_trial(config: &TrialConfig) -> Result<TrialOutput> {
    run_trial_with(config, &NetworkParameters::default())
}

/// Run one trial with explicit network parameters
///
/// # Errors
/// See [`prepare_session`]. Once integration starts the trial always
/// completes; anomalies are reported through [`TrialDiagnostics`].
pub fn run_trial_with(config: &TrialConfig, params: &NetworkParameters) -> Result<TrialOutput> {
    let span = info_span!("trial", seed = config.simulation.seed);
    let _enter = span.enter();

    let mut session = prepare_session(config, params)?;
    let initial = session.layout().initial_state();
    let step = session.grid().step();
    let steps = session.grid().samples();
    debug_assert_eq!(initial.len(), session.dimension());

    let trajectory = integrate(&mut session, &initial, step, steps)?;

    let non_finite = trajectory.iter().filter(|v| !v.is_finite()).count();
    if non_finite > 0 {
        warn!("Trajectory contains {} non-finite values", non_finite);
    }
    session.diagnostics_mut().non_finite_values = non_finite;

    let (layout, log, diagnostics, eye) = session.into_results();
    let saccades = log.rescaled(TIME_SCALE);
    let diagnostics = TrialDiagnostics {
        ambiguous_targets: diagnostics
            .ambiguous_targets
            .into_iter()
            .map(|mut event| {
                event.time /= TIME_SCALE;
                event
            })
            .collect(),
        ..diagnostics
    };

    info!(
        "Trial complete: {} saccades, targets {:?}",
        saccades.len(),
        saccades.targets
    );

    Ok(TrialOutput {
        layout,
        trajectory,
        saccades,
        diagnostics,
        step: config.simulation.step,
        final_eye: eye + 1,
    })
}
