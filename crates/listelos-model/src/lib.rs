// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Sequential Saccade Network
//!
//! Continuous-time model of sequential eye-movement planning. Coupled
//! shunting equations across parietal, prefrontal, supplementary and frontal
//! eye field, basal-ganglia, thalamic and collicular populations are driven
//! by timed visual cues and optional working-memory microstimulation. A
//! saccade controller embedded in the derivative moves the eye whenever the
//! colliculus crosses threshold, re-referencing all spatial input from then
//! on.
//!
//! - **Layout**: ordered population ranges in one flat state vector
//! - **Signals**: cue and stimulation matrices on the integration grid
//! - **Remap**: retinotopic ↔ craniotopic shifts for the current gaze
//! - **Session**: eye position, counting cells, saccade log, diagnostics
//! - **Dynamics**: the derivative function
//! - **Integrator**: fixed-step RK4
//! - **Trial**: configuration in, trajectory and saccades out
//!
//! ## Usage
//!
//! ```rust,no_run
//! use listelos_config::TrialConfig;
//! use listelos_model::run_trial;
//!
//! let output = run_trial(&TrialConfig::sequence_recall()).expect("trial failed");
//! for (time, target) in output.saccades.iter() {
//!     println!("{:.3} s -> {}", time, target);
//! }
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod types;

pub mod dynamics;
pub mod integrator;
pub mod layout;
pub mod params;
pub mod remap;
pub mod session;
pub mod signals;
pub mod trial;

pub use integrator::{integrate, OdeSystem, Rk4};
pub use layout::{FieldLayout, Population, PopulationId, PopulationShape};
pub use params::{NetworkParameters, RegionRates, TIME_SCALE};
pub use remap::Remap;
pub use session::{
    AmbiguousTarget, SaccadeLog, SaccadeOutcome, SessionOptions, TrialDiagnostics, TrialSession,
};
pub use signals::{gaussian_kernel, InputSignal, SampleGrid, StimulationSignal};
pub use trial::{prepare_session, run_trial, run_trial_with, TrialOutput};
pub use types::{ModelError, Result};
