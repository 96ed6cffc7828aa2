// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # listelos - Sequential Saccade Planning Model
//!
//! Continuous-time neural network model of memory-guided saccade sequences:
//! item-order-rank working memory, supplementary eye field selection,
//! basal-ganglia gating and collicular saccade generation, with gaze
//! remapping after every saccade.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! listelos = "0.1"
//! ```
//!
//! ```rust,no_run
//! use listelos::prelude::*;
//!
//! let output = run_trial(&TrialConfig::gap_saccade(0.0)).expect("trial failed");
//! if let Some((time, target)) = output.first_saccade_after(0.5) {
//!     println!("saccade to {} after {:.0} ms", target, (time - 0.5) * 1000.0);
//! }
//! ```
//!
//! ## Feature Flags
//! - **`file-logging`**: JSON log files in timestamped run folders
//!
//! ## Crates
//! - [`config`]: trial configuration, presets and validation
//! - [`model`]: layout, signals, remap, dynamics, integration, trial driver
//! - [`observability`]: logging initialisation and debug flags

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use listelos_config as config;
pub use listelos_model as model;
pub use listelos_observability as observability;

pub mod summary;

pub use summary::{PopulationPeak, TrialSummary};

/// Common imports
pub mod prelude {
    pub use listelos_config::{load_config, validate_config, TrialConfig};
    pub use listelos_model::{
        run_trial, run_trial_with, NetworkParameters, SaccadeLog, SaccadeOutcome,
        TrialDiagnostics, TrialOutput,
    };

    pub use crate::summary::TrialSummary;
}
