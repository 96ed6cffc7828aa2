// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Network Parameters
//!
//! Constants of the shunting equations. Rates are per internal time unit;
//! durations are given in seconds and converted with [`TIME_SCALE`].
//!
//! ```text
//! dx/dt = rate × ( −x + (1 − x)·excitation − x·inhibition )
//! ```

use serde::{Deserialize, Serialize};

/// Internal integration units per external second
pub const TIME_SCALE: f64 = 10.0;

/// Per-region integration rates (1 / internal time unit)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionRates {
    pub parietal: f64,
    pub lip: f64,
    pub working_memory: f64,
    pub interneuron: f64,
    pub sef: f64,
    pub fef: f64,
    pub postsaccadic: f64,
    pub basal_ganglia: f64,
    pub thalamus: f64,
    pub colliculus: f64,
    /// Recovery rate of the ascending (rehearsal) habituative gate
    pub ascending_gate_recovery: f64,
    /// Recovery rate of the descending (output) habituative gate
    pub descending_gate_recovery: f64,
}

impl Default for RegionRates {
    fn default() -> Self {
        Self {
            parietal: 10.0,
            lip: 5.0,
            working_memory: 5.0,
            interneuron: 10.0,
            sef: 10.0,
            fef: 10.0,
            postsaccadic: 2.0,
            basal_ganglia: 10.0,
            thalamus: 10.0,
            colliculus: 10.0,
            ascending_gate_recovery: 0.01,
            descending_gate_recovery: 0.05,
        }
    }
}

impl RegionRates {
    fn all(&self) -> [f64; 12] {
        [
            self.parietal,
            self.lip,
            self.working_memory,
            self.interneuron,
            self.sef,
            self.fef,
            self.postsaccadic,
            self.basal_ganglia,
            self.thalamus,
            self.colliculus,
            self.ascending_gate_recovery,
            self.descending_gate_recovery,
        ]
    }
}

/// Network-wide parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkParameters {
    /// Colliculus activity that commits a saccade
    pub saccade_threshold: f64,

    /// Standard deviation of the working-memory noise term
    pub noise_std: f64,

    /// Afferent visual delay in seconds (applied when enabled)
    pub input_delay: f64,

    /// Decrease of SEF rehearsal drive per rank
    pub rank_gradient: f64,

    /// Duration of the post-saccadic corollary discharge in seconds
    pub corollary_window: f64,

    /// Half-saturation constant of the faster-than-linear signal function
    pub half_saturation: f64,

    /// Basal-ganglia shunting constant
    pub bg_kappa: f64,

    pub rates: RegionRates,
}

impl Default for NetworkParameters {
    fn default() -> Self {
        Self {
            saccade_threshold: 0.5,
            noise_std: 0.01,
            input_delay: 0.05,
            rank_gradient: 0.2,
            corollary_window: 0.05,
            half_saturation: 0.09,
            bg_kappa: 0.25,
            rates: RegionRates::default(),
        }
    }
}

impl NetworkParameters {
    /// Corollary discharge window in internal time units
    pub fn corollary_window_internal(&self) -> f64 {
        self.corollary_window * TIME_SCALE
    }

    /// Input delay in internal time units
    pub fn input_delay_internal(&self) -> f64 {
        self.input_delay * TIME_SCALE
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.saccade_threshold > 0.0 && self.saccade_threshold < 1.0) {
            return Err("saccade_threshold must be in (0, 1)");
        }
        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err("noise_std must be finite and non-negative");
        }
        if !(self.input_delay.is_finite() && self.input_delay >= 0.0) {
            return Err("input_delay must be finite and non-negative");
        }
        if !(self.corollary_window.is_finite() && self.corollary_window >= 0.0) {
            return Err("corollary_window must be finite and non-negative");
        }
        if !(self.rank_gradient >= 0.0 && self.rank_gradient < 1.0) {
            return Err("rank_gradient must be in [0, 1)");
        }
        if !(self.half_saturation > 0.0 && self.half_saturation.is_finite()) {
            return Err("half_saturation must be positive");
        }
        if !(self.bg_kappa > 0.0 && self.bg_kappa.is_finite()) {
            return Err("bg_kappa must be positive");
        }
        if self.rates.all().iter().any(|r| !(r.is_finite() && *r > 0.0)) {
            return Err("rates must be positive and finite");
        }
        Ok(())
    }

    /// Fastest rate in the network, for step-size checks
    pub fn fastest_rate(&self) -> f64 {
        self.rates.all().iter().copied().fold(0.0, f64::max)
    }
}
