// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Trial Session
//!
//! Discrete state that lives outside the integrated vector:
//!
//! - current eye position
//! - time of the last saccade
//! - in-saccade flag
//! - counting-cell (open rank) vector
//! - the working-memory noise stream
//! - the saccade log
//!
//! The derivative function (see `dynamics`) is a method on [`TrialSession`]
//! and updates this state as a side effect. RK4 evaluates it several times per
//! step against the same session, so the saccade controller is guarded by
//! sample index and by the in-saccade flag: a saccade is committed at most
//! once per executed sample and once per suprathreshold episode.
//!
//! ```text
//!            max(SC) > θ, new sample, target ≠ eye
//! Fixating ───────────────────────────────────────▶ InSaccade
//!    ▲                                                  │
//!    └──────────────────── max(SC) ≤ θ ─────────────────┘
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::layout::FieldLayout;
use crate::params::NetworkParameters;
use crate::remap::Remap;
use crate::signals::{InputSignal, SampleGrid, StimulationSignal};

/// Diagnostic class of a committed saccade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaccadeOutcome {
    /// Fixation cue present, gaze left fixation
    BrokeFixation,
    /// Fixation cue present, gaze landed on fixation
    AcquiredFixation,
    /// Fixation cue absent, gaze landed on fixation
    UnnecessaryFixation,
    /// Any other gaze shift
    Executed,
}

/// Append-only record of committed saccades
///
/// `times` and `targets` are parallel; targets are 1-based locations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SaccadeLog {
    pub times: Vec<f64>,
    pub targets: Vec<usize>,
    pub outcomes: Vec<SaccadeOutcome>,
}

impl SaccadeLog {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    fn push(&mut self, time: f64, target: usize, outcome: SaccadeOutcome) {
        self.times.push(time);
        self.targets.push(target);
        self.outcomes.push(outcome);
    }

    /// `(time, target)` pairs in commit order
    pub fn iter(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.times.iter().copied().zip(self.targets.iter().copied())
    }

    /// Same log with every time divided by `time_scale`
    pub fn rescaled(&self, time_scale: f64) -> Self {
        Self {
            times: self.times.iter().map(|t| t / time_scale).collect(),
            targets: self.targets.clone(),
            outcomes: self.outcomes.clone(),
        }
    }
}

/// More than one colliculus location above threshold when a saccade fired
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousTarget {
    pub time: f64,
    /// 1-based retinotopic candidates; the first one was used
    pub candidates: Vec<usize>,
}

/// Non-fatal anomalies observed during a trial
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrialDiagnostics {
    pub ambiguous_targets: Vec<AmbiguousTarget>,
    /// Saccade commands whose landing point left the field (not executed)
    pub out_of_field_commands: usize,
    /// Non-finite trajectory entries
    pub non_finite_values: usize,
}

impl TrialDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.ambiguous_targets.is_empty()
            && self.out_of_field_commands == 0
            && self.non_finite_values == 0
    }
}

/// Per-trial switches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionOptions {
    pub working_memory: bool,
    pub input_delay: bool,
    pub verbose: bool,
    pub seed: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            working_memory: true,
            input_delay: true,
            verbose: false,
            seed: 1,
        }
    }
}

/// Reusable per-evaluation buffers
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    pub cranio_input: Vec<f64>,
    pub retino_input: Vec<f64>,
    pub salience: Vec<f64>,
    pub cranio_salience: Vec<f64>,
    pub selection_signal: Vec<f64>,
    pub sef_drive: Vec<f64>,
    pub retino_sef_drive: Vec<f64>,
    pub colliculus_signal: Vec<f64>,
    pub rank_totals: Vec<f64>,
}

impl Scratch {
    fn new(cells: usize, ranks: usize) -> Self {
        Self {
            cranio_input: vec![0.0; cells],
            retino_input: vec![0.0; cells],
            salience: vec![0.0; cells],
            cranio_salience: vec![0.0; cells],
            selection_signal: vec![0.0; cells * ranks],
            sef_drive: vec![0.0; cells],
            retino_sef_drive: vec![0.0; cells],
            colliculus_signal: vec![0.0; cells],
            rank_totals: vec![0.0; ranks],
        }
    }
}

/// One trial's model, signals and discrete session state
pub struct TrialSession {
    pub(crate) params: NetworkParameters,
    pub(crate) layout: FieldLayout,
    pub(crate) grid: SampleGrid,
    pub(crate) input: InputSignal,
    pub(crate) stimulation: StimulationSignal,
    pub(crate) remap: Remap,
    pub(crate) options: SessionOptions,
    pub(crate) delay_samples: usize,

    /// (onset sample, rank) for non-fixation cues, ordered by rank
    rank_onsets: Vec<(usize, usize)>,

    pub(crate) eye: usize,
    pub(crate) last_saccade: Option<f64>,
    in_saccade: bool,
    rejected_episode: bool,
    /// Last sample whose ambiguous target set was reported
    ambiguous_sample: Option<usize>,
    pub(crate) saccade_vector: Option<usize>,
    pub(crate) counting: Vec<f64>,
    open_rank: usize,
    pub(crate) rng: StdRng,

    log: SaccadeLog,
    diagnostics: TrialDiagnostics,
    pub(crate) scratch: Scratch,
}

impl TrialSession {
    /// Assemble a session
    ///
    /// `cue_locations` are 0-based and parallel to the input signal's onsets;
    /// they are used to rank non-fixation cues by onset.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        params: NetworkParameters,
        layout: FieldLayout,
        grid: SampleGrid,
        input: InputSignal,
        stimulation: StimulationSignal,
        remap: Remap,
        cue_locations: &[usize],
        options: SessionOptions,
    ) -> Self {
        let cells = layout.cells();
        let ranks = layout.ranks;
        let fixation = remap.fixation();

        let mut ordered: Vec<(usize, usize)> = cue_locations
            .iter()
            .zip(input.onset_samples())
            .enumerate()
            .filter(|&(_, (&location, _))| location != fixation)
            .map(|(cue, (_, &onset))| (onset, cue))
            .collect();
        // Stable: equal onsets keep schedule order
        ordered.sort_by_key(|&(onset, _)| onset);
        let rank_onsets = ordered
            .into_iter()
            .enumerate()
            .filter(|&(rank, _)| rank < ranks)
            .map(|(rank, (onset, _))| (onset, rank))
            .collect();

        let delay_samples = if options.input_delay {
            (params.input_delay_internal() / grid.step()).round() as usize
        } else {
            0
        };

        let mut counting = vec![0.0; ranks];
        counting[0] = 1.0;

        Self {
            params,
            grid,
            input,
            stimulation,
            remap,
            options,
            delay_samples,
            rank_onsets,
            eye: fixation,
            last_saccade: None,
            in_saccade: false,
            rejected_episode: false,
            ambiguous_sample: None,
            saccade_vector: None,
            counting,
            open_rank: 0,
            rng: StdRng::seed_from_u64(options.seed),
            log: SaccadeLog::default(),
            diagnostics: TrialDiagnostics::default(),
            scratch: Scratch::new(cells, ranks),
            layout,
        }
    }

    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    pub fn params(&self) -> &NetworkParameters {
        &self.params
    }

    pub fn grid(&self) -> &SampleGrid {
        &self.grid
    }

    /// Current eye position (0-based)
    pub fn eye(&self) -> usize {
        self.eye
    }

    pub fn in_saccade(&self) -> bool {
        self.in_saccade
    }

    /// Time of the last committed saccade (internal units)
    pub fn last_saccade(&self) -> Option<f64> {
        self.last_saccade
    }

    /// Counting-cell vector (one-hot at the open rank)
    pub fn counting(&self) -> &[f64] {
        &self.counting
    }

    /// Saccade log with internal-unit times
    pub fn log(&self) -> &SaccadeLog {
        &self.log
    }

    pub fn diagnostics(&self) -> &TrialDiagnostics {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut TrialDiagnostics {
        &mut self.diagnostics
    }

    /// Consume the session, returning its log and diagnostics
    pub fn into_results(self) -> (FieldLayout, SaccadeLog, TrialDiagnostics, usize) {
        (self.layout, self.log, self.diagnostics, self.eye)
    }

    /// Open the rank of a non-fixation cue whose onset is sample `k`
    pub(crate) fn update_counting(&mut self, k: usize) {
        let Some(&(_, rank)) = self.rank_onsets.iter().find(|&&(onset, _)| onset == k) else {
            return;
        };
        if rank == self.open_rank {
            return;
        }

        self.counting.iter_mut().for_each(|c| *c = 0.0);
        self.counting[rank] = 1.0;
        self.open_rank = rank;

        if self.options.verbose {
            info!("Counting cells open rank {} at sample {}", rank, k);
        } else {
            debug!("Counting cells open rank {} at sample {}", rank, k);
        }
    }

    /// Detect and commit a saccade from colliculus activity
    ///
    /// `t` is the evaluation time, `k` its sample and `colliculus` the
    /// colliculus population of the state being evaluated.
    pub(crate) fn update_saccade_controller(&mut self, t: f64, k: usize, colliculus: &[f64]) {
        let threshold = self.params.saccade_threshold;
        let peak = colliculus.iter().fold(0.0_f64, |m, &v| m.max(v));

        if peak <= threshold {
            self.in_saccade = false;
            self.rejected_episode = false;
            return;
        }

        if self.in_saccade {
            return;
        }
        if let Some(last) = self.last_saccade {
            if self.grid.index_of(last) == k {
                return;
            }
        }

        let candidates: Vec<usize> = colliculus
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v > threshold)
            .map(|(i, _)| i)
            .collect();
        if candidates.len() > 1 && self.ambiguous_sample != Some(k) {
            self.ambiguous_sample = Some(k);
            let candidates: Vec<usize> = candidates.iter().map(|c| c + 1).collect();
            warn!(
                "{} simultaneous suprathreshold colliculus targets {:?}; using {}",
                candidates.len(),
                candidates,
                candidates[0]
            );
            self.diagnostics
                .ambiguous_targets
                .push(AmbiguousTarget { time: t, candidates });
        }
        let retinal = candidates[0];

        let Some(target) = self.remap.target_of(self.eye, retinal) else {
            if !self.rejected_episode {
                self.rejected_episode = true;
                self.diagnostics.out_of_field_commands += 1;
                warn!(
                    "Saccade command to retinotopic {} from eye {} leaves the field; ignored",
                    retinal + 1,
                    self.eye + 1
                );
            }
            return;
        };
        if target == self.eye {
            return;
        }

        let outcome = self.classify(k, target);
        self.log.push(t, target + 1, outcome);
        if self.options.verbose {
            info!("Saccade at t={:.4} to {} ({:?})", t, target + 1, outcome);
        } else {
            debug!("Saccade at t={:.4} to {} ({:?})", t, target + 1, outcome);
        }

        self.eye = target;
        self.last_saccade = Some(t);
        self.in_saccade = true;
        self.saccade_vector = Some(retinal);
    }

    fn classify(&self, k: usize, target: usize) -> SaccadeOutcome {
        let fixation = self.remap.fixation();
        let fixation_cue = self.input.value(k, fixation) > 0.0;
        match (fixation_cue, target == fixation) {
            (true, false) => SaccadeOutcome::BrokeFixation,
            (true, true) => SaccadeOutcome::AcquiredFixation,
            (false, true) => SaccadeOutcome::UnnecessaryFixation,
            (false, false) => SaccadeOutcome::Executed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::TIME_SCALE;

    fn session(locations: &[usize], onsets: &[f64], offsets: &[f64]) -> TrialSession {
        let grid = SampleGrid::new(0.01, 5.0);
        let layout = FieldLayout::build(9, 9, 4).unwrap();
        let input = InputSignal::build(&grid, 81, locations, onsets, offsets);
        let stimulation = StimulationSignal::build(&grid, 9, 9, 40, 0.0, 0.0, 1.0, 0.0);
        TrialSession::new(
            NetworkParameters::default(),
            layout,
            grid,
            input,
            stimulation,
            Remap::new(81, 40),
            locations,
            SessionOptions::default(),
        )
    }

    fn colliculus(active: &[(usize, f64)]) -> Vec<f64> {
        let mut sc = vec![0.0; 81];
        for &(i, v) in active {
            sc[i] = v;
        }
        sc
    }

    #[test]
    fn test_counting_starts_at_first_rank() {
        let s = session(&[], &[], &[]);
        assert_eq!(s.counting(), &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(s.eye(), 40);
    }

    #[test]
    fn test_counting_follows_onset_order() {
        // Fixation at 40 is skipped; 13 appears before 37
        let mut s = session(&[40, 37, 13], &[0.0, 3.0, 1.0], &[4.0, 3.5, 1.5]);
        s.update_counting(0);
        assert_eq!(s.counting(), &[1.0, 0.0, 0.0, 0.0]);
        s.update_counting(100);
        assert_eq!(s.counting(), &[1.0, 0.0, 0.0, 0.0]);
        s.update_counting(300);
        assert_eq!(s.counting(), &[0.0, 1.0, 0.0, 0.0]);
        // Between onsets nothing changes
        s.update_counting(301);
        assert_eq!(s.counting(), &[0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_repeated_location_gets_new_rank() {
        let mut s = session(&[40, 37, 13, 37], &[0.0, 1.0, 3.0, 5.0], &[10.0, 2.0, 4.0, 6.0]);
        s.update_counting(500);
        assert_eq!(s.counting(), &[0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_saccade_committed_once_per_sample() {
        let mut s = session(&[], &[], &[]);
        let sc = colliculus(&[(37, 0.8)]);

        s.update_saccade_controller(1.00, 100, &sc);
        assert_eq!(s.log().targets, vec![38]);
        assert_eq!(s.eye(), 37);
        assert!(s.in_saccade());

        // Later stages of the same step
        s.update_saccade_controller(1.005, 100, &sc);
        s.update_saccade_controller(1.01, 101, &sc);
        assert_eq!(s.log().len(), 1);
    }

    #[test]
    fn test_return_below_threshold_rearms() {
        let mut s = session(&[], &[], &[]);
        s.update_saccade_controller(1.0, 100, &colliculus(&[(37, 0.8)]));
        s.update_saccade_controller(1.2, 120, &colliculus(&[(37, 0.2)]));
        assert!(!s.in_saccade());

        // Eye now at 37: retinotopic 13 lands on 13 + (37 - 40) = 10
        s.update_saccade_controller(2.0, 200, &colliculus(&[(13, 0.9)]));
        assert_eq!(s.log().targets, vec![38, 11]);
        assert_eq!(s.eye(), 10);
    }

    #[test]
    fn test_foveal_activity_does_not_move_eye() {
        let mut s = session(&[], &[], &[]);
        s.update_saccade_controller(1.0, 100, &colliculus(&[(40, 0.9)]));
        assert!(s.log().is_empty());
        assert!(!s.in_saccade());
    }

    #[test]
    fn test_ambiguous_targets_recorded() {
        let mut s = session(&[], &[], &[]);
        let sc = colliculus(&[(13, 0.7), (37, 0.9)]);
        s.update_saccade_controller(1.0, 100, &sc);
        s.update_saccade_controller(1.005, 100, &sc);

        assert_eq!(s.log().targets, vec![14]);
        assert_eq!(s.diagnostics().ambiguous_targets.len(), 1);
        assert_eq!(s.diagnostics().ambiguous_targets[0].candidates, vec![14, 38]);
    }

    #[test]
    fn test_ambiguous_targets_reported_when_first_is_foveal() {
        let mut s = session(&[], &[], &[]);
        let sc = colliculus(&[(40, 0.9), (60, 0.9)]);
        s.update_saccade_controller(1.0, 100, &sc);
        s.update_saccade_controller(1.005, 100, &sc);

        // First candidate is the fovea, so gaze holds
        assert!(s.log().is_empty());
        assert_eq!(s.eye(), 40);
        assert_eq!(s.diagnostics().ambiguous_targets.len(), 1);
        assert_eq!(s.diagnostics().ambiguous_targets[0].candidates, vec![41, 61]);
        assert_eq!(s.diagnostics().ambiguous_targets[0].time, 1.0);

        s.update_saccade_controller(1.01, 101, &sc);
        assert_eq!(s.diagnostics().ambiguous_targets.len(), 2);
    }

    #[test]
    fn test_ambiguous_targets_reported_when_first_leaves_field() {
        let mut s = session(&[], &[], &[]);
        s.update_saccade_controller(1.0, 100, &colliculus(&[(37, 0.8)]));
        s.update_saccade_controller(1.2, 120, &colliculus(&[]));
        // Eye at 37: retinotopic 0 leaves the field, 13 would not
        s.update_saccade_controller(2.0, 200, &colliculus(&[(0, 0.9), (13, 0.9)]));

        assert_eq!(s.log().len(), 1);
        assert_eq!(s.diagnostics().out_of_field_commands, 1);
        assert_eq!(s.diagnostics().ambiguous_targets.len(), 1);
        assert_eq!(s.diagnostics().ambiguous_targets[0].candidates, vec![1, 14]);
    }

    #[test]
    fn test_out_of_field_command_counted_once() {
        let mut s = session(&[], &[], &[]);
        s.update_saccade_controller(1.0, 100, &colliculus(&[(37, 0.8)]));
        s.update_saccade_controller(1.2, 120, &colliculus(&[]));
        // Eye at 37 (displacement -3): retinotopic 0 lands outside
        let sc = colliculus(&[(0, 0.9)]);
        s.update_saccade_controller(2.0, 200, &sc);
        s.update_saccade_controller(2.01, 201, &sc);

        assert_eq!(s.log().len(), 1);
        assert_eq!(s.diagnostics().out_of_field_commands, 1);
    }

    #[test]
    fn test_outcome_classification() {
        // Fixation cue on 40 from 0 to 1.0 internal
        let mut s = session(&[40], &[0.0], &[1.0]);
        s.update_saccade_controller(0.5, 50, &colliculus(&[(37, 0.8)]));
        s.update_saccade_controller(0.6, 60, &colliculus(&[]));
        // Back to fixation while the cue is still on
        s.update_saccade_controller(0.8, 80, &colliculus(&[(43, 0.8)]));
        s.update_saccade_controller(0.9, 90, &colliculus(&[]));
        // Away and back again after cue offset
        s.update_saccade_controller(2.0, 200, &colliculus(&[(37, 0.8)]));
        s.update_saccade_controller(2.1, 210, &colliculus(&[]));
        s.update_saccade_controller(3.0, 300, &colliculus(&[(43, 0.8)]));

        assert_eq!(s.log().targets, vec![38, 41, 38, 41]);
        assert_eq!(
            s.log().outcomes,
            vec![
                SaccadeOutcome::BrokeFixation,
                SaccadeOutcome::AcquiredFixation,
                SaccadeOutcome::Executed,
                SaccadeOutcome::UnnecessaryFixation,
            ]
        );
    }

    #[test]
    fn test_log_rescale() {
        let mut log = SaccadeLog::default();
        for &t in &[0.05, 11.755, 19.27] {
            log.push(t, 38, SaccadeOutcome::Executed);
        }
        let external = log.rescaled(TIME_SCALE);
        for (internal, external) in log.times.iter().zip(&external.times) {
            assert_eq!(*external, internal / TIME_SCALE);
        }
        assert_eq!(external.times[0], 0.005);
        assert_eq!(external.targets, vec![38, 38, 38]);
    }

    #[test]
    fn test_outcome_serialises_snake_case() {
        let json = serde_json::to_value(SaccadeOutcome::BrokeFixation).unwrap();
        assert_eq!(json, "broke_fixation");

        let mut log = SaccadeLog::default();
        log.push(5.0, 14, SaccadeOutcome::UnnecessaryFixation);
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["outcomes"][0], "unnecessary_fixation");
        assert_eq!(json["targets"][0], 14);
    }
}
