// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Network Dynamics
//!
//! The derivative of the full state vector. Every population follows a
//! shunting equation
//!
//! ```text
//! dx/dt = rate × ( −x + (1 − x)·E − x·I )
//! ```
//!
//! with signal functions `[x]⁺ = max(x, 0)` and `f(x) = [x]⁺² / (h + [x]⁺²)`.
//!
//! ## Circuit
//!
//! ```text
//! cue ──delay──▶ C→R ──▶ PPC ──▶ LIP ──────────────▶ FEF plan ──▶ thalamus ──▶ FEF out ──▶ SC
//!                          │                            ▲            ▲                    ▲
//!                          └─ R→C ─▶ PFC WM ─▶ thalamus ─▶ SEF ─ C→R ─┘     BG gates ─────┴───┘
//! ```
//!
//! Each evaluation first runs the discrete updates (counting cells, saccade
//! controller) so that every population sees the same eye position, then
//! writes derivatives in layout order. Basal-ganglia gates are read from the
//! nigral state values, not from this evaluation's derivatives.

use std::mem;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::integrator::OdeSystem;
use crate::layout::{FieldLayout, PopulationId as P};
use crate::session::{Scratch, TrialSession};

/// SEF activity below this level does not propagate
const SEF_FLOOR: f64 = 0.2;

/// Peak drive of the post-saccadic (corollary discharge) cells
const COROLLARY_DRIVE: f64 = 10.0;

#[inline]
fn pos(x: f64) -> f64 {
    x.max(0.0)
}

/// Faster-than-linear signal function
#[inline]
fn sig(x: f64, half_saturation: f64) -> f64 {
    let p = pos(x);
    p * p / (half_saturation + p * p)
}

/// Write `f(i)` for every element of a population's derivative block
#[inline]
fn fill(dy: &mut [f64], layout: &FieldLayout, id: P, mut f: impl FnMut(usize) -> f64) {
    for (i, d) in dy[layout.range(id)].iter_mut().enumerate() {
        *d = f(i);
    }
}

/// One basal-ganglia channel family: direct, indirect, GABAergic and nigral
/// output populations of equal size, laid out contiguously in that order.
struct BasalGanglia {
    direct: P,
    indirect: P,
    gaba: P,
    nigral: P,
}

impl BasalGanglia {
    const WORKING_MEMORY: Self = Self {
        direct: P::BgWmDirect,
        indirect: P::BgWmIndirect,
        gaba: P::BgWmGaba,
        nigral: P::BgWmNigral,
    };
    const REHEARSAL: Self = Self {
        direct: P::BgRehearsalDirect,
        indirect: P::BgRehearsalIndirect,
        gaba: P::BgRehearsalGaba,
        nigral: P::BgRehearsalNigral,
    };
    const PLAN: Self = Self {
        direct: P::BgFefDirect,
        indirect: P::BgFefIndirect,
        gaba: P::BgFefGaba,
        nigral: P::BgFefNigral,
    };
    const COLLICULUS: Self = Self {
        direct: P::BgScDirect,
        indirect: P::BgScIndirect,
        gaba: P::BgScGaba,
        nigral: P::BgScNigral,
    };

    /// Disinhibitory gate `[1 − 2·nigral]⁺` of channel `i`
    #[inline]
    fn gate(&self, layout: &FieldLayout, y: &[f64], i: usize) -> f64 {
        pos(1.0 - 2.0 * layout.slice(y, self.nigral)[i])
    }

    /// Relax every channel toward its equilibrium under `go` and `stop` drive
    #[allow(clippy::too_many_arguments)]
    fn derivatives(
        &self,
        layout: &FieldLayout,
        y: &[f64],
        dy: &mut [f64],
        kappa: f64,
        rate: f64,
        go: impl Fn(usize) -> f64,
        stop: impl Fn(usize) -> f64,
    ) {
        let d = layout.slice(y, self.direct);
        let ind = layout.slice(y, self.indirect);
        let g = layout.slice(y, self.gaba);
        let s = layout.slice(y, self.nigral);

        let (d0, i0, g0, s0) = (
            layout.range(self.direct).start,
            layout.range(self.indirect).start,
            layout.range(self.gaba).start,
            layout.range(self.nigral).start,
        );

        for c in 0..d.len() {
            let (go_c, stop_c) = (go(c), stop(c));
            let direct_eq = go_c / (kappa + go_c + 4.0 * stop_c);
            let indirect_eq = stop_c / (kappa + stop_c);
            let gaba_eq = 1.0 / (1.0 + 3.0 * ind[c]);
            let nigral_eq = (0.5 + 2.0 * (1.0 - g[c])) / (1.0 + 4.0 * d[c]);

            dy[d0 + c] = rate * (direct_eq - d[c]);
            dy[i0 + c] = rate * (indirect_eq - ind[c]);
            dy[g0 + c] = rate * (gaba_eq - g[c]);
            dy[s0 + c] = rate * (nigral_eq - s[c]);
        }
    }
}

impl OdeSystem for TrialSession {
    fn dimension(&self) -> usize {
        self.layout.len()
    }

    fn derivative(&mut self, t: f64, y: &[f64], dy: &mut [f64]) {
        assert_eq!(
            y.len(),
            self.layout.len(),
            "state vector length does not match the field layout"
        );
        assert_eq!(dy.len(), y.len(), "derivative buffer length mismatch");

        let k = self.grid.index_of(t);
        self.update_counting(k);
        let colliculus = self.layout.slice(y, P::Colliculus);
        self.update_saccade_controller(t, k, colliculus);

        let mut scratch = mem::take(&mut self.scratch);
        self.evaluate(t, k, y, dy, &mut scratch);
        self.scratch = scratch;
    }
}

impl TrialSession {
    fn evaluate(&mut self, t: f64, k: usize, y: &[f64], dy: &mut [f64], scratch: &mut Scratch) {
        let layout = &self.layout;
        let params = &self.params;
        let rates = params.rates;
        let h = params.half_saturation;
        let cells = layout.cells();
        let fixation = self.remap.fixation();
        let eye = self.eye;

        // Delayed craniotopic cue input, seen through the current gaze
        match k.checked_sub(self.delay_samples) {
            Some(delayed) => {
                for (dst, &v) in scratch.cranio_input.iter_mut().zip(self.input.sample(delayed)) {
                    *dst = v;
                }
            }
            None => scratch.cranio_input.iter_mut().for_each(|v| *v = 0.0),
        }
        self.remap
            .cranio_to_retino(eye, &scratch.cranio_input, &mut scratch.retino_input);
        let visual = &scratch.retino_input;

        let pulse = match self.last_saccade {
            Some(last) if t - last < params.corollary_window_internal() => 1.0,
            _ => 0.0,
        };

        let ppc_in = layout.slice(y, P::PpcInput);
        let ppc_int = layout.slice(y, P::PpcInterneuron);
        let ppc_out = layout.slice(y, P::PpcOutput);
        let lip = layout.slice(y, P::Lip);
        let wm = layout.slice(y, P::WorkingMemory);
        let wm_int = layout.slice(y, P::WorkingMemoryInterneuron);
        let sef_mid = layout.slice(y, P::SefIntermediate);
        let sef_int = layout.slice(y, P::SefInterneuron);
        let sef_sel = layout.slice(y, P::SefSelection);
        let sef_out = layout.slice(y, P::SefOutput);
        let gate_up = layout.slice(y, P::SefAscendingGate);
        let gate_down = layout.slice(y, P::SefDescendingGate);
        let plan = layout.slice(y, P::FefPlan);
        let fef_int = layout.slice(y, P::FefInterneuron);
        let fef_out = layout.slice(y, P::FefOutput);
        let fef_post = layout.slice(y, P::FefPostsaccadic);
        let th_re = layout.slice(y, P::ThalamusRehearsal);
        let th_pl = layout.slice(y, P::ThalamusPlan);
        let sc = layout.slice(y, P::Colliculus);

        let post_total: f64 = fef_post.iter().map(|&v| pos(v)).sum();
        let fixation_signal = pos(ppc_out[fixation]);

        // Parietal cortex: on-centre off-surround competition over visual input
        let ppc_total: f64 = ppc_in.iter().map(|&v| pos(v)).sum();
        fill(dy, layout, P::PpcInput, |i| {
            let x = ppc_in[i];
            rates.parietal * (-x + (1.0 - x) * 2.0 * visual[i] - x * 0.5 * pos(ppc_int[i]))
        });
        fill(dy, layout, P::PpcInterneuron, |i| {
            rates.interneuron * (-ppc_int[i] + ppc_total - pos(ppc_in[i]))
        });
        fill(dy, layout, P::PpcOutput, |i| {
            let x = ppc_out[i];
            rates.parietal * (-x + (1.0 - x) * 2.0 * pos(ppc_in[i]) - x * 0.5 * pos(ppc_int[i]))
        });
        fill(dy, layout, P::Lip, |i| {
            let x = lip[i];
            rates.lip * (-x + (1.0 - x) * 2.0 * pos(ppc_out[i]) - x * 2.0 * post_total)
        });

        // Working memory loads craniotopic salience into the open rank
        for (i, s) in scratch.salience.iter_mut().enumerate() {
            *s = if i == fixation { 0.0 } else { pos(ppc_out[i]) };
        }
        self.remap
            .retino_to_cranio(eye, &scratch.salience, &mut scratch.cranio_salience);
        let load_gate = BasalGanglia::WORKING_MEMORY.gate(layout, y, 0);
        for (r, total) in scratch.rank_totals.iter_mut().enumerate() {
            *total = wm[r * cells..(r + 1) * cells].iter().map(|&v| pos(v)).sum();
        }

        let counting = &self.counting;
        let loading = self.options.working_memory;
        let stimulation = &self.stimulation;
        let crn = &scratch.cranio_salience;
        let noise = params.noise_std;
        let rng = &mut self.rng;
        fill(dy, layout, P::WorkingMemory, |q| {
            let x = wm[q];
            let load = if loading {
                counting[q / cells] * load_gate * crn[q % cells]
            } else {
                0.0
            };
            let excitation = 4.0 * load + 3.0 * sig(x, h) + stimulation.value(k, q);
            let drift = rates.working_memory
                * (-x + (1.0 - x) * excitation - x * 2.0 * pos(wm_int[q]));
            let z: f64 = rng.sample(StandardNormal);
            drift + noise * z
        });
        let rank_totals = &scratch.rank_totals;
        fill(dy, layout, P::WorkingMemoryInterneuron, |q| {
            rates.interneuron * (-wm_int[q] + rank_totals[q / cells] - pos(wm[q]))
        });

        // SEF: rank-graded rehearsal, winner-take-all selection, habituative gates
        for (f, &v) in scratch.selection_signal.iter_mut().zip(sef_sel) {
            *f = sig(v, h);
        }
        let selected = &scratch.selection_signal;
        let selected_total: f64 = selected.iter().sum();
        let gradient = params.rank_gradient;
        fill(dy, layout, P::SefIntermediate, |q| {
            let x = sef_mid[q];
            let rank_weight = 1.0 - gradient * (q / cells) as f64;
            rates.sef * (-x + (1.0 - x) * 2.0 * rank_weight * pos(th_re[q]) * gate_up[q])
        });
        fill(dy, layout, P::SefInterneuron, |q| {
            rates.interneuron * (-sef_int[q] + selected_total - selected[q])
        });
        fill(dy, layout, P::SefSelection, |q| {
            let x = sef_sel[q];
            let excitation = 2.0 * pos(sef_mid[q] - SEF_FLOOR) + 4.0 * selected[q];
            let inhibition = 12.0 * pos(sef_int[q]) + 6.0 * post_total;
            rates.sef * (-x + (1.0 - x) * excitation - x * inhibition)
        });
        let ranks = layout.ranks;
        fill(dy, layout, P::SefOutput, |i| {
            let x = sef_out[i];
            let drive: f64 = (0..ranks)
                .map(|r| pos(sef_sel[r * cells + i] - SEF_FLOOR))
                .sum();
            rates.sef * (-x + (1.0 - x) * 4.0 * drive)
        });
        fill(dy, layout, P::SefAscendingGate, |q| {
            let z = gate_up[q];
            let active = pos(sef_sel[q]);
            rates.ascending_gate_recovery * (1.0 - z)
                - z * (0.1 * active + 60.0 * post_total * active)
        });
        fill(dy, layout, P::SefDescendingGate, |i| {
            let z = gate_down[i];
            rates.descending_gate_recovery * (1.0 - z) - z * 0.2 * pos(sef_out[i])
        });

        // FEF: plans from LIP and remapped SEF output, gated through thalamus
        for (d, (&v, &g)) in scratch.sef_drive.iter_mut().zip(sef_out.iter().zip(gate_down)) {
            *d = pos(v) * g;
        }
        self.remap
            .cranio_to_retino(eye, &scratch.sef_drive, &mut scratch.retino_sef_drive);
        let sef_retinal = &scratch.retino_sef_drive;
        let plan_total: f64 = plan.iter().map(|&v| pos(v)).sum();
        fill(dy, layout, P::FefPlan, |i| {
            if i == fixation {
                return 0.0;
            }
            let x = plan[i];
            let excitation = 2.0 * pos(lip[i]) + 3.0 * sef_retinal[i];
            let inhibition = 4.0 * pos(fef_int[i]) + 4.0 * post_total;
            rates.fef * (-x + (1.0 - x) * excitation - x * inhibition)
        });
        fill(dy, layout, P::FefInterneuron, |i| {
            rates.interneuron * (-fef_int[i] + plan_total - pos(plan[i]))
        });
        fill(dy, layout, P::FefOutput, |i| {
            let x = fef_out[i];
            let inhibition = 2.0 * pos(fef_int[i]) + 4.0 * post_total;
            rates.fef * (-x + (1.0 - x) * 6.0 * pos(th_pl[i]) - x * inhibition)
        });
        let vector = self.saccade_vector;
        fill(dy, layout, P::FefPostsaccadic, |i| {
            let x = fef_post[i];
            let drive = if vector == Some(i) {
                COROLLARY_DRIVE * pulse
            } else {
                0.0
            };
            rates.postsaccadic * (-x + (1.0 - x) * drive)
        });

        // Basal ganglia
        let kappa = params.bg_kappa;
        let bg_rate = rates.basal_ganglia;
        let salience_total: f64 = scratch.salience.iter().sum();
        BasalGanglia::WORKING_MEMORY.derivatives(
            layout,
            y,
            dy,
            kappa,
            bg_rate,
            |_| salience_total,
            |_| 0.0,
        );
        BasalGanglia::REHEARSAL.derivatives(
            layout,
            y,
            dy,
            kappa,
            bg_rate,
            |_| pos(1.0 - 3.0 * fixation_signal),
            |_| fixation_signal,
        );
        BasalGanglia::PLAN.derivatives(
            layout,
            y,
            dy,
            kappa,
            bg_rate,
            |i| pos(plan[i]),
            |_| fixation_signal,
        );
        BasalGanglia::COLLICULUS.derivatives(
            layout,
            y,
            dy,
            kappa,
            bg_rate,
            |i| pos(fef_out[i]),
            |_| fixation_signal + post_total,
        );

        // Thalamus
        let rehearsal_gate = BasalGanglia::REHEARSAL.gate(layout, y, 0);
        fill(dy, layout, P::ThalamusRehearsal, |q| {
            let x = th_re[q];
            rates.thalamus * (-x + (1.0 - x) * 2.0 * rehearsal_gate * pos(wm[q]))
        });
        fill(dy, layout, P::ThalamusPlan, |i| {
            let x = th_pl[i];
            let gate = BasalGanglia::PLAN.gate(layout, y, i);
            rates.thalamus * (-x + (1.0 - x) * 2.0 * gate * pos(plan[i]))
        });

        // Superior colliculus
        for (f, &v) in scratch.colliculus_signal.iter_mut().zip(sc) {
            *f = sig(v, h);
        }
        let sc_signal = &scratch.colliculus_signal;
        let sc_total: f64 = sc_signal.iter().sum();
        fill(dy, layout, P::Colliculus, |i| {
            let x = sc[i];
            let gate = BasalGanglia::COLLICULUS.gate(layout, y, i);
            let excitation = 10.0 * pos(fef_out[i]) * gate;
            let inhibition = 6.0 * (sc_total - sc_signal[i])
                + 5.0 * post_total
                + 10.0 * pulse
                + 2.0 * fixation_signal;
            rates.colliculus * (-x + (1.0 - x) * excitation - x * inhibition)
        });
    }
}
