// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Input and Stimulation Signals
//!
//! Both signals are precomputed once per trial on the integration sample grid
//! and are read-only during integration. All times here are internal units.
//!
//! - **Cue input**: `(samples + 1) x cells`, binary. A cue is on from its onset
//!   sample through its offset sample inclusive; an onset after the offset
//!   yields no input.
//! - **Stimulation**: a peak-normalised Gaussian centred on the stimulation
//!   site, scaled by strength, active between onset and offset. It drives
//!   every rank slot identically.

use ndarray::{Array2, ArrayView1};

/// Fixed-step sampling of a trial
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGrid {
    step: f64,
    samples: usize,
}

impl SampleGrid {
    /// Grid covering `[0, duration]` with the given step (internal units)
    pub fn new(step: f64, duration: f64) -> Self {
        Self {
            step,
            samples: (duration / step).round() as usize,
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of integration steps; rows of sampled signals are `samples + 1`
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Nearest sample for a scheduled time
    pub fn sample_of(&self, time: f64) -> usize {
        (time / self.step).round().max(0.0) as usize
    }

    /// Executed sample containing `t`, floored and clamped to the grid
    ///
    /// A small tolerance keeps grid-aligned times from flooring to the
    /// previous sample through rounding error.
    #[inline]
    pub fn index_of(&self, t: f64) -> usize {
        let k = (t / self.step + 1e-9).floor().max(0.0) as usize;
        k.min(self.samples)
    }
}

/// Binary cue input matrix
#[derive(Debug, Clone)]
pub struct InputSignal {
    values: Array2<f64>,
    onsets: Vec<usize>,
}

impl InputSignal {
    /// Build the cue matrix
    ///
    /// `locations` are 0-based cells; `onsets`/`offsets` are internal times.
    /// Slices must have equal length (validated upstream).
    pub fn build(
        grid: &SampleGrid,
        cells: usize,
        locations: &[usize],
        onsets: &[f64],
        offsets: &[f64],
    ) -> Self {
        let rows = grid.samples() + 1;
        let mut values = Array2::zeros((rows, cells));
        let mut onset_samples = Vec::with_capacity(locations.len());

        for ((&location, &on), &off) in locations.iter().zip(onsets).zip(offsets) {
            let first = grid.sample_of(on);
            let last = grid.sample_of(off).min(grid.samples());
            onset_samples.push(first);
            for k in first..=last {
                values[[k, location]] = 1.0;
            }
        }

        Self {
            values,
            onsets: onset_samples,
        }
    }

    /// Onset sample of each cue, in schedule order
    pub fn onset_samples(&self) -> &[usize] {
        &self.onsets
    }

    /// Input row for sample `k`
    #[inline]
    pub fn sample(&self, k: usize) -> ArrayView1<'_, f64> {
        self.values.row(k)
    }

    #[inline]
    pub fn value(&self, k: usize, cell: usize) -> f64 {
        self.values[[k, cell]]
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

/// Square Gaussian kernel of side `size`, peak value 1 at index `size / 2`
pub fn gaussian_kernel(size: usize, spread: f64) -> Array2<f64> {
    let centre = (size / 2) as f64;
    let denom = 2.0 * spread * spread;
    Array2::from_shape_fn((size, size), |(i, j)| {
        let di = i as f64 - centre;
        let dj = j as f64 - centre;
        (-(di * di + dj * dj) / denom).exp()
    })
}

/// Microstimulation drive
#[derive(Debug, Clone)]
pub struct StimulationSignal {
    values: Array2<f64>,
    cells: usize,
}

impl StimulationSignal {
    /// Build the stimulation matrix
    ///
    /// `site` is a 0-based cell in a column-major `width x height` field, so
    /// row = site mod height and column = site div height. The kernel side is
    /// three times the longer field dimension, which keeps the peak alignable
    /// on any cell.
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        grid: &SampleGrid,
        width: usize,
        height: usize,
        site: usize,
        onset: f64,
        offset: f64,
        spread: f64,
        strength: f64,
    ) -> Self {
        let cells = width * height;
        let rows = grid.samples() + 1;
        let mut values = Array2::zeros((rows, cells));

        let first = grid.sample_of(onset);
        let last = grid.sample_of(offset).min(grid.samples());
        if strength != 0.0 && first <= last {
            let pattern = Self::spatial_pattern(width, height, site, spread, strength);
            for k in first..=last {
                values.row_mut(k).assign(&pattern);
            }
        }

        Self { values, cells }
    }

    /// Peak-aligned, strength-scaled Gaussian over the field
    pub fn spatial_pattern(
        width: usize,
        height: usize,
        site: usize,
        spread: f64,
        strength: f64,
    ) -> ndarray::Array1<f64> {
        let size = 3 * width.max(height);
        let kernel = gaussian_kernel(size, spread);
        let centre = size / 2;
        let site_row = site % height;
        let site_col = site / height;

        let mut pattern = ndarray::Array1::zeros(width * height);
        for col in 0..width {
            for row in 0..height {
                let kr = centre + row - site_row;
                let kc = centre + col - site_col;
                pattern[col * height + row] = strength * kernel[[kr, kc]];
            }
        }
        pattern
    }

    /// Drive for state element `q` of a per-rank population at sample `k`
    #[inline]
    pub fn value(&self, k: usize, q: usize) -> f64 {
        self.values[[k, q % self.cells]]
    }

    /// Spatial drive at sample `k`, shared by all ranks
    pub fn sample(&self, k: usize) -> ArrayView1<'_, f64> {
        self.values.row(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> SampleGrid {
        // 1 s at 1 ms, in internal units
        SampleGrid::new(0.01, 10.0)
    }

    #[test]
    fn test_grid_indexing() {
        let g = grid();
        assert_eq!(g.samples(), 1000);
        assert_eq!(g.index_of(0.0), 0);
        assert_eq!(g.index_of(0.005), 0);
        assert_eq!(g.index_of(0.03), 3);
        assert_eq!(g.index_of(50.0), 1000);
        assert_eq!(g.sample_of(5.0), 500);
    }

    #[test]
    fn test_cue_inclusive_window() {
        let g = grid();
        let input = InputSignal::build(&g, 81, &[37], &[1.0], &[2.0]);
        assert_eq!(input.value(99, 37), 0.0);
        assert_eq!(input.value(100, 37), 1.0);
        assert_eq!(input.value(200, 37), 1.0);
        assert_eq!(input.value(201, 37), 0.0);
        assert_eq!(input.onset_samples(), &[100]);
    }

    #[test]
    fn test_onset_after_offset_is_empty() {
        let g = grid();
        let input = InputSignal::build(&g, 81, &[13], &[6.0], &[4.0]);
        assert!(input.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_cues_superimpose_by_location() {
        let g = grid();
        let input = InputSignal::build(&g, 81, &[40, 13, 40], &[0.0, 1.0, 3.0], &[2.0, 2.0, 4.0]);
        let row = input.sample(150);
        assert_eq!(row[40], 1.0);
        assert_eq!(row[13], 1.0);
        assert_eq!(row.sum(), 2.0);
        assert_eq!(input.sample(350).sum(), 1.0);
    }

    #[test]
    fn test_offset_beyond_duration_clamped() {
        let g = grid();
        let input = InputSignal::build(&g, 4, &[2], &[9.0], &[20.0]);
        assert_eq!(input.value(1000, 2), 1.0);
        assert_eq!(input.values().nrows(), 1001);
    }

    #[test]
    fn test_kernel_peak_normalised() {
        let kernel = gaussian_kernel(27, 1.5);
        assert_eq!(kernel[[13, 13]], 1.0);
        assert!(kernel.iter().all(|&v| v <= 1.0 && v > 0.0));
        assert!((kernel[[12, 13]] - kernel[[13, 14]]).abs() < 1e-15);
    }

    #[test]
    fn test_stimulation_peak_lands_on_site() {
        for site in [0usize, 8, 40, 72, 80] {
            let pattern = StimulationSignal::spatial_pattern(9, 9, site, 1.0, 0.8);
            let (argmax, max) = pattern
                .iter()
                .enumerate()
                .fold((0, f64::MIN), |acc, (i, &v)| if v > acc.1 { (i, v) } else { acc });
            assert_eq!(argmax, site);
            assert!((max - 0.8).abs() < 1e-12);
        }
    }

    #[test]
    fn test_stimulation_non_square_field() {
        // 4 wide, 3 high: site 7 is row 1, column 2
        let pattern = StimulationSignal::spatial_pattern(4, 3, 7, 0.7, 1.0);
        assert_eq!(pattern[7], 1.0);
        let neighbour_row = pattern[6];
        let neighbour_col = pattern[4];
        assert!((neighbour_row - neighbour_col).abs() < 1e-15);
    }

    #[test]
    fn test_stimulation_replicated_across_ranks() {
        let g = grid();
        let stim = StimulationSignal::build(&g, 9, 9, 22, 1.0, 2.0, 1.0, 0.5);
        for q in 0..81 {
            for rank in 1..4 {
                assert_eq!(stim.value(150, q), stim.value(150, q + rank * 81));
            }
        }
        assert_eq!(stim.value(150, 22), 0.5);
        assert_eq!(stim.value(99, 22), 0.0);
        assert_eq!(stim.value(201, 22), 0.0);
    }

    #[test]
    fn test_zero_strength_stimulation_is_silent() {
        let g = grid();
        let stim = StimulationSignal::build(&g, 9, 9, 40, 0.0, 10.0, 1.0, 0.0);
        assert!(stim.sample(500).iter().all(|&v| v == 0.0));
    }
}
