// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Gaze Remapping
//!
//! Shift operators between the retinotopic (eye-centred) and craniotopic
//! (head-centred) frames. For eye position `p` and fixation reference `f`,
//! the retinotopic→craniotopic operator is the diagonal shift with offset
//! `f − p`:
//!
//! ```text
//! cranio[i] = retino[i − (p − f)]
//! retino[i] = cranio[i + (p − f)]
//! ```
//!
//! Cells shifted in from outside the field read as zero. The operators are
//! applied by index arithmetic; no operator matrices are materialised.
//!
//! When the fixation reference is the centre cell (`2f = cells − 1`,
//! 0-based), the craniotopic→retinotopic operator at `p` equals the
//! retinotopic→craniotopic operator at the mirror position `cells − 1 − p`.

/// Remap operator family for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remap {
    cells: usize,
    fixation: usize,
}

impl Remap {
    /// `fixation` is the 0-based reference cell
    pub fn new(cells: usize, fixation: usize) -> Self {
        assert!(fixation < cells, "fixation {} outside field of {} cells", fixation, cells);
        Self { cells, fixation }
    }

    pub fn cells(&self) -> usize {
        self.cells
    }

    pub fn fixation(&self) -> usize {
        self.fixation
    }

    /// Displacement of the eye from the fixation reference
    ///
    /// # Panics
    /// An eye position outside the field is a programming error.
    #[inline]
    pub fn displacement(&self, eye: usize) -> isize {
        assert!(
            eye < self.cells,
            "eye position {} outside field of {} cells",
            eye,
            self.cells
        );
        eye as isize - self.fixation as isize
    }

    /// Retinotopic → craniotopic at eye position `eye`
    pub fn retino_to_cranio(&self, eye: usize, retino: &[f64], cranio: &mut [f64]) {
        let d = self.displacement(eye);
        shift(retino, cranio, d);
    }

    /// Craniotopic → retinotopic at eye position `eye`
    pub fn cranio_to_retino(&self, eye: usize, cranio: &[f64], retino: &mut [f64]) {
        let d = self.displacement(eye);
        shift(cranio, retino, -d);
    }

    /// Craniotopic cell of a one-hot retinotopic vector at `retinal`
    ///
    /// Returns `None` when the target falls outside the field.
    pub fn target_of(&self, eye: usize, retinal: usize) -> Option<usize> {
        let target = retinal as isize + self.displacement(eye);
        (0..self.cells as isize)
            .contains(&target)
            .then_some(target as usize)
    }
}

/// `output[i] = input[i − offset]`, zero where out of range
fn shift(input: &[f64], output: &mut [f64], offset: isize) {
    debug_assert_eq!(input.len(), output.len());
    let n = input.len() as isize;
    for (i, out) in output.iter_mut().enumerate() {
        let j = i as isize - offset;
        *out = if (0..n).contains(&j) { input[j as usize] } else { 0.0 };
    }
}
