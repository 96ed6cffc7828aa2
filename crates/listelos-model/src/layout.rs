// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Field Layout
//!
//! Every population of the network lives in one flat state vector. The layout
//! records, in a fixed order, each population's size, initial value and
//! contiguous `[start, end)` range. Derivatives are written in the same order.
//!
//! Per-rank populations are rank-major: element `(cell, rank)` sits at
//! `start + rank × cells + cell`.

use std::ops::Range;

use ahash::AHashMap;
use serde::Serialize;

use crate::types::{ModelError, Result};

/// Shape of a population relative to the spatial field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationShape {
    /// One value per spatial cell
    PerLocation,
    /// One value per spatial cell per ordinal rank
    PerLocationPerRank,
    /// A single basal-ganglia node
    Scalar,
}

macro_rules! populations {
    ($( $id:ident => $name:literal, $shape:ident, $init:expr; )*) => {
        /// Every population of the network, in state-vector order
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PopulationId {
            $( $id, )*
        }

        impl PopulationId {
            /// All populations in layout order
            pub const ALL: &'static [PopulationId] = &[ $( PopulationId::$id, )* ];

            /// Stable external name used by analysis collaborators
            pub fn name(self) -> &'static str {
                match self {
                    $( PopulationId::$id => $name, )*
                }
            }

            pub fn shape(self) -> PopulationShape {
                match self {
                    $( PopulationId::$id => PopulationShape::$shape, )*
                }
            }

            pub fn initial_value(self) -> f64 {
                match self {
                    $( PopulationId::$id => $init, )*
                }
            }
        }
    };
}

populations! {
    // Parietal cortex
    PpcInput => "ppc_input", PerLocation, 0.0;
    PpcInterneuron => "ppc_interneuron", PerLocation, 0.0;
    PpcOutput => "ppc_output", PerLocation, 0.0;
    Lip => "lip", PerLocation, 0.0;
    // Prefrontal item-order-rank working memory
    WorkingMemory => "pfc_working_memory", PerLocationPerRank, 0.0;
    WorkingMemoryInterneuron => "pfc_interneuron", PerLocationPerRank, 0.0;
    // Supplementary eye field
    SefIntermediate => "sef_intermediate", PerLocationPerRank, 0.0;
    SefInterneuron => "sef_interneuron", PerLocationPerRank, 0.0;
    SefSelection => "sef_selection", PerLocationPerRank, 0.0;
    SefOutput => "sef_output", PerLocation, 0.0;
    SefAscendingGate => "sef_ascending_gate", PerLocationPerRank, 1.0;
    SefDescendingGate => "sef_descending_gate", PerLocation, 1.0;
    // Frontal eye field
    FefPlan => "fef_plan", PerLocation, 0.0;
    FefInterneuron => "fef_interneuron", PerLocation, 0.0;
    FefOutput => "fef_output", PerLocation, 0.0;
    FefPostsaccadic => "fef_postsaccadic", PerLocation, 0.0;
    // Basal ganglia: working-memory gating
    BgWmDirect => "bg_wm_direct", Scalar, 0.0;
    BgWmIndirect => "bg_wm_indirect", Scalar, 0.0;
    BgWmGaba => "bg_wm_gaba", Scalar, 1.0;
    BgWmNigral => "bg_wm_nigral", Scalar, 0.5;
    // Basal ganglia: rehearsal gating
    BgRehearsalDirect => "bg_rehearsal_direct", Scalar, 0.0;
    BgRehearsalIndirect => "bg_rehearsal_indirect", Scalar, 0.0;
    BgRehearsalGaba => "bg_rehearsal_gaba", Scalar, 1.0;
    BgRehearsalNigral => "bg_rehearsal_nigral", Scalar, 0.5;
    // Basal ganglia: FEF plan gating
    BgFefDirect => "bg_fef_direct", PerLocation, 0.0;
    BgFefIndirect => "bg_fef_indirect", PerLocation, 0.0;
    BgFefGaba => "bg_fef_gaba", PerLocation, 1.0;
    BgFefNigral => "bg_fef_nigral", PerLocation, 0.5;
    // Basal ganglia: colliculus gating
    BgScDirect => "bg_sc_direct", PerLocation, 0.0;
    BgScIndirect => "bg_sc_indirect", PerLocation, 0.0;
    BgScGaba => "bg_sc_gaba", PerLocation, 1.0;
    BgScNigral => "bg_sc_nigral", PerLocation, 0.5;
    // Thalamus
    ThalamusRehearsal => "thalamus_rehearsal", PerLocationPerRank, 0.0;
    ThalamusPlan => "thalamus_plan", PerLocation, 0.0;
    // Superior colliculus
    Colliculus => "superior_colliculus", PerLocation, 0.0;
}

/// One population's placement in the state vector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Population {
    pub name: &'static str,
    pub shape: PopulationShape,
    pub size: usize,
    pub initial: f64,
    pub start: usize,
    pub end: usize,
    #[serde(skip)]
    pub id: PopulationId,
}

impl Population {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Ordered population layout for one trial
#[derive(Debug, Clone, Serialize)]
pub struct FieldLayout {
    pub width: usize,
    pub height: usize,
    pub ranks: usize,
    populations: Vec<Population>,
    len: usize,
    #[serde(skip)]
    by_name: AHashMap<&'static str, usize>,
}

impl FieldLayout {
    /// Build the layout for a `width x height` field with `ranks` rank slots
    ///
    /// # Errors
    /// Returns `ModelError::InvalidDimensions` if any dimension is zero.
    pub fn build(width: usize, height: usize, ranks: usize) -> Result<Self> {
        if width == 0 || height == 0 || ranks == 0 {
            return Err(ModelError::InvalidDimensions(format!(
                "field {}x{} with {} ranks",
                width, height, ranks
            )));
        }

        let cells = width * height;
        let mut populations = Vec::with_capacity(PopulationId::ALL.len());
        let mut by_name = AHashMap::with_capacity(PopulationId::ALL.len());
        let mut offset = 0;

        for &id in PopulationId::ALL {
            let size = match id.shape() {
                PopulationShape::PerLocation => cells,
                PopulationShape::PerLocationPerRank => cells * ranks,
                PopulationShape::Scalar => 1,
            };
            by_name.insert(id.name(), populations.len());
            populations.push(Population {
                name: id.name(),
                shape: id.shape(),
                size,
                initial: id.initial_value(),
                start: offset,
                end: offset + size,
                id,
            });
            offset += size;
        }

        Ok(Self {
            width,
            height,
            ranks,
            populations,
            len: offset,
            by_name,
        })
    }

    /// Number of spatial cells
    pub fn cells(&self) -> usize {
        self.width * self.height
    }

    /// Total state vector length
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn populations(&self) -> &[Population] {
        &self.populations
    }

    /// Look up a population by its external name
    pub fn get(&self, name: &str) -> Option<&Population> {
        self.by_name.get(name).map(|&i| &self.populations[i])
    }

    /// State-vector range of a population
    #[inline]
    pub fn range(&self, id: PopulationId) -> Range<usize> {
        self.populations[id as usize].range()
    }

    /// Borrow one population out of a full state vector
    #[inline]
    pub fn slice<'a>(&self, state: &'a [f64], id: PopulationId) -> &'a [f64] {
        &state[self.range(id)]
    }

    /// Initial state vector
    pub fn initial_state(&self) -> Vec<f64> {
        let mut state = Vec::with_capacity(self.len);
        for population in &self.populations {
            state.extend(std::iter::repeat(population.initial).take(population.size));
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(layout: &FieldLayout) {
        let mut expected_start = 0;
        for population in layout.populations() {
            assert_eq!(population.start, expected_start, "{} has a gap", population.name);
            assert_eq!(population.end - population.start, population.size);
            expected_start = population.end;
        }
        assert_eq!(expected_start, layout.len());
    }

    #[test]
    fn test_ranges_partition_vector() {
        for (w, h, r) in [(9, 9, 4), (1, 1, 1), (5, 3, 2), (7, 11, 6)] {
            let layout = FieldLayout::build(w, h, r).unwrap();
            assert_partition(&layout);
        }
    }

    #[test]
    fn test_default_layout_size() {
        let layout = FieldLayout::build(9, 9, 4).unwrap();
        // 20 per-location, 7 per-location-per-rank and 8 scalar populations
        assert_eq!(layout.len(), 20 * 81 + 7 * 81 * 4 + 8);
        assert_eq!(layout.populations().len(), 35);
    }

    #[test]
    fn test_enum_order_matches_layout() {
        let layout = FieldLayout::build(3, 3, 2).unwrap();
        for (i, &id) in PopulationId::ALL.iter().enumerate() {
            assert_eq!(id as usize, i);
            assert_eq!(layout.populations()[i].id, id);
        }
    }

    #[test]
    fn test_initial_state_values() {
        let layout = FieldLayout::build(9, 9, 4).unwrap();
        let state = layout.initial_state();
        assert_eq!(state.len(), layout.len());
        assert!(layout.slice(&state, PopulationId::SefAscendingGate).iter().all(|&v| v == 1.0));
        assert!(layout.slice(&state, PopulationId::BgScNigral).iter().all(|&v| v == 0.5));
        assert!(layout.slice(&state, PopulationId::WorkingMemory).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_lookup_by_name() {
        let layout = FieldLayout::build(9, 9, 4).unwrap();
        let sc = layout.get("superior_colliculus").unwrap();
        assert_eq!(sc.range(), layout.range(PopulationId::Colliculus));
        assert_eq!(sc.end, layout.len());
        assert!(layout.get("cerebellum").is_none());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            FieldLayout::build(0, 9, 4),
            Err(ModelError::InvalidDimensions(_))
        ));
        assert!(FieldLayout::build(9, 9, 0).is_err());
    }

    #[test]
    fn test_deterministic_build() {
        let a = FieldLayout::build(6, 4, 3).unwrap();
        let b = FieldLayout::build(6, 4, 3).unwrap();
        assert_eq!(a.populations(), b.populations());
    }
}
