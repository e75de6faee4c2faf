//! Fixed sampling lattice shared by every MU density grid.
//!
//! Design
//! - `jaw` holds row centres, descending from the positive jaw edge of the
//!   leaf bank; one row per `resolution` band.
//! - `mlc` holds column centres, ascending from `-max_leaf_gap / 2` to
//!   `+max_leaf_gap / 2` inclusive.
//! - Leaf pairs are stacked along the jaw axis from the positive edge
//!   downwards. For every row the space precomputes which leaf pairs overlap
//!   the row band and over what extent, so silhouette binning never searches
//!   leaf boundaries per control point.
//!
//! The standard geometry (1 mm resolution, 80 × 5 mm leaf pairs, 400 mm
//! maximum leaf gap) is built once per process by [`GridSpace::standard`].
use crate::cache::{ContentHasher, ContentKey};
use crate::error::{QaError, QaResult};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::DensityGrid;

pub const DEFAULT_GRID_RESOLUTION_MM: f64 = 1.0;
pub const DEFAULT_MAX_LEAF_GAP_MM: f64 = 400.0;
pub const DEFAULT_LEAF_PAIR_WIDTH_MM: f64 = 5.0;
pub const DEFAULT_LEAF_PAIR_COUNT: usize = 80;

/// Physical constants a [`GridSpace`] is derived from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub resolution: f64,
    pub max_leaf_gap: f64,
    /// Leaf-pair widths ordered from the positive jaw edge downwards.
    pub leaf_pair_widths: Vec<f64>,
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_GRID_RESOLUTION_MM,
            max_leaf_gap: DEFAULT_MAX_LEAF_GAP_MM,
            leaf_pair_widths: vec![DEFAULT_LEAF_PAIR_WIDTH_MM; DEFAULT_LEAF_PAIR_COUNT],
        }
    }
}

impl GridGeometry {
    fn validate(&self) -> QaResult<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(QaError::config(format!(
                "grid resolution must be positive, got {}",
                self.resolution
            )));
        }
        if !(self.max_leaf_gap.is_finite() && self.max_leaf_gap >= 0.0) {
            return Err(QaError::config(format!(
                "max leaf gap must be non-negative, got {}",
                self.max_leaf_gap
            )));
        }
        if self.leaf_pair_widths.is_empty() {
            return Err(QaError::config("leaf layout has no leaf pairs"));
        }
        if let Some(w) = self
            .leaf_pair_widths
            .iter()
            .find(|w| !(w.is_finite() && **w > 0.0))
        {
            return Err(QaError::config(format!(
                "leaf pair widths must be positive, got {w}"
            )));
        }
        Ok(())
    }

    pub fn total_leaf_width(&self) -> f64 {
        self.leaf_pair_widths.iter().sum()
    }
}

/// Extent of one leaf pair along the jaw axis (`top > bottom`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafBand {
    pub top: f64,
    pub bottom: f64,
}

/// Portion of a grid row covered by one leaf pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowSpan {
    pub leaf: usize,
    pub lo: f64,
    pub hi: f64,
}

#[derive(Clone, Debug)]
pub struct GridSpace {
    geometry: GridGeometry,
    jaw: Vec<f64>,
    mlc: Vec<f64>,
    leaf_bands: Vec<LeafBand>,
    row_spans: Vec<Vec<RowSpan>>,
    key: ContentKey,
}

static STANDARD: OnceLock<GridSpace> = OnceLock::new();

impl GridSpace {
    /// Shared lattice for the standard leaf layout, computed on first use.
    pub fn standard() -> &'static GridSpace {
        STANDARD.get_or_init(|| Self::build(GridGeometry::default()))
    }

    /// Build a lattice for an explicit geometry.
    pub fn new(geometry: GridGeometry) -> QaResult<Self> {
        geometry.validate()?;
        Ok(Self::build(geometry))
    }

    fn build(geometry: GridGeometry) -> Self {
        let res = geometry.resolution;
        let total = geometry.total_leaf_width();
        let half_total = total / 2.0;

        let rows = ((total / res) - 1e-9).ceil().max(0.0) as usize;
        let jaw: Vec<f64> = (0..rows)
            .map(|r| half_total - res * (r as f64 + 0.5))
            .collect();

        let half_gap = geometry.max_leaf_gap / 2.0;
        let cols = ((geometry.max_leaf_gap / res) + 1e-9).floor() as usize + 1;
        let mlc: Vec<f64> = (0..cols).map(|c| -half_gap + res * c as f64).collect();

        let mut leaf_bands = Vec::with_capacity(geometry.leaf_pair_widths.len());
        let mut top = half_total;
        for &w in &geometry.leaf_pair_widths {
            leaf_bands.push(LeafBand {
                top,
                bottom: top - w,
            });
            top -= w;
        }

        let row_spans = jaw
            .iter()
            .map(|&centre| {
                let row_hi = centre + res / 2.0;
                let row_lo = centre - res / 2.0;
                leaf_bands
                    .iter()
                    .enumerate()
                    .filter_map(|(leaf, band)| {
                        let hi = row_hi.min(band.top);
                        let lo = row_lo.max(band.bottom);
                        (hi > lo).then_some(RowSpan { leaf, lo, hi })
                    })
                    .collect()
            })
            .collect();

        let mut hasher = ContentHasher::new();
        hasher.write_f64(res);
        hasher.write_f64(geometry.max_leaf_gap);
        hasher.write_f64s(&geometry.leaf_pair_widths);
        let key = hasher.finish();

        Self {
            geometry,
            jaw,
            mlc,
            leaf_bands,
            row_spans,
            key,
        }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Row centres along the jaw axis (descending).
    pub fn jaw(&self) -> &[f64] {
        &self.jaw
    }

    /// Column centres along the MLC axis (ascending).
    pub fn mlc(&self) -> &[f64] {
        &self.mlc
    }

    pub fn resolution(&self) -> f64 {
        self.geometry.resolution
    }

    /// `(rows, cols)` of every grid on this space.
    pub fn shape(&self) -> (usize, usize) {
        (self.jaw.len(), self.mlc.len())
    }

    pub fn leaf_pair_count(&self) -> usize {
        self.leaf_bands.len()
    }

    pub fn leaf_bands(&self) -> &[LeafBand] {
        &self.leaf_bands
    }

    pub fn row_spans(&self, row: usize) -> &[RowSpan] {
        &self.row_spans[row]
    }

    pub(crate) fn content_key(&self) -> ContentKey {
        self.key
    }

    /// All-zero grid aligned to this space.
    pub fn zeros(&self) -> DensityGrid {
        DensityGrid::new(self.mlc.len(), self.jaw.len())
    }

    /// True when `grid` has this space's shape.
    pub fn fits(&self, grid: &DensityGrid) -> bool {
        grid.h == self.jaw.len() && grid.w == self.mlc.len()
    }
}
