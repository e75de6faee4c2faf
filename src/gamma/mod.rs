//! Gamma index between two MU density grids.
//!
//! Overview
//! - For every reference cell above the dose cutoff the comparator searches
//!   the evaluation grid on concentric shells around the cell centre
//!   ([`sampling::search_pattern`]), sampling evaluation values bilinearly.
//! - Each probe scores `sqrt((Δ / dose_tol)² + (r / distance)²)`; the cell's
//!   gamma is the minimum over probes, capped at `max_gamma`.
//! - Probes are visited by increasing radius, so the search ends once the
//!   distance term alone exceeds the best score.
//!
//! Cells that were not evaluated hold NaN in [`GammaResult::grid`].
pub mod options;
pub(crate) mod sampling;
pub mod summary;

pub use options::GammaOptions;
pub use summary::GammaSummary;

use crate::error::{QaError, QaResult};
use crate::grid::{DensityGrid, GridSpace, GridView, GridViewMut};
use log::debug;
use sampling::{bilinear, search_pattern, Probe};
use serde::Serialize;

/// Gamma values per reference cell (NaN where not evaluated) and summary.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaResult {
    pub grid: DensityGrid,
    pub summary: GammaSummary,
}

impl GammaResult {
    /// Gamma at column `x`, row `y`; `None` when the cell was not evaluated.
    pub fn value(&self, x: usize, y: usize) -> Option<f32> {
        let g = self.grid.get(x, y);
        (!g.is_nan()).then_some(g)
    }
}

/// Gamma comparison bound to a grid space and a validated option set.
#[derive(Clone, Debug)]
pub struct GammaComparator<'a> {
    space: &'a GridSpace,
    options: GammaOptions,
    pattern: Vec<Probe>,
}

impl<'a> GammaComparator<'a> {
    pub fn new(space: &'a GridSpace, options: GammaOptions) -> QaResult<Self> {
        options.validate()?;
        let step = options.distance_mm_threshold / options.interp_fraction as f32;
        let max_radius = options.distance_mm_threshold * options.max_gamma;
        let pattern = search_pattern(step, max_radius, options.distance_mm_threshold);
        debug!(
            "GammaComparator: step={:.3}mm radius={:.3}mm probes={}",
            step,
            max_radius,
            pattern.len()
        );
        Ok(Self {
            space,
            options,
            pattern,
        })
    }

    pub fn options(&self) -> &GammaOptions {
        &self.options
    }

    pub fn space(&self) -> &GridSpace {
        self.space
    }

    pub fn compare(&self, reference: &DensityGrid, evaluation: &DensityGrid) -> QaResult<GammaResult> {
        if !reference.same_shape(evaluation) {
            return Err(QaError::shape(format!(
                "gamma needs equal shapes, got {:?} and {:?}",
                reference.shape(),
                evaluation.shape()
            )));
        }
        if !self.space.fits(reference) {
            return Err(QaError::shape(format!(
                "grid shape {:?} does not match grid space {:?}",
                reference.shape(),
                self.space.shape()
            )));
        }

        let opts = &self.options;
        let reference_max = reference.max();
        let global_basis = opts.global_dose_basis(reference_max)?;
        let cutoff_basis = global_basis.unwrap_or(reference_max);
        let cutoff = opts.lower_percent_dose_cutoff / 100.0 * cutoff_basis;
        let zero_floor = f32::EPSILON * reference_max.abs().max(1.0);
        let dose_fraction = opts.dose_percent_threshold / 100.0;
        let max_sq = opts.max_gamma * opts.max_gamma;
        let px_per_mm = (1.0 / self.space.resolution()) as f32;

        let mut out = DensityGrid::from_vec(
            reference.w,
            reference.h,
            vec![f32::NAN; reference.w * reference.h],
        )?;
        let mut probes_used = 0usize;

        for (y, ref_row) in reference.rows().enumerate() {
            let out_row = out.row_mut(y);
            for (x, &v) in ref_row.iter().enumerate() {
                if !(v > zero_floor) || v < cutoff {
                    continue;
                }
                let dose_tol = dose_fraction * global_basis.unwrap_or(v);
                let mut best_sq = max_sq;
                for probe in &self.pattern {
                    if probe.dist_sq >= best_sq {
                        break;
                    }
                    probes_used += 1;
                    // jaw axis is descending, so +dy moves up one row per mm
                    let ex = x as f32 + probe.dx * px_per_mm;
                    let ey = y as f32 - probe.dy * px_per_mm;
                    let Some(e) = bilinear(evaluation, ex, ey) else {
                        continue;
                    };
                    let dose_term = (e - v) / dose_tol;
                    let g_sq = dose_term * dose_term + probe.dist_sq;
                    if g_sq < best_sq {
                        best_sq = g_sq;
                    }
                }
                out_row[x] = best_sq.sqrt().min(opts.max_gamma);
            }
        }

        let summary = GammaSummary::from_grid(&out);
        debug!(
            "GammaComparator: evaluated={} passed={} probes={} cutoff={:.4}",
            summary.evaluated, summary.passed, probes_used, cutoff
        );
        Ok(GammaResult { grid: out, summary })
    }
}

/// Gamma of two grids on the standard grid space.
pub fn gamma(
    reference: &DensityGrid,
    evaluation: &DensityGrid,
    options: &GammaOptions,
) -> QaResult<GammaResult> {
    GammaComparator::new(GridSpace::standard(), options.clone())?.compare(reference, evaluation)
}
