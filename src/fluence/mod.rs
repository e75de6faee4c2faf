//! MU density accumulation.
//!
//! Overview
//! - Meterset 0 (the MU already on the counter at the first control point)
//!   is delivered through the static aperture of control point 0.
//! - Meterset `i > 0` is delivered while the aperture moves linearly from
//!   control point `i - 1` to `i`. The move is split into equal sub-steps so
//!   that no leaf or jaw travels more than `resolution / MIN_STEPS_PER_PIXEL`
//!   per step; each sub-step deposits an equal share of the meterset at its
//!   midpoint aperture.
//! - Silhouettes are binned by exact pixel overlap in the `aperture` module.
//! - Travel beyond the lattice extent counts as the extent when choosing the
//!   sub-step count.
//!
//! Grids from several records over the same space are summed elementwise by
//! [`mudensity_batch`]; an empty record contributes an all-zero grid.

pub(crate) mod aperture;

use crate::delivery::{metersets, DeliveryRecord, GantryMask};
use crate::error::{QaError, QaResult};
use crate::grid::{DensityGrid, GridSpace};
use aperture::{deposit, Aperture};
use log::debug;

/// Sub-steps per pixel width of leaf travel between control points.
pub const MIN_STEPS_PER_PIXEL: f64 = 10.0;

fn ensure_layout(record: &DeliveryRecord, space: &GridSpace) -> QaResult<()> {
    if record.leaf_pair_count() != space.leaf_pair_count() {
        return Err(QaError::shape(format!(
            "record has {} leaf pairs, grid layout expects {}",
            record.leaf_pair_count(),
            space.leaf_pair_count()
        )));
    }
    Ok(())
}

fn substep_count(travel: f64, space: &GridSpace) -> usize {
    let geometry = space.geometry();
    let extent = 2.0 * geometry.max_leaf_gap.max(geometry.total_leaf_width());
    let steps = (travel.min(extent) * MIN_STEPS_PER_PIXEL / space.resolution()).ceil();
    if steps.is_finite() && steps >= 1.0 {
        steps as usize
    } else {
        1
    }
}

/// MU density of one record on `space`.
pub fn mudensity(record: &DeliveryRecord, space: &GridSpace) -> QaResult<DensityGrid> {
    let mut grid = space.zeros();
    if record.is_empty() {
        return Ok(grid);
    }
    ensure_layout(record, space)?;
    let weights = metersets(record)?;
    let mlc = record.mlc();
    let jaw = record.jaw();

    if weights[0] > 0.0 {
        deposit(space, &mut grid, &mlc[0], jaw[0], weights[0]);
    }

    let mut scratch = Aperture::new(&mlc[0], jaw[0]);
    let mut total_steps = 0usize;
    for i in 1..record.len() {
        let weight = weights[i];
        if weight == 0.0 {
            continue;
        }
        let from = (mlc[i - 1].as_slice(), jaw[i - 1]);
        let to = (mlc[i].as_slice(), jaw[i]);
        let steps = substep_count(Aperture::max_travel(from, to), space);
        let step_weight = weight / steps as f64;
        for k in 0..steps {
            let t = (k as f64 + 0.5) / steps as f64;
            scratch.interpolate_into(from, to, t);
            scratch.deposit(space, &mut grid, step_weight);
        }
        total_steps += steps;
    }

    debug!(
        "mudensity: {} control points, {:.3} MU, {} sub-steps",
        record.len(),
        record.total_mu(),
        total_steps
    );
    Ok(grid)
}

/// Elementwise sum of the MU densities of `records`.
///
/// An empty slice yields the zero grid. The result does not depend on the
/// order of `records` beyond floating-point rounding.
pub fn mudensity_batch(records: &[DeliveryRecord], space: &GridSpace) -> QaResult<DensityGrid> {
    let mut total = space.zeros();
    for record in records {
        total.accumulate(&mudensity(record, space)?)?;
    }
    Ok(total)
}

/// One grid per target angle of `mask`, each from its rebased segment.
pub fn segment_mudensities(
    record: &DeliveryRecord,
    mask: &GantryMask,
    space: &GridSpace,
) -> QaResult<Vec<DensityGrid>> {
    mask.split_by_angle(record)?
        .iter()
        .map(|segment| mudensity(segment, space))
        .collect()
}
