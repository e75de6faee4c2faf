//! Gantry-angle masking of delivery records.
//!
//! A mask is a pure selection: (target angles, tolerance) → the control
//! points whose gantry angle lies within `tolerance` degrees of any target,
//! measured around the circle so that 359° and 1° are 2° apart.
//!
//! Tolerance policy
//! - [`GantryMask::single`] uses [`UNBOUNDED_TOLERANCE_DEG`], which admits
//!   every control point; a single-angle caller gets "no masking" unless it
//!   sets a tolerance with [`GantryMask::with_tolerance`].
//! - [`GantryMask::for_angles`] derives the tolerance from the targets via
//!   [`gantry_tolerance_from_angles`]: half the smallest separation less
//!   [`DERIVED_TOLERANCE_MARGIN_DEG`], so neighbouring windows are disjoint
//!   even at the midpoint.
//!
//! MU policy
//! - [`GantryMask::mask`] keeps cumulative MU as recorded.
//! - [`GantryMask::masked_delivery`] and [`GantryMask::split_by_angle`]
//!   start MU at the first kept control point (0 unless it is control point 0)
//!   and drop the MU delivered while the gantry was outside the windows;
//!   these feed MU density.
use crate::angle::{circular_distance, min_separation, normalize_degrees};
use crate::error::{QaError, QaResult};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::DeliveryRecord;

/// Default tolerance for a single target angle. Larger than any circular
/// distance (max 180°), so every control point is selected.
pub const UNBOUNDED_TOLERANCE_DEG: f64 = 500.0;

/// Subtracted from half the target spacing when deriving a tolerance.
pub const DERIVED_TOLERANCE_MARGIN_DEG: f64 = 0.01;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawGantryMask")]
pub struct GantryMask {
    target_angles: Vec<f64>,
    tolerance: f64,
}

/// Config form: `{"angles": [...], "tolerance": 3.0}`; the tolerance is
/// optional and derived from the angles when absent.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGantryMask {
    #[serde(alias = "targetAngles")]
    angles: Vec<f64>,
    #[serde(default)]
    tolerance: Option<f64>,
}

impl TryFrom<RawGantryMask> for GantryMask {
    type Error = QaError;

    fn try_from(raw: RawGantryMask) -> Result<Self, Self::Error> {
        match raw.tolerance {
            Some(tol) => GantryMask::new(raw.angles, tol),
            None => GantryMask::for_angles(raw.angles),
        }
    }
}

/// Tolerance that keeps per-angle windows disjoint: half the smallest
/// circular separation between distinct targets less
/// [`DERIVED_TOLERANCE_MARGIN_DEG`] (never negative), or
/// [`UNBOUNDED_TOLERANCE_DEG`] when there is only one distinct target.
pub fn gantry_tolerance_from_angles(angles: &[f64]) -> f64 {
    match min_separation(angles) {
        Some(sep) => (sep / 2.0 - DERIVED_TOLERANCE_MARGIN_DEG).max(0.0),
        None => UNBOUNDED_TOLERANCE_DEG,
    }
}

impl GantryMask {
    /// Mask with explicit targets and tolerance (degrees).
    pub fn new(target_angles: Vec<f64>, tolerance: f64) -> QaResult<Self> {
        if target_angles.is_empty() {
            return Err(QaError::config("gantry mask needs at least one target angle"));
        }
        if let Some(a) = target_angles.iter().find(|a| !a.is_finite()) {
            return Err(QaError::config(format!("gantry target angle {a} is not finite")));
        }
        if !(tolerance >= 0.0) {
            return Err(QaError::config(format!(
                "gantry tolerance must be non-negative, got {tolerance}"
            )));
        }
        Ok(Self {
            target_angles: target_angles.into_iter().map(normalize_degrees).collect(),
            tolerance,
        })
    }

    /// Single target with the unbounded default tolerance.
    pub fn single(angle: f64) -> QaResult<Self> {
        Self::new(vec![angle], UNBOUNDED_TOLERANCE_DEG)
    }

    /// Targets with a tolerance derived from their spacing.
    pub fn for_angles(target_angles: Vec<f64>) -> QaResult<Self> {
        let tolerance = gantry_tolerance_from_angles(&target_angles);
        Self::new(target_angles, tolerance)
    }

    pub fn with_tolerance(self, tolerance: f64) -> QaResult<Self> {
        Self::new(self.target_angles, tolerance)
    }

    pub fn target_angles(&self) -> &[f64] {
        &self.target_angles
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// True when `angle` is within tolerance of any target.
    pub fn selects(&self, angle: f64) -> bool {
        self.target_angles
            .iter()
            .any(|&t| circular_distance(angle, t) <= self.tolerance)
    }

    /// Indices of the selected control points, ascending.
    pub fn indices(&self, record: &DeliveryRecord) -> Vec<usize> {
        record
            .gantry_angles()
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| self.selects(a).then_some(i))
            .collect()
    }

    /// New record holding only the selected control points in original order.
    /// Cumulative MU is kept as recorded. No match yields the empty record.
    pub fn mask(&self, record: &DeliveryRecord) -> DeliveryRecord {
        let indices = self.indices(record);
        debug!(
            "GantryMask: selected {}/{} control points (targets={:?} tol={:.2})",
            indices.len(),
            record.len(),
            self.target_angles,
            self.tolerance
        );
        if indices.is_empty() {
            return DeliveryRecord::empty();
        }
        if indices.len() == record.len() {
            return record.clone();
        }
        record.select(&indices)
    }

    /// Selected control points as a delivery of their own: MU starts at 0
    /// (or at the recorded starting MU when control point 0 is selected) and
    /// only grows between selected control points that were consecutive in
    /// `record`. No match yields the empty record.
    pub fn masked_delivery(&self, record: &DeliveryRecord) -> DeliveryRecord {
        let indices = self.indices(record);
        debug!(
            "GantryMask: delivery keeps {}/{} control points (targets={:?} tol={:.2})",
            indices.len(),
            record.len(),
            self.target_angles,
            self.tolerance
        );
        if indices.is_empty() {
            return DeliveryRecord::empty();
        }
        record.select_delivered(&indices)
    }

    /// One record per target angle, each a delivery of its own as in
    /// [`GantryMask::masked_delivery`].
    ///
    /// Fails with [`QaError::Config`] when a control point falls inside more
    /// than one target window.
    pub fn split_by_angle(&self, record: &DeliveryRecord) -> QaResult<Vec<DeliveryRecord>> {
        let angles = record.gantry_angles();
        let mut owner: Vec<Option<usize>> = vec![None; angles.len()];
        let mut segments: Vec<Vec<usize>> = vec![Vec::new(); self.target_angles.len()];

        for (t, &target) in self.target_angles.iter().enumerate() {
            for (i, &a) in angles.iter().enumerate() {
                if circular_distance(a, target) > self.tolerance {
                    continue;
                }
                if let Some(prev) = owner[i] {
                    warn!(
                        "GantryMask: control point {i} at {a:.2} deg matches targets {} and {}",
                        self.target_angles[prev], target
                    );
                    return Err(QaError::config(format!(
                        "gantry tolerance {:.2} too large: windows around {} and {} overlap",
                        self.tolerance, self.target_angles[prev], target
                    )));
                }
                owner[i] = Some(t);
                segments[t].push(i);
            }
        }

        Ok(segments
            .iter()
            .map(|idx| {
                if idx.is_empty() {
                    DeliveryRecord::empty()
                } else {
                    record.select_delivered(idx)
                }
            })
            .collect())
    }
}

/// Select control points within `tolerance` of any of `target_angles`.
pub fn mask(
    record: &DeliveryRecord,
    target_angles: &[f64],
    tolerance: f64,
) -> QaResult<DeliveryRecord> {
    Ok(GantryMask::new(target_angles.to_vec(), tolerance)?.mask(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_angles(angles: &[f64]) -> DeliveryRecord {
        let n = angles.len();
        DeliveryRecord::from_components(
            (0..n).map(|i| i as f64 * 10.0).collect(),
            vec![vec![[10.0, 10.0]; 2]; n],
            vec![[5.0, 5.0]; n],
            angles.to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn mask_wraps_across_zero() {
        let r = record_with_angles(&[359.0, 1.0, 10.0]);
        let masked = mask(&r, &[0.0], 3.0).unwrap();
        assert_eq!(masked.gantry_angles(), &[359.0, 1.0]);
    }

    #[test]
    fn mask_selects_single_quadrant() {
        let r = record_with_angles(&[0.0, 90.0, 180.0, 270.0]);
        let m = GantryMask::new(vec![90.0], 5.0).unwrap();
        assert_eq!(m.indices(&r), vec![1]);
        let masked = m.mask(&r);
        assert_eq!(masked.len(), 1);
        assert_eq!(masked.gantry_angles(), &[90.0]);
        assert_eq!(masked.monitor_units(), &[10.0]);
    }

    #[test]
    fn no_match_yields_empty_record() {
        let r = record_with_angles(&[0.0, 10.0]);
        let masked = mask(&r, &[180.0], 1.0).unwrap();
        assert!(masked.is_empty());
    }

    #[test]
    fn single_angle_default_admits_everything() {
        let r = record_with_angles(&[0.0, 90.0, 180.0, 270.0]);
        let m = GantryMask::single(42.0).unwrap();
        assert_eq!(m.tolerance(), UNBOUNDED_TOLERANCE_DEG);
        assert_eq!(m.mask(&r), r);
        let narrowed = m.with_tolerance(50.0).unwrap();
        assert_eq!(narrowed.indices(&r), vec![0, 1]);
    }

    #[test]
    fn multiple_targets_union() {
        let r = record_with_angles(&[0.0, 90.0, 180.0, 270.0]);
        let m = GantryMask::new(vec![0.0, 180.0], 1.0).unwrap();
        assert_eq!(m.indices(&r), vec![0, 2]);
    }

    #[test]
    fn derived_tolerance_is_half_min_spacing() {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        assert!(close(
            gantry_tolerance_from_angles(&[0.0, 120.0, 240.0]),
            60.0 - DERIVED_TOLERANCE_MARGIN_DEG
        ));
        assert_eq!(gantry_tolerance_from_angles(&[10.0]), UNBOUNDED_TOLERANCE_DEG);
        assert!(close(
            gantry_tolerance_from_angles(&[350.0, 10.0]),
            10.0 - DERIVED_TOLERANCE_MARGIN_DEG
        ));
        assert_eq!(gantry_tolerance_from_angles(&[0.0, 0.005]), 0.0);
    }

    #[test]
    fn split_by_angle_rebases_segments() {
        let r = record_with_angles(&[0.0, 1.0, 180.0, 181.0]);
        let m = GantryMask::for_angles(vec![0.0, 180.0]).unwrap();
        let parts = m.split_by_angle(&r).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].monitor_units(), &[0.0, 10.0]);
        assert_eq!(parts[1].monitor_units(), &[0.0, 10.0]);
        assert_eq!(parts[1].gantry_angles(), &[180.0, 181.0]);
    }

    #[test]
    fn derived_windows_exclude_the_midpoint() {
        let r = record_with_angles(&[0.0, 45.0, 90.0]);
        let m = GantryMask::for_angles(vec![0.0, 90.0]).unwrap();
        assert!(!m.selects(45.0));
        let parts = m.split_by_angle(&r).unwrap();
        assert_eq!(parts[0].gantry_angles(), &[0.0]);
        assert_eq!(parts[1].gantry_angles(), &[90.0]);
        assert_eq!(parts[1].monitor_units(), &[0.0]);
    }

    #[test]
    fn masked_delivery_drops_mu_outside_window() {
        // 10 MU per step; the 90 deg window holds control points 2 and 3
        let r = record_with_angles(&[0.0, 1.0, 90.0, 91.0, 180.0]);
        let m = GantryMask::new(vec![90.0], 2.0).unwrap();
        assert_eq!(m.mask(&r).monitor_units(), &[20.0, 30.0]);
        let delivered = m.masked_delivery(&r);
        assert_eq!(delivered.monitor_units(), &[0.0, 10.0]);
        assert_eq!(delivered.gantry_angles(), &[90.0, 91.0]);
        assert!(GantryMask::new(vec![270.0], 1.0)
            .unwrap()
            .masked_delivery(&r)
            .is_empty());
    }

    #[test]
    fn split_by_angle_skips_gaps_inside_one_window() {
        // the arc leaves and re-enters the 0 deg window
        let r = record_with_angles(&[0.0, 2.0, 90.0, 2.0, 0.0]);
        let m = GantryMask::new(vec![0.0], 5.0).unwrap();
        let parts = m.split_by_angle(&r).unwrap();
        assert_eq!(parts[0].monitor_units(), &[0.0, 10.0, 10.0, 20.0]);
    }

    #[test]
    fn split_by_angle_rejects_overlap() {
        let r = record_with_angles(&[45.0]);
        let m = GantryMask::new(vec![0.0, 90.0], 50.0).unwrap();
        assert!(matches!(m.split_by_angle(&r), Err(QaError::Config(_))));
    }

    #[test]
    fn invalid_masks_are_config_errors() {
        assert!(matches!(GantryMask::new(vec![], 1.0), Err(QaError::Config(_))));
        assert!(matches!(GantryMask::new(vec![0.0], -1.0), Err(QaError::Config(_))));
        assert!(matches!(
            GantryMask::new(vec![f64::NAN], 1.0),
            Err(QaError::Config(_))
        ));
    }

    #[test]
    fn deserializes_with_optional_tolerance() {
        let m: GantryMask = serde_json::from_str(r#"{"angles":[0,90]}"#).unwrap();
        assert_eq!(m.tolerance(), gantry_tolerance_from_angles(&[0.0, 90.0]));
        let m: GantryMask = serde_json::from_str(r#"{"angles":[90],"tolerance":5}"#).unwrap();
        assert_eq!(m.tolerance(), 5.0);
    }
}
