//! Immutable control-point record of one beam delivery.
//!
//! A record is four parallel sequences indexed by control point:
//! cumulative monitor units, MLC leaf-pair positions, jaw positions, and
//! gantry angle. It is built once by an adapter and never mutated; masking,
//! filtering and rebasing all return new records.
//!
//! Geometry conventions (millimetres, isocentre plane):
//! - `mlc[i][k] = [bank_a, bank_b]` for leaf pair `k`. The bank A tip sits at
//!   `-bank_a` on the MLC axis and the bank B tip at `+bank_b`, so positive
//!   values open the pair and `bank_a + bank_b` is the leaf gap.
//! - `jaw[i] = [jaw_1, jaw_2]` opens the interval `[-jaw_1, +jaw_2]` on the
//!   jaw axis.
use crate::angle::normalize_degrees;
use crate::cache::{ContentHasher, ContentKey};
use crate::error::{QaError, QaResult};
use serde::{Deserialize, Serialize};

/// `[bank_a, bank_b]` retraction of one leaf pair.
pub type LeafPair = [f64; 2];
/// `[jaw_1, jaw_2]` retraction of the jaw pair.
pub type JawPair = [f64; 2];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDeliveryRecord")]
pub struct DeliveryRecord {
    monitor_units: Vec<f64>,
    mlc: Vec<Vec<LeafPair>>,
    jaw: Vec<JawPair>,
    gantry_angle: Vec<f64>,
}

/// Unvalidated wire form; deserialization goes through
/// [`DeliveryRecord::from_components`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeliveryRecord {
    monitor_units: Vec<f64>,
    mlc: Vec<Vec<LeafPair>>,
    jaw: Vec<JawPair>,
    gantry_angle: Vec<f64>,
}

impl TryFrom<RawDeliveryRecord> for DeliveryRecord {
    type Error = QaError;

    fn try_from(raw: RawDeliveryRecord) -> Result<Self, Self::Error> {
        DeliveryRecord::from_components(raw.monitor_units, raw.mlc, raw.jaw, raw.gantry_angle)
    }
}

/// Borrowed view of a single control point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPoint<'a> {
    pub monitor_units: f64,
    pub mlc: &'a [LeafPair],
    pub jaw: JawPair,
    pub gantry_angle: f64,
}

impl Default for DeliveryRecord {
    fn default() -> Self {
        Self::empty()
    }
}

impl DeliveryRecord {
    /// The zero-control-point record.
    pub fn empty() -> Self {
        Self {
            monitor_units: Vec::new(),
            mlc: Vec::new(),
            jaw: Vec::new(),
            gantry_angle: Vec::new(),
        }
    }

    /// Validate and assemble a record from its component sequences.
    ///
    /// Fails with [`QaError::Shape`] when the sequences differ in length, when
    /// control points disagree on the number of leaf pairs, or when a
    /// position/angle is not finite; fails with [`QaError::Order`] when
    /// monitor units decrease or are not finite. Angles are stored modulo 360.
    pub fn from_components(
        monitor_units: Vec<f64>,
        mlc: Vec<Vec<LeafPair>>,
        jaw: Vec<JawPair>,
        gantry_angle: Vec<f64>,
    ) -> QaResult<Self> {
        let n = monitor_units.len();
        if mlc.len() != n || jaw.len() != n || gantry_angle.len() != n {
            return Err(QaError::shape(format!(
                "component lengths differ: monitor_units={n} mlc={} jaw={} gantry_angle={}",
                mlc.len(),
                jaw.len(),
                gantry_angle.len()
            )));
        }

        if let Some(first) = mlc.first() {
            let leaf_pairs = first.len();
            if let Some((i, cp)) = mlc.iter().enumerate().find(|(_, cp)| cp.len() != leaf_pairs) {
                return Err(QaError::shape(format!(
                    "control point {i} has {} leaf pairs, expected {leaf_pairs}",
                    cp.len()
                )));
            }
        }

        let positions_finite = mlc
            .iter()
            .flat_map(|cp| cp.iter())
            .chain(jaw.iter())
            .all(|pair| pair[0].is_finite() && pair[1].is_finite());
        if !positions_finite {
            return Err(QaError::shape("leaf or jaw positions contain non-finite values"));
        }
        if let Some(i) = gantry_angle.iter().position(|a| !a.is_finite()) {
            return Err(QaError::shape(format!(
                "gantry angle at control point {i} is not finite"
            )));
        }

        if let Some(i) = monitor_units.iter().position(|mu| !mu.is_finite()) {
            return Err(QaError::order(format!(
                "monitor units at control point {i} are not finite"
            )));
        }
        if let Some(i) = monitor_units.windows(2).position(|w| w[1] < w[0]) {
            return Err(QaError::order(format!(
                "monitor units decrease at control point {}: {} -> {}",
                i + 1,
                monitor_units[i],
                monitor_units[i + 1]
            )));
        }

        let gantry_angle = gantry_angle.into_iter().map(normalize_degrees).collect();

        Ok(Self {
            monitor_units,
            mlc,
            jaw,
            gantry_angle,
        })
    }

    pub fn len(&self) -> usize {
        self.monitor_units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitor_units.is_empty()
    }

    pub fn monitor_units(&self) -> &[f64] {
        &self.monitor_units
    }

    pub fn mlc(&self) -> &[Vec<LeafPair>] {
        &self.mlc
    }

    pub fn jaw(&self) -> &[JawPair] {
        &self.jaw
    }

    pub fn gantry_angles(&self) -> &[f64] {
        &self.gantry_angle
    }

    /// Leaf pairs per control point (0 for the empty record).
    pub fn leaf_pair_count(&self) -> usize {
        self.mlc.first().map_or(0, Vec::len)
    }

    /// Cumulative MU at the last control point.
    pub fn total_mu(&self) -> f64 {
        self.monitor_units.last().copied().unwrap_or(0.0)
    }

    pub fn control_point(&self, i: usize) -> Option<ControlPoint<'_>> {
        (i < self.len()).then(|| ControlPoint {
            monitor_units: self.monitor_units[i],
            mlc: &self.mlc[i],
            jaw: self.jaw[i],
            gantry_angle: self.gantry_angle[i],
        })
    }

    pub fn control_points(&self) -> impl Iterator<Item = ControlPoint<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.control_point(i))
    }

    /// Subset of control points in the given (ascending) order.
    pub(crate) fn select(&self, indices: &[usize]) -> Self {
        Self {
            monitor_units: indices.iter().map(|&i| self.monitor_units[i]).collect(),
            mlc: indices.iter().map(|&i| self.mlc[i].clone()).collect(),
            jaw: indices.iter().map(|&i| self.jaw[i]).collect(),
            gantry_angle: indices.iter().map(|&i| self.gantry_angle[i]).collect(),
        }
    }

    /// Subset of control points whose MU counts only what was delivered
    /// between consecutive original control points that are both selected.
    ///
    /// The first selected point sits at 0 MU, unless it is control point 0,
    /// which keeps its own starting MU. A jump across unselected control
    /// points adds nothing, so the MU delivered outside the selection never
    /// reaches the subset's metersets.
    pub(crate) fn select_delivered(&self, indices: &[usize]) -> Self {
        let mut out = self.select(indices);
        let mut delivered = match indices.first() {
            Some(0) => self.monitor_units[0],
            _ => 0.0,
        };
        if let Some(first) = out.monitor_units.first_mut() {
            *first = delivered;
        }
        for (k, pair) in indices.windows(2).enumerate() {
            if pair[1] == pair[0] + 1 {
                delivered += self.monitor_units[pair[1]] - self.monitor_units[pair[0]];
            }
            out.monitor_units[k + 1] = delivered;
        }
        out
    }

    /// Drop control points that deliver nothing and bound no MU change.
    ///
    /// A control point is kept when MU changes between it and either
    /// neighbour. The first control point is compared against a virtual MU
    /// origin of 0. Filtering an already filtered record returns it unchanged.
    pub fn filter_control_points(&self) -> Self {
        let mu = &self.monitor_units;
        let n = mu.len();
        let keep: Vec<usize> = (0..n)
            .filter(|&i| {
                let prev = if i == 0 { 0.0 } else { mu[i - 1] };
                let changed_before = mu[i] != prev;
                let changed_after = i + 1 < n && mu[i + 1] != mu[i];
                changed_before || changed_after
            })
            .collect();
        if keep.len() == n {
            return self.clone();
        }
        self.select(&keep)
    }

    /// Shift cumulative MU so the first control point sits at 0.
    pub fn rebase_monitor_units(&self) -> Self {
        let Some(&origin) = self.monitor_units.first() else {
            return self.clone();
        };
        let mut out = self.clone();
        for mu in &mut out.monitor_units {
            *mu -= origin;
        }
        out
    }

    /// Stable hash of every value in the record.
    pub fn content_key(&self) -> ContentKey {
        let mut hasher = ContentHasher::new();
        hasher.write_f64s(&self.monitor_units);
        hasher.write_usize(self.mlc.len());
        for cp in &self.mlc {
            hasher.write_usize(cp.len());
            for pair in cp {
                hasher.write_f64(pair[0]);
                hasher.write_f64(pair[1]);
            }
        }
        hasher.write_usize(self.jaw.len());
        for pair in &self.jaw {
            hasher.write_f64(pair[0]);
            hasher.write_f64(pair[1]);
        }
        hasher.write_f64s(&self.gantry_angle);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(mu: &[f64]) -> DeliveryRecord {
        let n = mu.len();
        DeliveryRecord::from_components(
            mu.to_vec(),
            vec![vec![[10.0, 10.0]; 2]; n],
            vec![[5.0, 5.0]; n],
            vec![0.0; n],
        )
        .unwrap()
    }

    #[test]
    fn empty_record_has_no_control_points() {
        let empty = DeliveryRecord::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.leaf_pair_count(), 0);
        assert_eq!(empty.total_mu(), 0.0);
        assert_eq!(empty, DeliveryRecord::default());
    }

    #[test]
    fn decreasing_monitor_units_fail() {
        let err = DeliveryRecord::from_components(
            vec![0.0, 50.0, 40.0],
            vec![vec![[1.0, 1.0]]; 3],
            vec![[1.0, 1.0]; 3],
            vec![0.0; 3],
        )
        .unwrap_err();
        assert!(matches!(err, QaError::Order(_)), "{err}");
    }

    #[test]
    fn unequal_lengths_fail() {
        let err = DeliveryRecord::from_components(
            vec![0.0, 50.0],
            vec![vec![[1.0, 1.0]]; 2],
            vec![[1.0, 1.0]; 1],
            vec![0.0; 2],
        )
        .unwrap_err();
        assert!(matches!(err, QaError::Shape(_)));
    }

    #[test]
    fn ragged_leaf_pairs_fail() {
        let err = DeliveryRecord::from_components(
            vec![0.0, 50.0],
            vec![vec![[1.0, 1.0]], vec![[1.0, 1.0], [2.0, 2.0]]],
            vec![[1.0, 1.0]; 2],
            vec![0.0; 2],
        )
        .unwrap_err();
        assert!(matches!(err, QaError::Shape(_)));
    }

    #[test]
    fn angles_are_stored_modulo_360() {
        let r = DeliveryRecord::from_components(
            vec![0.0, 1.0],
            vec![vec![[1.0, 1.0]]; 2],
            vec![[1.0, 1.0]; 2],
            vec![-10.0, 370.0],
        )
        .unwrap();
        assert_eq!(r.gantry_angles(), &[350.0, 10.0]);
    }

    #[test]
    fn filter_drops_flat_runs() {
        let r = record(&[0.0, 0.0, 0.0, 10.0, 10.0, 10.0]);
        let filtered = r.filter_control_points();
        assert_eq!(filtered.monitor_units(), &[0.0, 10.0]);
        assert_eq!(filtered.filter_control_points(), filtered);
    }

    #[test]
    fn filter_keeps_nonzero_start() {
        let r = record(&[5.0, 5.0, 10.0]);
        assert_eq!(r.filter_control_points().monitor_units(), &[5.0, 5.0, 10.0]);
    }

    #[test]
    fn delivered_selection_skips_gaps() {
        let r = DeliveryRecord::from_components(
            vec![0.0, 10.0, 30.0, 60.0, 100.0],
            vec![vec![[1.0, 1.0]]; 5],
            vec![[1.0, 1.0]; 5],
            vec![0.0, 1.0, 90.0, 180.0, 181.0],
        )
        .unwrap();
        let picked = r.select_delivered(&[0, 1, 3, 4]);
        assert_eq!(picked.monitor_units(), &[0.0, 10.0, 10.0, 50.0]);
        assert_eq!(picked.gantry_angles(), &[0.0, 1.0, 180.0, 181.0]);
        let tail = r.select_delivered(&[3, 4]);
        assert_eq!(tail.monitor_units(), &[0.0, 40.0]);
        assert!(r.select_delivered(&[]).is_empty());

        // a counter already running at control point 0 is kept
        let running = record(&[40.0, 55.0, 70.0]);
        assert_eq!(running.select_delivered(&[0, 1]).monitor_units(), &[40.0, 55.0]);
        assert_eq!(running.select_delivered(&[0, 2]).monitor_units(), &[40.0, 40.0]);
    }

    #[test]
    fn rebase_moves_origin_to_zero() {
        let r = record(&[40.0, 55.0, 70.0]).rebase_monitor_units();
        assert_eq!(r.monitor_units(), &[0.0, 15.0, 30.0]);
    }

    #[test]
    fn content_key_tracks_values() {
        let a = record(&[0.0, 10.0]);
        let b = record(&[0.0, 10.0]);
        let c = record(&[0.0, 11.0]);
        assert_eq!(a.content_key(), b.content_key());
        assert_ne!(a.content_key(), c.content_key());
    }

    #[test]
    fn json_round_trip_validates() {
        let json = r#"{"monitorUnits":[0,50,40],"mlc":[[[1,1]],[[1,1]],[[1,1]]],"jaw":[[1,1],[1,1],[1,1]],"gantryAngle":[0,0,0]}"#;
        assert!(serde_json::from_str::<DeliveryRecord>(json).is_err());

        let r = record(&[0.0, 10.0]);
        let text = serde_json::to_string(&r).unwrap();
        assert!(text.contains("monitorUnits"));
        let back: DeliveryRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, r);
    }
}
