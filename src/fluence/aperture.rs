//! Aperture silhouette binning onto a [`GridSpace`].
//!
//! Each pixel receives `weight × open area fraction`. The open area is the
//! union over leaf pairs of
//! `(row band ∩ leaf band ∩ jaw interval) × (column band ∩ leaf opening)`,
//! computed with exact partial-pixel overlaps, so a pixel half covered by a
//! leaf tip gets half the weight.
//!
//! Complexity: O(rows · leaf pairs per row + open pixels) per call.
use crate::delivery::{JawPair, LeafPair};
use crate::grid::{DensityGrid, GridSpace, GridViewMut};

/// Leaf and jaw positions of one (possibly interpolated) aperture.
#[derive(Clone, Debug, PartialEq)]
pub struct Aperture {
    pub leaves: Vec<LeafPair>,
    pub jaw: JawPair,
}

impl Aperture {
    pub fn new(leaves: &[LeafPair], jaw: JawPair) -> Self {
        Self {
            leaves: leaves.to_vec(),
            jaw,
        }
    }

    /// Overwrite `self` with the linear blend `from + t · (to - from)`.
    pub fn interpolate_into(
        &mut self,
        from: (&[LeafPair], JawPair),
        to: (&[LeafPair], JawPair),
        t: f64,
    ) {
        let lerp = |a: f64, b: f64| a + t * (b - a);
        self.leaves.clear();
        self.leaves.extend(
            from.0
                .iter()
                .zip(to.0)
                .map(|(a, b)| [lerp(a[0], b[0]), lerp(a[1], b[1])]),
        );
        self.jaw = [lerp(from.1[0], to.1[0]), lerp(from.1[1], to.1[1])];
    }

    /// Largest distance any leaf or jaw moves between two apertures.
    pub fn max_travel(from: (&[LeafPair], JawPair), to: (&[LeafPair], JawPair)) -> f64 {
        let leaf_travel = from
            .0
            .iter()
            .zip(to.0)
            .map(|(a, b)| (a[0] - b[0]).abs().max((a[1] - b[1]).abs()))
            .fold(0.0f64, f64::max);
        let jaw_travel = (from.1[0] - to.1[0])
            .abs()
            .max((from.1[1] - to.1[1]).abs());
        leaf_travel.max(jaw_travel)
    }

    /// Add this aperture's silhouette, scaled by `weight`, into `grid`.
    pub fn deposit(&self, space: &GridSpace, grid: &mut DensityGrid, weight: f64) {
        deposit(space, grid, &self.leaves, self.jaw, weight);
    }
}

/// Add the silhouette of `leaves`/`jaw` scaled by `weight` into `grid`.
///
/// `leaves` must hold one entry per leaf pair of `space`.
pub fn deposit(
    space: &GridSpace,
    grid: &mut DensityGrid,
    leaves: &[LeafPair],
    jaw: JawPair,
    weight: f64,
) {
    if weight == 0.0 {
        return;
    }
    let jaw_lo = -jaw[0];
    let jaw_hi = jaw[1];
    if jaw_hi <= jaw_lo {
        return;
    }

    let res = space.resolution();
    let half = res / 2.0;
    let mlc = space.mlc();
    let cols = mlc.len();
    if cols == 0 {
        return;
    }
    let left_edge = mlc[0] - half;
    let rows = space.jaw().len();

    for row in 0..rows {
        let spans = space.row_spans(row);
        let out = grid.row_mut(row);
        for span in spans {
            let lo = span.lo.max(jaw_lo);
            let hi = span.hi.min(jaw_hi);
            if hi <= lo {
                continue;
            }
            let y_frac = (hi - lo) / res;

            let [bank_a, bank_b] = leaves[span.leaf];
            let x_lo = -bank_a;
            let x_hi = bank_b;
            if x_hi <= x_lo {
                continue;
            }

            let c0 = ((x_lo - left_edge) / res).floor().max(0.0) as usize;
            let c1 = (((x_hi - left_edge) / res).ceil().max(0.0) as usize).min(cols);
            for (c, px) in out.iter_mut().enumerate().take(c1).skip(c0) {
                let cell_lo = mlc[c] - half;
                let cell_hi = mlc[c] + half;
                let overlap = cell_hi.min(x_hi) - cell_lo.max(x_lo);
                if overlap > 0.0 {
                    *px += (weight * y_frac * overlap / res) as f32;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridGeometry;

    fn small_space() -> GridSpace {
        // 4 rows (two 2 mm leaf pairs), 9 columns from -4 to 4
        GridSpace::new(GridGeometry {
            resolution: 1.0,
            max_leaf_gap: 8.0,
            leaf_pair_widths: vec![2.0, 2.0],
        })
        .unwrap()
    }

    #[test]
    fn open_field_fills_covered_pixels() {
        let space = small_space();
        let mut grid = space.zeros();
        // leaves open [-2, 2], jaws fully open
        deposit(&space, &mut grid, &[[2.0, 2.0], [2.0, 2.0]], [2.0, 2.0], 10.0);
        for y in 0..4 {
            // columns at -1, 0, 1 are fully open; -2 and 2 half open
            assert!((grid.get(3, y) - 10.0).abs() < 1e-5);
            assert!((grid.get(4, y) - 10.0).abs() < 1e-5);
            assert!((grid.get(5, y) - 10.0).abs() < 1e-5);
            assert!((grid.get(2, y) - 5.0).abs() < 1e-5);
            assert!((grid.get(6, y) - 5.0).abs() < 1e-5);
            assert_eq!(grid.get(0, y), 0.0);
            assert_eq!(grid.get(8, y), 0.0);
        }
        assert!((grid.total() - 4.0 * 3.0 * 10.0 - 4.0 * 5.0 * 2.0).abs() < 1e-4);
    }

    #[test]
    fn jaws_block_rows() {
        let space = small_space();
        let mut grid = space.zeros();
        // jaw interval [-0.5, 2]: rows at 1.5 and 0.5 open, row -0.5 half, -1.5 closed
        deposit(&space, &mut grid, &[[4.0, 4.0], [4.0, 4.0]], [0.5, 2.0], 1.0);
        assert!((grid.get(4, 0) - 1.0).abs() < 1e-6);
        assert!((grid.get(4, 1) - 1.0).abs() < 1e-6);
        assert!((grid.get(4, 2) - 0.5).abs() < 1e-6);
        assert_eq!(grid.get(4, 3), 0.0);
    }

    #[test]
    fn closed_leaves_deposit_nothing() {
        let space = small_space();
        let mut grid = space.zeros();
        deposit(&space, &mut grid, &[[0.0, 0.0], [-1.0, 0.5]], [2.0, 2.0], 5.0);
        assert!(grid.is_all_zero());
    }

    #[test]
    fn interpolation_blends_positions() {
        let mut ap = Aperture::new(&[[0.0, 0.0]], [0.0, 0.0]);
        let from = ([[0.0, 2.0]], [1.0, 1.0]);
        let to = ([[4.0, 2.0]], [3.0, 1.0]);
        ap.interpolate_into((&from.0[..], from.1), (&to.0[..], to.1), 0.25);
        assert_eq!(ap.leaves, vec![[1.0, 2.0]]);
        assert_eq!(ap.jaw, [1.5, 1.0]);
        assert_eq!(
            Aperture::max_travel((&from.0[..], from.1), (&to.0[..], to.1)),
            4.0
        );
    }
}
