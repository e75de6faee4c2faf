use crate::grid::DensityGrid;
use serde::{Deserialize, Serialize};

/// Aggregate statistics over the evaluated cells of a gamma grid.
///
/// Cells holding NaN were not evaluated and are ignored. With no evaluated
/// cell every statistic is zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaSummary {
    pub evaluated: usize,
    pub passed: usize,
    pub pass_fraction: f64,
    pub mean: f64,
    pub max: f64,
}

impl GammaSummary {
    pub fn from_grid(grid: &DensityGrid) -> Self {
        let mut evaluated = 0usize;
        let mut passed = 0usize;
        let mut sum = 0.0f64;
        let mut max = 0.0f64;
        for &g in grid.data.iter().filter(|g| !g.is_nan()) {
            evaluated += 1;
            if g <= 1.0 {
                passed += 1;
            }
            sum += g as f64;
            max = max.max(g as f64);
        }
        if evaluated == 0 {
            return Self::default();
        }
        Self {
            evaluated,
            passed,
            pass_fraction: passed as f64 / evaluated as f64,
            mean: sum / evaluated as f64,
            max,
        }
    }

    pub fn passes(&self, min_pass_fraction: f64) -> bool {
        self.evaluated > 0 && self.pass_fraction >= min_pass_fraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_cells_are_skipped() {
        let grid = DensityGrid::from_vec(4, 1, vec![0.5, f32::NAN, 1.5, 1.0]).unwrap();
        let s = GammaSummary::from_grid(&grid);
        assert_eq!(s.evaluated, 3);
        assert_eq!(s.passed, 2);
        assert!((s.pass_fraction - 2.0 / 3.0).abs() < 1e-12);
        assert!((s.mean - 1.0).abs() < 1e-12);
        assert_eq!(s.max, 1.5);
        assert!(s.passes(0.6));
        assert!(!s.passes(0.95));
    }

    #[test]
    fn empty_evaluation_is_all_zero() {
        let grid = DensityGrid::from_vec(2, 1, vec![f32::NAN; 2]).unwrap();
        assert_eq!(GammaSummary::from_grid(&grid), GammaSummary::default());
        assert!(!GammaSummary::default().passes(0.0));
    }
}
