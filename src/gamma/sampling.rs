//! Search pattern and sub-pixel sampling for the gamma comparator.
use crate::grid::{DensityGrid, GridView};

/// One probe of the search pattern, relative to the reference cell (mm).
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Probe {
    pub dx: f32,
    pub dy: f32,
    /// Distance term `|offset| / distance_threshold`, squared.
    pub dist_sq: f32,
}

/// Concentric shells of probes spaced `step` apart out to `max_radius`,
/// ordered by radius so the search can stop as soon as the distance term
/// alone exceeds the best gamma found.
pub(crate) fn search_pattern(step: f32, max_radius: f32, distance_threshold: f32) -> Vec<Probe> {
    let mut probes = vec![Probe {
        dx: 0.0,
        dy: 0.0,
        dist_sq: 0.0,
    }];
    if !(step > 0.0) {
        return probes;
    }
    let shells = (max_radius / step + 1e-4).floor() as usize;
    for k in 1..=shells {
        let radius = step * k as f32;
        let count = ((std::f32::consts::TAU * k as f32).ceil() as usize).max(4);
        let scaled = radius / distance_threshold;
        for j in 0..count {
            let theta = std::f32::consts::TAU * j as f32 / count as f32;
            probes.push(Probe {
                dx: radius * theta.cos(),
                dy: radius * theta.sin(),
                dist_sq: scaled * scaled,
            });
        }
    }
    probes
}

/// Bilinear sample of `grid` at fractional column `x`, row `y`.
///
/// Positions on the last row or column are valid; anything outside the
/// lattice returns `None`.
pub(crate) fn bilinear(grid: &DensityGrid, x: f32, y: f32) -> Option<f32> {
    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return None;
    }
    let w = grid.width();
    let h = grid.height();
    if w == 0 || h == 0 {
        return None;
    }
    let max_x = (w - 1) as f32;
    let max_y = (h - 1) as f32;
    if x > max_x || y > max_y {
        return None;
    }
    let x0 = (x.floor() as usize).min(w - 1);
    let y0 = (y.floor() as usize).min(h - 1);
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let tx = x - x0 as f32;
    let ty = y - y0 as f32;

    let top = grid.row(y0);
    let bottom = grid.row(y1);
    let v0 = top[x0] * (1.0 - tx) + top[x1] * tx;
    let v1 = bottom[x0] * (1.0 - tx) + bottom[x1] * tx;
    Some(v0 * (1.0 - ty) + v1 * ty)
}
