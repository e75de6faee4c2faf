//! Gantry angle utilities (degrees, 360-periodic).

/// Full turn in degrees.
pub const FULL_TURN_DEG: f64 = 360.0;

/// Normalizes an angle into the range [0, 360).
#[inline]
pub fn normalize_degrees(angle: f64) -> f64 {
    let norm = angle.rem_euclid(FULL_TURN_DEG);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if norm >= FULL_TURN_DEG - 1e-9 {
        0.0
    } else {
        norm
    }
}

/// Smallest unsigned separation between two gantry angles, wrapping across
/// the 0/360 boundary. Returns a value in [0, 180].
#[inline]
pub fn circular_distance(a: f64, b: f64) -> f64 {
    let diff = (normalize_degrees(a) - normalize_degrees(b)).abs();
    diff.min(FULL_TURN_DEG - diff)
}

/// Smallest circular separation between any two distinct entries of `angles`.
/// `None` when fewer than two distinct angles are present.
pub fn min_separation(angles: &[f64]) -> Option<f64> {
    let mut best: Option<f64> = None;
    for (i, &a) in angles.iter().enumerate() {
        for &b in &angles[i + 1..] {
            let d = circular_distance(a, b);
            if d <= 0.0 {
                continue;
            }
            best = Some(best.map_or(d, |cur| cur.min(d)));
        }
    }
    best
}
