//! Stable content hashing for memoization keys.
//!
//! Keys are derived from values, never from identity: two records or grids
//! with identical contents hash to the same key regardless of where they were
//! built. Floats are hashed by bit pattern after folding `-0.0` onto `0.0`
//! and every NaN onto one canonical NaN.
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

use crate::grid::DensityGrid;

/// 128-bit xxh3 digest of some input values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentKey(pub u128);

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Streaming hasher producing a [`ContentKey`].
pub struct ContentHasher {
    inner: Xxh3,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher {
    pub fn new() -> Self {
        Self { inner: Xxh3::new() }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn write_u64(&mut self, v: u64) {
        self.inner.update(&v.to_le_bytes());
    }

    pub fn write_usize(&mut self, v: usize) {
        self.write_u64(v as u64);
    }

    pub fn write_bool(&mut self, v: bool) {
        self.inner.update(&[v as u8]);
    }

    pub fn write_f64(&mut self, v: f64) {
        let canonical = if v == 0.0 {
            0.0f64
        } else if v.is_nan() {
            f64::NAN
        } else {
            v
        };
        self.write_u64(canonical.to_bits());
    }

    pub fn write_f32(&mut self, v: f32) {
        let canonical = if v == 0.0 {
            0.0f32
        } else if v.is_nan() {
            f32::NAN
        } else {
            v
        };
        self.inner.update(&canonical.to_bits().to_le_bytes());
    }

    /// Length-prefixed slice so that `[a, b] + [c]` and `[a] + [b, c]` differ.
    pub fn write_f64s(&mut self, values: &[f64]) {
        self.write_usize(values.len());
        for &v in values {
            self.write_f64(v);
        }
    }

    pub fn write_f32s(&mut self, values: &[f32]) {
        self.write_usize(values.len());
        for &v in values {
            self.write_f32(v);
        }
    }

    pub fn finish(&self) -> ContentKey {
        ContentKey(self.inner.digest128())
    }
}

/// Key of a density grid's shape and contents.
pub fn grid_key(grid: &DensityGrid) -> ContentKey {
    let mut hasher = ContentHasher::new();
    hasher.write_usize(grid.w);
    hasher.write_usize(grid.h);
    hasher.write_f32s(&grid.data);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_contents_share_a_key() {
        let a = DensityGrid::from_vec(2, 1, vec![1.0, 2.0]).unwrap();
        let b = DensityGrid::from_vec(2, 1, vec![1.0, 2.0]).unwrap();
        assert_eq!(grid_key(&a), grid_key(&b));
    }

    #[test]
    fn shape_is_part_of_the_key() {
        let a = DensityGrid::from_vec(2, 1, vec![1.0, 2.0]).unwrap();
        let b = DensityGrid::from_vec(1, 2, vec![1.0, 2.0]).unwrap();
        assert_ne!(grid_key(&a), grid_key(&b));
    }

    #[test]
    fn signed_zero_is_canonical() {
        let mut h1 = ContentHasher::new();
        h1.write_f64(0.0);
        let mut h2 = ContentHasher::new();
        h2.write_f64(-0.0);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn slice_boundaries_matter() {
        let mut h1 = ContentHasher::new();
        h1.write_f64s(&[1.0, 2.0]);
        h1.write_f64s(&[3.0]);
        let mut h2 = ContentHasher::new();
        h2.write_f64s(&[1.0]);
        h2.write_f64s(&[2.0, 3.0]);
        assert_ne!(h1.finish(), h2.finish());
    }
}
