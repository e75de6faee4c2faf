//! Owned f32 density grid in row-major layout.
//!
//! Rows follow the jaw axis of a [`GridSpace`](super::GridSpace), columns the
//! MLC axis. Grids over the same space are summable elementwise; the sum of
//! several grids is itself a valid density grid.
use crate::error::{QaError, QaResult};
use serde::{Deserialize, Serialize};

use super::traits::{GridView, GridViewMut};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensityGrid {
    /// Number of columns (MLC axis samples)
    pub w: usize,
    /// Number of rows (jaw axis samples)
    pub h: usize,
    /// Backing storage in row-major order
    pub data: Vec<f32>,
}

impl DensityGrid {
    /// Construct a zero-initialized grid of size `w × h`.
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            data: vec![0.0; w * h],
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(w: usize, h: usize, data: Vec<f32>) -> QaResult<Self> {
        if data.len() != w * h {
            return Err(QaError::shape(format!(
                "grid buffer holds {} values, expected {w}x{h}={}",
                data.len(),
                w * h
            )));
        }
        Ok(Self { w, h, data })
    }

    #[inline]
    /// Convert (x, y) to a linear index into `data`.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.w + x
    }
    #[inline]
    /// Get the value at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[self.idx(x, y)]
    }
    #[inline]
    /// Set the value at column `x`, row `y`.
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        let i = self.idx(x, y);
        self.data[i] = v;
    }

    pub fn same_shape(&self, other: &DensityGrid) -> bool {
        self.w == other.w && self.h == other.h
    }

    fn ensure_same_shape(&self, other: &DensityGrid) -> QaResult<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(QaError::shape(format!(
                "grid shapes differ: {}x{} vs {}x{}",
                self.w, self.h, other.w, other.h
            )))
        }
    }

    /// Add `other` into `self` elementwise.
    pub fn accumulate(&mut self, other: &DensityGrid) -> QaResult<()> {
        self.ensure_same_shape(other)?;
        for (dst, src) in self.data.iter_mut().zip(&other.data) {
            *dst += *src;
        }
        Ok(())
    }

    /// Elementwise `self + other`.
    pub fn sum(&self, other: &DensityGrid) -> QaResult<DensityGrid> {
        let mut out = self.clone();
        out.accumulate(other)?;
        Ok(out)
    }

    /// Elementwise `self - other`. For a comparison this is called on the
    /// evaluation grid with the reference as `other`.
    pub fn difference(&self, other: &DensityGrid) -> QaResult<DensityGrid> {
        self.ensure_same_shape(other)?;
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a - b)
            .collect();
        Ok(DensityGrid {
            w: self.w,
            h: self.h,
            data,
        })
    }

    /// Largest value, or 0 for an empty grid.
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(0.0f32, f32::max)
    }

    /// Largest absolute value, or 0 for an empty grid.
    pub fn max_abs(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, v| acc.max(v.abs()))
    }

    pub fn total(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }

    pub fn is_all_zero(&self) -> bool {
        self.data.iter().all(|&v| v == 0.0)
    }
}

impl GridView for DensityGrid {
    type Value = f32;

    #[inline]
    fn width(&self) -> usize {
        self.w
    }
    #[inline]
    fn height(&self) -> usize {
        self.h
    }
    #[inline]
    fn row(&self, y: usize) -> &[f32] {
        let start = y * self.w;
        &self.data[start..start + self.w]
    }
}

impl GridViewMut for DensityGrid {
    #[inline]
    fn row_mut(&mut self, y: usize) -> &mut [f32] {
        let start = y * self.w;
        &mut self.data[start..start + self.w]
    }
}
