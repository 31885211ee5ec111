//! Dense row-major matrices with the handful of operations the fundamental
//! matrix method needs.
use serde::Serialize;
use std::ops::{Index, IndexMut};

use crate::constants::SINGULAR_PIVOT_EPSILON;
use crate::error::ChainError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// # Errors
    ///
    /// Returns `ChainError::NumericalError` when `rows * cols` overflows.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self, ChainError> {
        let len = rows.checked_mul(cols).ok_or_else(|| {
            ChainError::numerical(format!("{rows}x{cols} matrix is too large"))
        })?;
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; len],
        })
    }

    /// # Errors
    ///
    /// Returns `ChainError::NumericalError` when `size * size` overflows.
    pub fn identity(size: usize) -> Result<Self, ChainError> {
        let mut matrix = Self::zeros(size, size)?;
        for i in 0..size {
            matrix[(i, i)] = 1.0;
        }
        Ok(matrix)
    }

    /// Build a matrix from explicit rows.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::NumericalError` when the rows have unequal lengths.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, ChainError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len().saturating_mul(cols));
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(ChainError::numerical(format!(
                    "row {index} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub const fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Borrow one row as a slice.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.cols;
        self.data.get(start..start + self.cols)
    }

    /// Whether every entry is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|value| value.is_finite())
    }

    /// Element-wise difference `self - other`.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::NumericalError` on a shape mismatch.
    pub fn sub(&self, other: &Self) -> Result<Self, ChainError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(ChainError::numerical(format!(
                "cannot subtract {}x{} from {}x{}",
                other.rows, other.cols, self.rows, self.cols
            )));
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(lhs, rhs)| lhs - rhs)
            .collect();
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Matrix product `self · other`.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::NumericalError` when the inner dimensions differ.
    pub fn mul(&self, other: &Self) -> Result<Self, ChainError> {
        if self.cols != other.rows {
            return Err(ChainError::numerical(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut product = Self::zeros(self.rows, other.cols)?;
        for i in 0..self.rows {
            for k in 0..self.cols {
                let lhs = self[(i, k)];
                if lhs == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    product[(i, j)] = lhs.mul_add(other[(k, j)], product[(i, j)]);
                }
            }
        }
        Ok(product)
    }

    /// Row sums, i.e. `self · 1`.
    #[must_use]
    pub fn row_sums(&self) -> Vec<f64> {
        self.data
            .chunks(self.cols.max(1))
            .take(self.rows)
            .map(|row| row.iter().sum())
            .collect()
    }

    /// Largest absolute entry of `self - I`.
    #[must_use]
    pub fn max_identity_deviation(&self) -> f64 {
        let mut worst: f64 = 0.0;
        for i in 0..self.rows {
            for j in 0..self.cols {
                let target = if i == j { 1.0 } else { 0.0 };
                let deviation = (self[(i, j)] - target).abs();
                if deviation.is_nan() {
                    return f64::INFINITY;
                }
                worst = worst.max(deviation);
            }
        }
        worst
    }

    /// Invert by Gauss-Jordan elimination with partial pivoting.
    ///
    /// No structure (triangularity, diagonal dominance) is assumed.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::NumericalError` when the matrix is not square,
    /// holds non-finite entries, or a pivot falls below the singularity
    /// threshold.
    pub fn inverse(&self) -> Result<Self, ChainError> {
        if !self.is_square() {
            return Err(ChainError::numerical(format!(
                "cannot invert non-square {}x{} matrix",
                self.rows, self.cols
            )));
        }
        if !self.is_finite() {
            return Err(ChainError::numerical("matrix holds non-finite entries"));
        }
        let size = self.rows;
        let mut work = self.clone();
        let mut inverse = Self::identity(size)?;

        for col in 0..size {
            let pivot_row = (col..size)
                .max_by(|&a, &b| work[(a, col)].abs().total_cmp(&work[(b, col)].abs()))
                .unwrap_or(col);
            let pivot = work[(pivot_row, col)];
            if pivot.abs() < SINGULAR_PIVOT_EPSILON {
                return Err(ChainError::numerical(format!(
                    "singular matrix: pivot {pivot:e} in column {col}"
                )));
            }
            if pivot_row != col {
                work.swap_rows(pivot_row, col);
                inverse.swap_rows(pivot_row, col);
            }

            let scale = 1.0 / pivot;
            work.scale_row(col, scale);
            inverse.scale_row(col, scale);

            for row in 0..size {
                if row == col {
                    continue;
                }
                let factor = work[(row, col)];
                if factor == 0.0 {
                    continue;
                }
                work.eliminate(row, col, factor);
                inverse.eliminate(row, col, factor);
            }
        }

        if !inverse.is_finite() {
            return Err(ChainError::numerical("inverse holds non-finite entries"));
        }
        Ok(inverse)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }

    fn scale_row(&mut self, row: usize, scale: f64) {
        for j in 0..self.cols {
            self[(row, j)] *= scale;
        }
    }

    /// `row -= factor * source`.
    fn eliminate(&mut self, row: usize, source: usize, factor: f64) {
        for j in 0..self.cols {
            let delta = factor * self[(source, j)];
            self[(row, j)] -= delta;
        }
    }
}

impl Index<(usize, usize)> for DenseMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for DenseMatrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        &mut self.data[row * self.cols + col]
    }
}
