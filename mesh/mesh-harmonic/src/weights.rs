//! Dense harmonic weight matrix.

use std::ops::Index;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{HarmonicError, HarmonicResult};

/// Harmonic coordinates of every target vertex with respect to every cage vertex.
///
/// Stored row-major: row `i` holds the weights of target vertex `i`, column `j`
/// belongs to cage vertex `j`. The flat layout is the one deformers consume
/// directly (see [`as_slice`](Self::as_slice)).
///
/// # Example
///
/// ```
/// use mesh_harmonic::HarmonicWeights;
///
/// let w = HarmonicWeights::from_row_major(2, 3, vec![0.5, 0.25, 0.25, 0.0, 1.0, 0.0]).unwrap();
/// assert_eq!(w.rows(), 2);
/// assert_eq!(w.cols(), 3);
/// assert_eq!(w.row(1), Some(&[0.0, 1.0, 0.0][..]));
/// assert_eq!(w[(0, 1)], 0.25);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HarmonicWeights {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl HarmonicWeights {
    /// Wrap a flat row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`HarmonicError::DimensionMismatch`] if `data.len()` is not
    /// `rows * cols`. The buffer is then reported as a single `1 × len` row.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<f64>) -> HarmonicResult<Self> {
        if rows.checked_mul(cols) != Some(data.len()) {
            return Err(HarmonicError::DimensionMismatch {
                expected_rows: rows,
                expected_cols: cols,
                rows: 1,
                cols: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Assemble from per-vertex rows of equal length `cols`.
    pub(crate) fn from_rows(cols: usize, rows: Vec<Vec<f64>>) -> Self {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for row in rows {
            data.extend(row);
        }
        Self {
            rows: n,
            cols,
            data,
        }
    }

    /// Number of target vertices.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cage vertices.
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns `true` if there are no target vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Weight of cage vertex `cage` for target vertex `target`.
    #[must_use]
    pub fn get(&self, target: usize, cage: usize) -> Option<f64> {
        if target >= self.rows || cage >= self.cols {
            return None;
        }
        self.data.get(target * self.cols + cage).copied()
    }

    /// All weights of target vertex `target`.
    #[must_use]
    pub fn row(&self, target: usize) -> Option<&[f64]> {
        if target >= self.rows {
            return None;
        }
        self.data.get(target * self.cols..(target + 1) * self.cols)
    }

    /// Iterate over the rows.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact panics on zero; an empty cage has no columns to walk.
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// Sum of every row.
    ///
    /// Each is 1 up to Monte Carlo noise and floating-point error.
    #[must_use]
    pub fn row_sums(&self) -> Vec<f64> {
        if self.cols == 0 {
            return vec![0.0; self.rows];
        }
        self.iter_rows().map(|row| row.iter().sum()).collect()
    }

    /// Largest `|row sum - 1|` over all rows, or 0 for an empty matrix.
    #[must_use]
    pub fn max_partition_error(&self) -> f64 {
        self.row_sums()
            .iter()
            .map(|s| (s - 1.0).abs())
            .fold(0.0, f64::max)
    }

    /// The flat row-major buffer.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume into the flat row-major buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }
}

impl Index<(usize, usize)> for HarmonicWeights {
    type Output = f64;

    fn index(&self, (target, cage): (usize, usize)) -> &f64 {
        assert!(
            target < self.rows && cage < self.cols,
            "weight index ({target}, {cage}) out of bounds for {}×{} matrix",
            self.rows,
            self.cols
        );
        &self.data[target * self.cols + cage]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> HarmonicWeights {
        HarmonicWeights::from_row_major(3, 2, vec![0.5, 0.5, 1.0, 0.0, 0.3, 0.6]).unwrap()
    }

    #[test]
    fn shape_and_access() {
        let w = sample();
        assert_eq!(w.rows(), 3);
        assert_eq!(w.cols(), 2);
        assert!(!w.is_empty());
        assert_eq!(w.get(2, 1), Some(0.6));
        assert_eq!(w.get(3, 0), None);
        assert_eq!(w.get(0, 2), None);
        assert_eq!(w.row(1), Some(&[1.0, 0.0][..]));
        assert_eq!(w.row(3), None);
        assert_relative_eq!(w[(0, 0)], 0.5);
        assert_eq!(w.iter_rows().count(), 3);
    }

    #[test]
    fn row_sums_and_partition_error() {
        let w = sample();
        let sums = w.row_sums();
        assert_relative_eq!(sums[0], 1.0);
        assert_relative_eq!(sums[1], 1.0);
        assert_relative_eq!(sums[2], 0.9, epsilon = 1e-12);
        assert_relative_eq!(w.max_partition_error(), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn buffer_length_must_match_shape() {
        let err = HarmonicWeights::from_row_major(2, 3, vec![0.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            HarmonicError::DimensionMismatch {
                expected_rows: 2,
                expected_cols: 3,
                rows: 1,
                cols: 5,
            }
        ));
    }

    #[test]
    fn from_rows_is_row_major() {
        let w = HarmonicWeights::from_rows(2, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(w.as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(w.into_vec(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn empty_matrix() {
        let w = HarmonicWeights::from_rows(4, Vec::new());
        assert!(w.is_empty());
        assert!(w.row_sums().is_empty());
        assert_relative_eq!(w.max_partition_error(), 0.0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn index_out_of_bounds_panics() {
        let _ = sample()[(0, 2)];
    }
}
