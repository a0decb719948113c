//! Linear blend deformation driven by harmonic weights.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::weights::HarmonicWeights;
use crate::{HarmonicError, HarmonicResult};

/// Vertex count above which deformation runs on the rayon pool.
const PARALLEL_THRESHOLD: usize = 1000;

/// Moves target vertices with the cage.
///
/// Each deformed vertex is `orig + envelope · (Σ_j w[i, j] · cage[j] - orig)`.
/// With `envelope = 1` and an undeformed cage, harmonic weights reproduce the
/// original positions up to their accuracy.
///
/// # Example
///
/// ```
/// use mesh_harmonic::{HarmonicWeights, LinearBlend};
/// use nalgebra::Point3;
///
/// // One target vertex halfway between two cage vertices.
/// let weights = HarmonicWeights::from_row_major(1, 2, vec![0.5, 0.5]).unwrap();
/// let blend = LinearBlend::new(&weights);
///
/// let cage = [Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 0.0)];
/// let original = [Point3::new(0.5, 0.5, 0.0)];
///
/// let moved = blend.deform(&cage, &original, 1.0).unwrap();
/// assert_eq!(moved[0], Point3::new(1.0, 1.0, 0.0));
///
/// let half = blend.deform(&cage, &original, 0.5).unwrap();
/// assert_eq!(half[0], Point3::new(0.75, 0.75, 0.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LinearBlend<'a> {
    weights: &'a HarmonicWeights,
}

impl<'a> LinearBlend<'a> {
    /// Deformer over precomputed weights.
    #[must_use]
    pub const fn new(weights: &'a HarmonicWeights) -> Self {
        Self { weights }
    }

    /// Deformed copies of `original` for the cage posed at `cage_vertices`.
    ///
    /// `envelope` is clamped to `[0, 1]`; 0 returns `original` unchanged.
    ///
    /// # Errors
    ///
    /// - [`HarmonicError::InvalidParameter`] if `envelope` is not finite
    /// - [`HarmonicError::DimensionMismatch`] if the weights are not
    ///   `original.len() × cage_vertices.len()`
    pub fn deform(
        &self,
        cage_vertices: &[Point3<f64>],
        original: &[Point3<f64>],
        envelope: f64,
    ) -> HarmonicResult<Vec<Point3<f64>>> {
        let mut positions = original.to_vec();
        self.deform_in_place(cage_vertices, &mut positions, envelope)?;
        Ok(positions)
    }

    /// Like [`deform`](Self::deform), overwriting `positions`.
    ///
    /// # Errors
    ///
    /// As [`deform`](Self::deform). `positions` is untouched on error.
    pub fn deform_in_place(
        &self,
        cage_vertices: &[Point3<f64>],
        positions: &mut [Point3<f64>],
        envelope: f64,
    ) -> HarmonicResult<()> {
        if !envelope.is_finite() {
            return Err(HarmonicError::InvalidParameter(format!(
                "envelope must be finite, got {envelope}"
            )));
        }
        if self.weights.rows() != positions.len() || self.weights.cols() != cage_vertices.len() {
            return Err(HarmonicError::DimensionMismatch {
                expected_rows: positions.len(),
                expected_cols: cage_vertices.len(),
                rows: self.weights.rows(),
                cols: self.weights.cols(),
            });
        }

        let envelope = envelope.clamp(0.0, 1.0);
        if envelope == 0.0 {
            return Ok(());
        }

        debug!(
            vertices = positions.len(),
            cage_vertices = cage_vertices.len(),
            envelope,
            "Applying linear blend"
        );

        let blend = |(row, position): (&[f64], &mut Point3<f64>)| {
            let cage_position = row
                .iter()
                .zip(cage_vertices)
                .fold(Vector3::zeros(), |acc, (w, c)| acc + c.coords * *w);
            let delta = (cage_position - position.coords) * envelope;
            *position += delta;
        };

        if positions.len() > PARALLEL_THRESHOLD {
            self.rows()
                .into_par_iter()
                .zip(positions.par_iter_mut())
                .for_each(blend);
        } else {
            self.rows().into_iter().zip(positions.iter_mut()).for_each(blend);
        }
        Ok(())
    }

    fn rows(&self) -> Vec<&'a [f64]> {
        self.weights.iter_rows().collect()
    }
}
