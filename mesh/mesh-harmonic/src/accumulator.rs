//! Per-vertex walk statistics and the final regression solve.

use std::ops::AddAssign;

use nalgebra::{Matrix4, Point3, Vector4};

use crate::{HarmonicError, HarmonicResult};

/// Relative determinant below which a moment matrix counts as singular.
///
/// Compared against `|det M| / ‖M‖⁴`, which is invariant to the walk count.
const SINGULAR_TOLERANCE: f64 = 1e-13;

/// Boundary-hit statistics of the walks started from one target vertex.
///
/// Terminal points are expressed in a local frame centred on the target
/// vertex `p` and scaled by a cage length `L`. With `s = [(x - p) / L, 1]`
/// and `w_j` the face-local weight of cage vertex `j` at the hit:
///
/// - `M = Σ s sᵀ` (symmetric 4×4)
/// - `m[j] = Σ w_j s`
///
/// Both are plain sums, so partial accumulators built from disjoint sets of
/// walks in the same frame combine with `+=`. The weights are invariant under
/// affine changes of coordinates; the local frame only keeps `M` well
/// conditioned wherever the cage sits and whatever its size.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkAccumulator {
    origin: Point3<f64>,
    scale: f64,
    moments: Matrix4<f64>,
    cage_moments: Vec<Vector4<f64>>,
    walks: usize,
}

impl WalkAccumulator {
    /// Zeroed accumulator for a cage with `cage_vertex_count` vertices.
    ///
    /// `origin` is the target vertex the walks start from and `scale` a
    /// characteristic cage length, e.g. its bounding-box diagonal. A scale
    /// that is not finite and positive is replaced by `1.0`.
    #[must_use]
    pub fn new(cage_vertex_count: usize, origin: Point3<f64>, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self {
            origin,
            scale,
            moments: Matrix4::zeros(),
            cage_moments: vec![Vector4::zeros(); cage_vertex_count],
            walks: 0,
        }
    }

    /// Centre of the local frame.
    #[must_use]
    pub fn origin(&self) -> &Point3<f64> {
        &self.origin
    }

    /// Length unit of the local frame.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Record one walk's terminal point and its face-local weights.
    ///
    /// `point` is in world coordinates. `cage_vertices[k]` receives weight
    /// `weights[k]`.
    pub fn add_sample(&mut self, point: &Point3<f64>, cage_vertices: &[u32], weights: &[f64]) {
        let local = (point - self.origin) / self.scale;
        let sample = local.push(1.0);

        self.moments += sample * sample.transpose();
        for (&index, &w) in cage_vertices.iter().zip(weights) {
            if let Some(m) = self.cage_moments.get_mut(index as usize) {
                *m += sample * w;
            }
        }
        self.walks += 1;
    }

    /// Number of walks recorded.
    #[must_use]
    pub fn walks(&self) -> usize {
        self.walks
    }

    /// The accumulated `Σ s sᵀ`, in the local frame.
    #[must_use]
    pub fn moments(&self) -> &Matrix4<f64> {
        &self.moments
    }

    /// The accumulated `m[j]` of every cage vertex, in the local frame.
    #[must_use]
    pub fn cage_moments(&self) -> &[Vector4<f64>] {
        &self.cage_moments
    }

    /// Harmonic weights of the frame origin from the accumulated statistics.
    ///
    /// The origin is `[0, 0, 0, 1]` in the local frame, so this returns
    /// `w_j = e₄ᵀ M⁻¹ m[j]` for every cage vertex. `vertex` is only used to
    /// label errors.
    ///
    /// # Errors
    ///
    /// Returns [`HarmonicError::SingularAccumulator`] if `M` is not invertible,
    /// e.g. when every walk ended at the same point.
    pub fn solve(&self, vertex: usize) -> HarmonicResult<Vec<f64>> {
        let norm = self.moments.norm();
        let det = self.moments.determinant();
        if norm == 0.0 || !det.is_finite() || det.abs() <= SINGULAR_TOLERANCE * norm.powi(4) {
            return Err(HarmonicError::SingularAccumulator { vertex });
        }

        let inverse = self
            .moments
            .try_inverse()
            .ok_or(HarmonicError::SingularAccumulator { vertex })?;

        // e₄ᵀ M⁻¹ m[j] is the last row of M⁻¹ dotted with m[j]
        let q: Vector4<f64> = inverse.row(3).transpose();
        Ok(self.cage_moments.iter().map(|m| q.dot(m)).collect())
    }
}

/// Both sides must share the same frame.
impl AddAssign<&WalkAccumulator> for WalkAccumulator {
    fn add_assign(&mut self, rhs: &WalkAccumulator) {
        self.moments += rhs.moments;
        for (m, r) in self.cage_moments.iter_mut().zip(&rhs.cage_moments) {
            *m += r;
        }
        self.walks += rhs.walks;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    /// The eight corners of the unit cube, each tagged with its own cage vertex.
    fn cube_corners() -> Vec<(Point3<f64>, u32)> {
        [
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (1.0, 1.0, 0.0),
            (0.0, 1.0, 0.0),
            (0.0, 0.0, 1.0),
            (1.0, 0.0, 1.0),
            (1.0, 1.0, 1.0),
            (0.0, 1.0, 1.0),
        ]
        .into_iter()
        .zip(0u32..)
        .map(|((x, y, z), j)| (Point3::new(x, y, z), j))
        .collect()
    }

    fn accumulate(origin: Point3<f64>, scale: f64, hits: &[(Point3<f64>, u32)]) -> WalkAccumulator {
        let mut acc = WalkAccumulator::new(8, origin, scale);
        for (point, j) in hits {
            acc.add_sample(point, &[*j], &[1.0]);
        }
        acc
    }

    #[test]
    fn corner_hits_recover_trilinear_center() {
        let acc = accumulate(Point3::new(0.5, 0.5, 0.5), 3f64.sqrt(), &cube_corners());
        assert_eq!(acc.walks(), 8);

        let w = acc.solve(0).unwrap();
        assert_eq!(w.len(), 8);
        for wj in &w {
            assert_relative_eq!(*wj, 0.125, epsilon = 1e-12);
        }
    }

    #[test]
    fn weights_have_linear_precision() {
        let corners = cube_corners();
        let p = Point3::new(0.2, 0.7, 0.4);
        let w = accumulate(p, 1.0, &corners).solve(0).unwrap();
        assert_relative_eq!(w.iter().sum::<f64>(), 1.0, epsilon = 1e-12);

        let mut reconstructed = Vector3::zeros();
        for (wj, (corner, _)) in w.iter().zip(&corners) {
            reconstructed += corner.coords * *wj;
        }
        assert_relative_eq!(reconstructed, p.coords, epsilon = 1e-12);
    }

    #[test]
    fn weights_ignore_cage_placement_and_size() {
        let p = Point3::new(0.2, 0.7, 0.4);
        let reference = accumulate(p, 1.0, &cube_corners()).solve(0).unwrap();

        for (scale, offset) in [(1.0, 1.0e4), (1.0e-3, 0.0), (1.0e-3, 100.0), (1.0e3, -5.0e3)] {
            let moved = |q: &Point3<f64>| Point3::from(q.coords * scale + Vector3::repeat(offset));
            let hits: Vec<_> = cube_corners().iter().map(|(q, j)| (moved(q), *j)).collect();

            let w = accumulate(moved(&p), 3f64.sqrt() * scale, &hits)
                .solve(0)
                .unwrap();
            for (a, b) in w.iter().zip(&reference) {
                assert_relative_eq!(*a, *b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn merged_partials_equal_single_pass() {
        let corners = cube_corners();
        let origin = Point3::new(0.3, 0.3, 0.6);
        let whole = accumulate(origin, 1.0, &corners);

        let mut a = WalkAccumulator::new(8, origin, 1.0);
        let mut b = WalkAccumulator::new(8, origin, 1.0);
        for (k, (point, j)) in corners.iter().enumerate() {
            let part = if k % 2 == 0 { &mut a } else { &mut b };
            part.add_sample(point, &[*j], &[1.0]);
        }
        a += &b;

        assert_eq!(a.walks(), whole.walks());
        assert_relative_eq!(*a.moments(), *whole.moments(), epsilon = 1e-12);
        for (x, y) in a.cage_moments().iter().zip(whole.cage_moments()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn samples_are_stored_in_the_local_frame() {
        let mut acc = WalkAccumulator::new(1, Point3::new(10.0, 10.0, 10.0), 2.0);
        acc.add_sample(&Point3::new(12.0, 10.0, 9.0), &[0], &[0.5]);
        assert_relative_eq!(acc.cage_moments()[0], Vector4::new(0.5, 0.0, -0.25, 0.5));
        assert_relative_eq!(acc.moments()[(3, 3)], 1.0);
    }

    #[test]
    fn bad_scale_falls_back_to_unit() {
        assert_relative_eq!(WalkAccumulator::new(1, Point3::origin(), 0.0).scale(), 1.0);
        assert_relative_eq!(WalkAccumulator::new(1, Point3::origin(), f64::NAN).scale(), 1.0);
    }

    #[test]
    fn repeated_sample_is_singular() {
        let mut acc = WalkAccumulator::new(3, Point3::new(0.3, 0.2, 0.1), 1.0);
        let hit = Point3::new(0.3, 0.2, 0.0);
        for _ in 0..50 {
            acc.add_sample(&hit, &[0, 1, 2], &[0.5, 0.3, 0.2]);
        }
        assert!(matches!(
            acc.solve(4),
            Err(HarmonicError::SingularAccumulator { vertex: 4 })
        ));
    }

    #[test]
    fn empty_accumulator_is_singular() {
        let acc = WalkAccumulator::new(4, Point3::origin(), 1.0);
        assert!(acc.solve(0).is_err());
    }
}
