//! Face-local coordinates of a point on a cage face.
//!
//! - Triangles: closed-form barycentric coordinates.
//! - Quads: bilinear coordinates `(u, v)` found by Gauss-Newton iteration.

use nalgebra::{Matrix2, Point3, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Residual / step tolerance of the bilinear inversion.
pub const BILINEAR_TOLERANCE: f64 = 1e-6;

/// Iteration cap of the bilinear inversion.
pub const BILINEAR_MAX_ITERATIONS: usize = 50;

/// Singular values of the Gram matrix below this fraction of its norm are dropped.
const GRAM_RANK_TOLERANCE: f64 = 1e-12;

/// Barycentric coordinates of `p` with respect to triangle `(p0, p1, p2)`.
///
/// Solves the 2×2 normal equations of the edge-vector projection, so points
/// off the triangle's plane are projected first. Weights sum to 1.
///
/// A zero-area triangle yields `[0.0, 0.0, 0.0]`. That breaks partition of
/// unity; callers that care should check for it.
///
/// # Example
///
/// ```
/// use mesh_harmonic::triangle_coordinates;
/// use nalgebra::Point3;
///
/// let w = triangle_coordinates(
///     &Point3::new(0.25, 0.25, 0.0),
///     &Point3::new(0.0, 0.0, 0.0),
///     &Point3::new(1.0, 0.0, 0.0),
///     &Point3::new(0.0, 1.0, 0.0),
/// );
/// assert!((w[0] - 0.5).abs() < 1e-12);
/// assert!((w[1] - 0.25).abs() < 1e-12);
/// assert!((w[2] - 0.25).abs() < 1e-12);
/// ```
#[must_use]
pub fn triangle_coordinates(
    p: &Point3<f64>,
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> [f64; 3] {
    let v0 = p1 - p0;
    let v1 = p2 - p0;
    let v2 = p - p0;

    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);

    let denom = d00 * d11 - d01 * d01;
    if denom == 0.0 {
        return [0.0; 3];
    }

    let w1 = (d11 * d20 - d01 * d21) / denom;
    let w2 = (d00 * d21 - d01 * d20) / denom;
    [1.0 - w1 - w2, w1, w2]
}

/// Result of inverting the bilinear map of a quad.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BilinearCoordinates {
    /// Corner weights `((1-u)(1-v), u(1-v), uv, (1-u)v)`.
    pub weights: [f64; 4],
    /// Parameter along edge `p0 → p1`.
    pub u: f64,
    /// Parameter along edge `p0 → p3`.
    pub v: f64,
    /// Gauss-Newton iterations performed.
    pub iterations: usize,
    /// Whether the residual or the step fell below [`BILINEAR_TOLERANCE`].
    ///
    /// `false` means the iteration cap was reached or the quad is collapsed
    /// to a point; the weights are then the last estimate.
    pub converged: bool,
}

impl BilinearCoordinates {
    fn at(u: f64, v: f64, iterations: usize, converged: bool) -> Self {
        Self {
            weights: [(1.0 - u) * (1.0 - v), u * (1.0 - v), u * v, (1.0 - u) * v],
            u,
            v,
            iterations,
            converged,
        }
    }
}

/// Bilinear coordinates of `p` with respect to quad `(p0, p1, p2, p3)`.
///
/// Finds `(u, v) ∈ [0, 1]²` minimising `‖B(u, v) - p‖` where
/// `B(u, v) = (1-u)(1-v)·p0 + u(1-v)·p1 + uv·p2 + (1-u)v·p3`,
/// by Gauss-Newton from `(0.5, 0.5)` with both parameters clamped after every
/// step. Stops when the residual or the step drops below
/// [`BILINEAR_TOLERANCE`], or after [`BILINEAR_MAX_ITERATIONS`].
///
/// Each step is the least-squares solution of the 2×2 normal equations, so a
/// rank-deficient Gram matrix (a quad with a collapsed edge) still moves along
/// the direction it does constrain.
///
/// # Example
///
/// ```
/// use mesh_harmonic::quad_coordinates;
/// use nalgebra::Point3;
///
/// let c = quad_coordinates(
///     &Point3::new(0.75, 0.5, 0.0),
///     &Point3::new(0.0, 0.0, 0.0),
///     &Point3::new(1.0, 0.0, 0.0),
///     &Point3::new(1.0, 1.0, 0.0),
///     &Point3::new(0.0, 1.0, 0.0),
/// );
/// assert!(c.converged);
/// assert!((c.u - 0.75).abs() < 1e-6);
/// assert!((c.v - 0.5).abs() < 1e-6);
/// ```
#[must_use]
pub fn quad_coordinates(
    p: &Point3<f64>,
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    p3: &Point3<f64>,
) -> BilinearCoordinates {
    let (p0, p1, p2, p3) = (p0.coords, p1.coords, p2.coords, p3.coords);
    let mut u = 0.5;
    let mut v = 0.5;

    for iteration in 0..BILINEAR_MAX_ITERATIONS {
        let estimate =
            p0 * ((1.0 - u) * (1.0 - v)) + p1 * (u * (1.0 - v)) + p2 * (u * v) + p3 * ((1.0 - u) * v);
        let f = estimate - p.coords;
        if f.norm() < BILINEAR_TOLERANCE {
            return BilinearCoordinates::at(u, v, iteration, true);
        }

        let fu = (p1 - p0) * (1.0 - v) + (p2 - p3) * v;
        let fv = (p3 - p0) * (1.0 - u) + (p2 - p1) * u;

        let fuv = fu.dot(&fv);
        let gram = Matrix2::new(fu.dot(&fu), fuv, fuv, fv.dot(&fv));
        let rhs = Vector2::new(-f.dot(&fu), -f.dot(&fv));

        let norm = gram.norm();
        if norm == 0.0 || !norm.is_finite() {
            return BilinearCoordinates::at(u, v, iteration + 1, false);
        }
        let Ok(delta) = gram
            .svd(true, true)
            .solve(&rhs, GRAM_RANK_TOLERANCE * norm)
        else {
            return BilinearCoordinates::at(u, v, iteration + 1, false);
        };

        u = (u + delta.x).clamp(0.0, 1.0);
        v = (v + delta.y).clamp(0.0, 1.0);

        if delta.norm() < BILINEAR_TOLERANCE {
            return BilinearCoordinates::at(u, v, iteration + 1, true);
        }
    }

    BilinearCoordinates::at(u, v, BILINEAR_MAX_ITERATIONS, false)
}
