//! Closest-point queries against cage faces.
//!
//! Exhaustive search over every face; there is no acceleration structure.
//! Quads are measured as the two triangles `(0, 1, 2)` and `(0, 2, 3)`, which
//! is exact for planar quads.

use nalgebra::Point3;

/// Closest point on triangle `(a, b, c)` to `p`.
///
/// Voronoi-region walk from "Real-Time Collision Detection" (Ericson, 5.1.5).
/// Degenerate triangles fall through to the edge or vertex regions.
///
/// # Example
///
/// ```
/// use mesh_cage::closest_point_on_triangle;
/// use nalgebra::Point3;
///
/// let a = Point3::new(0.0, 0.0, 0.0);
/// let b = Point3::new(1.0, 0.0, 0.0);
/// let c = Point3::new(0.0, 1.0, 0.0);
///
/// let q = closest_point_on_triangle(&Point3::new(0.25, 0.25, 3.0), &a, &b, &c);
/// assert!((q - Point3::new(0.25, 0.25, 0.0)).norm() < 1e-12);
/// ```
#[must_use]
pub fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;

    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    let e = d4 - d3;
    let f = d5 - d6;
    if va <= 0.0 && e >= 0.0 && f >= 0.0 {
        return b + (c - b) * (e / (e + f));
    }

    let sum = va + vb + vc;
    if sum == 0.0 {
        // Zero-area triangle whose regions all collapsed; fall back to a corner.
        return *a;
    }
    a + ab * (vb / sum) + ac * (vc / sum)
}

/// Closest point on quad `(a, b, c, d)` to `p`.
///
/// The quad is split along the `a`-`c` diagonal.
///
/// # Example
///
/// ```
/// use mesh_cage::closest_point_on_quad;
/// use nalgebra::Point3;
///
/// let q = closest_point_on_quad(
///     &Point3::new(0.9, 0.8, -2.0),
///     &Point3::new(0.0, 0.0, 0.0),
///     &Point3::new(1.0, 0.0, 0.0),
///     &Point3::new(1.0, 1.0, 0.0),
///     &Point3::new(0.0, 1.0, 0.0),
/// );
/// assert!((q - Point3::new(0.9, 0.8, 0.0)).norm() < 1e-12);
/// ```
#[must_use]
pub fn closest_point_on_quad(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> Point3<f64> {
    let first = closest_point_on_triangle(p, a, b, c);
    let second = closest_point_on_triangle(p, a, c, d);
    if (second - p).norm_squared() < (first - p).norm_squared() {
        second
    } else {
        first
    }
}
