//! Property-based tests for cage closest-point queries.
//!
//! Run with: cargo test -p mesh-cage --test proptest_query

use mesh_cage::{CageGeometry, CageMesh, closest_point_on_triangle};
use nalgebra::Point3;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_point(range: f64) -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(-range..range).prop_map(|[x, y, z]| Point3::new(x, y, z))
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// The closest point on a triangle is never farther than any of its corners.
    #[test]
    fn triangle_closest_beats_corners(
        p in arb_point(5.0),
        a in arb_point(2.0),
        b in arb_point(2.0),
        c in arb_point(2.0),
    ) {
        prop_assume!((b - a).cross(&(c - a)).norm() > 0.1);

        let q = closest_point_on_triangle(&p, &a, &b, &c);
        let d = (p - q).norm();
        for corner in [a, b, c] {
            prop_assert!(d <= (p - corner).norm() + 1e-9);
        }
    }

    /// Inside the unit cube the distance to the cage is the distance to the nearest side.
    #[test]
    fn cube_distance_is_nearest_side(
        x in 0.01..0.99f64,
        y in 0.01..0.99f64,
        z in 0.01..0.99f64,
    ) {
        let cage = CageMesh::unit_cube();
        let hit = cage.closest_point(&Point3::new(x, y, z)).unwrap();
        let expected = [x, 1.0 - x, y, 1.0 - y, z, 1.0 - z]
            .into_iter()
            .fold(f64::INFINITY, f64::min);

        prop_assert!((hit.distance - expected).abs() < 1e-12);
        prop_assert!(hit.face < cage.face_count());
    }

    /// Any query point gets an answer whose distance matches the returned point.
    #[test]
    fn hit_distance_matches_point(p in arb_point(10.0)) {
        let cage = CageMesh::unit_cube();
        let hit = cage.closest_point(&p).unwrap();
        prop_assert!(((p - hit.point).norm() - hit.distance).abs() < 1e-12);
    }
}
