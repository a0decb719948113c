//! Geometry access traits consumed by cage-based solvers.
//!
//! A solver never touches a host mesh type directly. It reads cage and target
//! data through [`CageGeometry`] and [`TargetGeometry`], so any mesh
//! representation (scene graph node, file loader, test fixture) can be plugged
//! in by implementing these two traits.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::CageResult;

/// Result of a closest-point query against the cage surface.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClosestHit {
    /// Distance from the query point to `point`.
    pub distance: f64,
    /// Closest point on the cage surface.
    pub point: Point3<f64>,
    /// Global index of the face containing `point`.
    pub face: usize,
}

/// Read access to a cage and its closest-point query.
///
/// Faces are exposed in the counts + index stream layout: face `f` has
/// `face_counts()[f]` vertices, stored consecutively in `face_indices()`.
pub trait CageGeometry: Sync {
    /// Cage vertex positions.
    fn vertices(&self) -> &[Point3<f64>];

    /// Number of vertices of each face, in face order.
    fn face_counts(&self) -> &[u32];

    /// All face vertex indices, concatenated in face order.
    fn face_indices(&self) -> &[u32];

    /// Find the point on the cage surface closest to `query`.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the query cannot be answered.
    fn closest_point(&self, query: &Point3<f64>) -> CageResult<ClosestHit>;

    /// Iterate over faces as vertex index slices.
    ///
    /// Stops early if the counts run past the end of the index stream.
    fn faces(&self) -> Faces<'_> {
        Faces {
            counts: self.face_counts().iter(),
            indices: self.face_indices(),
        }
    }
}

/// Read access to the vertices being bound to a cage.
pub trait TargetGeometry: Sync {
    /// Target vertex positions.
    fn vertices(&self) -> &[Point3<f64>];
}

impl TargetGeometry for [Point3<f64>] {
    fn vertices(&self) -> &[Point3<f64>] {
        self
    }
}

impl TargetGeometry for Vec<Point3<f64>> {
    fn vertices(&self) -> &[Point3<f64>] {
        self
    }
}

/// Iterator over the faces of a [`CageGeometry`].
#[derive(Debug, Clone)]
pub struct Faces<'a> {
    counts: std::slice::Iter<'a, u32>,
    indices: &'a [u32],
}

impl<'a> Iterator for Faces<'a> {
    type Item = &'a [u32];

    fn next(&mut self) -> Option<Self::Item> {
        let count = *self.counts.next()? as usize;
        if count > self.indices.len() {
            return None;
        }
        let (face, rest) = self.indices.split_at(count);
        self.indices = rest;
        Some(face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CageError;

    struct Raw {
        vertices: Vec<Point3<f64>>,
        counts: Vec<u32>,
        indices: Vec<u32>,
    }

    impl CageGeometry for Raw {
        fn vertices(&self) -> &[Point3<f64>] {
            &self.vertices
        }

        fn face_counts(&self) -> &[u32] {
            &self.counts
        }

        fn face_indices(&self) -> &[u32] {
            &self.indices
        }

        fn closest_point(&self, _query: &Point3<f64>) -> CageResult<ClosestHit> {
            Err(CageError::QueryFailed("not supported".into()))
        }
    }

    #[test]
    fn faces_iterates_mixed_arity() {
        let raw = Raw {
            vertices: vec![Point3::origin(); 5],
            counts: vec![3, 4, 5],
            indices: vec![0, 1, 2, 1, 2, 3, 4, 0, 1, 2, 3, 4],
        };
        let faces: Vec<&[u32]> = raw.faces().collect();
        assert_eq!(faces.len(), 3);
        assert_eq!(faces[0], &[0, 1, 2]);
        assert_eq!(faces[1], &[1, 2, 3, 4]);
        assert_eq!(faces[2], &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn faces_stops_on_truncated_stream() {
        let raw = Raw {
            vertices: vec![Point3::origin(); 3],
            counts: vec![3, 3],
            indices: vec![0, 1, 2, 0],
        };
        assert_eq!(raw.faces().count(), 1);
    }

    #[test]
    fn point_slices_are_targets() {
        let points = vec![Point3::new(1.0, 2.0, 3.0)];
        assert_eq!(TargetGeometry::vertices(&points).len(), 1);
        assert_eq!(TargetGeometry::vertices(points.as_slice()).len(), 1);
    }
}
