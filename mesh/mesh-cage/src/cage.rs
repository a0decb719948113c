//! In-memory cage and target meshes.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::error::{CageError, CageResult};
use crate::geometry::{CageGeometry, ClosestHit, TargetGeometry};
use crate::query::{closest_point_on_quad, closest_point_on_triangle};
use crate::topology::{CageTopology, FaceKind, flatten_faces};

/// A control cage made of triangles and quads.
///
/// Faces are stored in the counts + index stream layout. Construction
/// validates every face, so a `CageMesh` always has at least one face, only
/// triangles and quads, and in-range indices.
///
/// The closest-point query is an exhaustive scan over all faces.
///
/// # Example
///
/// ```
/// use mesh_cage::{CageGeometry, CageMesh};
/// use nalgebra::Point3;
///
/// let cage = CageMesh::unit_cube();
/// let hit = cage.closest_point(&Point3::new(0.5, 0.5, 0.9)).unwrap();
///
/// assert!((hit.distance - 0.1).abs() < 1e-12);
/// assert!((hit.point.z - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CageMesh {
    vertices: Vec<Point3<f64>>,
    face_counts: Vec<u32>,
    face_indices: Vec<u32>,
    topology: CageTopology,
}

impl CageMesh {
    /// Build a cage from vertices, per-face counts and the index stream.
    ///
    /// # Errors
    ///
    /// - [`CageError::EmptyCage`] if there are no vertices or no faces
    /// - any error of [`CageTopology::new`]
    pub fn new(
        vertices: Vec<Point3<f64>>,
        face_counts: Vec<u32>,
        face_indices: Vec<u32>,
    ) -> CageResult<Self> {
        if vertices.is_empty() || face_counts.is_empty() {
            return Err(CageError::EmptyCage);
        }

        let topology = CageTopology::new(&face_counts, &face_indices, vertices.len())?;

        Ok(Self {
            vertices,
            face_counts,
            face_indices,
            topology,
        })
    }

    /// Build a cage from vertices and per-face index lists.
    ///
    /// # Errors
    ///
    /// Same as [`CageMesh::new`].
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_cage::CageMesh;
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    ///     Point3::new(0.0, 0.0, 1.0),
    /// ];
    /// let faces: [[u32; 3]; 4] = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
    /// let tetra = CageMesh::from_faces(vertices, &faces).unwrap();
    /// assert_eq!(tetra.face_count(), 4);
    /// ```
    pub fn from_faces<F: AsRef<[u32]>>(
        vertices: Vec<Point3<f64>>,
        faces: impl IntoIterator<Item = F>,
    ) -> CageResult<Self> {
        let (counts, indices) = flatten_faces(faces);
        Self::new(vertices, counts, indices)
    }

    /// Axis-aligned unit cube `[0, 1]³` with six outward-facing quads.
    #[must_use]
    pub fn unit_cube() -> Self {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let face_indices = vec![
            0, 3, 2, 1, // bottom
            4, 5, 6, 7, // top
            0, 1, 5, 4, // front
            2, 3, 7, 6, // back
            0, 4, 7, 3, // left
            1, 2, 6, 5, // right
        ];
        Self {
            topology: CageTopology::from_quads(
                face_indices
                    .chunks_exact(4)
                    .map(|q| [q[0], q[1], q[2], q[3]])
                    .collect(),
            ),
            vertices,
            face_counts: vec![4; 6],
            face_indices,
        }
    }

    /// Number of cage vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of cage faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.face_counts.len()
    }

    /// Triangle/quad classification of the faces.
    #[must_use]
    pub fn topology(&self) -> &CageTopology {
        &self.topology
    }

    /// Bounds of the cage vertices.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter())
    }

    fn closest_on_face(&self, query: &Point3<f64>, face: usize) -> Option<Point3<f64>> {
        let v = |i: u32| self.vertices.get(i as usize);
        let local = self.topology.local_index(face)?;
        match self.topology.kind(face)? {
            FaceKind::Triangle => {
                let [a, b, c] = *self.topology.tri_faces().get(local)?;
                Some(closest_point_on_triangle(query, v(a)?, v(b)?, v(c)?))
            }
            FaceKind::Quad => {
                let [a, b, c, d] = *self.topology.quad_faces().get(local)?;
                Some(closest_point_on_quad(query, v(a)?, v(b)?, v(c)?, v(d)?))
            }
        }
    }
}

impl CageGeometry for CageMesh {
    fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    fn face_counts(&self) -> &[u32] {
        &self.face_counts
    }

    fn face_indices(&self) -> &[u32] {
        &self.face_indices
    }

    fn closest_point(&self, query: &Point3<f64>) -> CageResult<ClosestHit> {
        if !query.coords.iter().all(|c| c.is_finite()) {
            return Err(CageError::QueryFailed(format!(
                "query point ({}, {}, {}) is not finite",
                query.x, query.y, query.z
            )));
        }

        let mut best: Option<(f64, Point3<f64>, usize)> = None;
        for face in 0..self.face_count() {
            let Some(point) = self.closest_on_face(query, face) else {
                continue;
            };
            let dist_sq = (point - query).norm_squared();
            if best.is_none_or(|(d, _, _)| dist_sq < d) {
                best = Some((dist_sq, point, face));
            }
        }

        best.map(|(dist_sq, point, face)| ClosestHit {
            distance: dist_sq.sqrt(),
            point,
            face,
        })
        .ok_or(CageError::EmptyCage)
    }
}

/// Vertices of a mesh bound to a cage.
///
/// Only positions matter to the solver; connectivity stays with the caller.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3<f64>>,
}

impl TargetMesh {
    /// Wrap a list of vertex positions.
    #[must_use]
    pub const fn new(vertices: Vec<Point3<f64>>) -> Self {
        Self { vertices }
    }

    /// Build from raw `[x, y, z]` coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_cage::TargetMesh;
    ///
    /// let target = TargetMesh::from_coords(&[[0.5, 0.5, 0.5], [0.25, 0.5, 0.75]]);
    /// assert_eq!(target.vertex_count(), 2);
    /// ```
    #[must_use]
    pub fn from_coords(coords: &[[f64; 3]]) -> Self {
        Self {
            vertices: coords.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect(),
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

impl TargetGeometry for TargetMesh {
    fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unit_cube_matches_validated_construction() {
        let cube = CageMesh::unit_cube();
        let rebuilt = CageMesh::new(
            cube.vertices.clone(),
            cube.face_counts.clone(),
            cube.face_indices.clone(),
        )
        .unwrap();
        assert_eq!(cube.topology, rebuilt.topology);
        assert_eq!(cube.topology().quad_count(), 6);
        assert_eq!(cube.vertex_count(), 8);
    }

    #[test]
    fn rejects_empty_cage() {
        assert!(matches!(
            CageMesh::new(Vec::new(), Vec::new(), Vec::new()),
            Err(CageError::EmptyCage)
        ));
        assert!(matches!(
            CageMesh::new(vec![Point3::origin()], Vec::new(), Vec::new()),
            Err(CageError::EmptyCage)
        ));
    }

    #[test]
    fn rejects_pentagon_face() {
        let vertices = vec![Point3::origin(); 5];
        let result = CageMesh::from_faces(vertices, [[0u32, 1, 2, 3, 4]]);
        assert!(matches!(
            result,
            Err(CageError::UnsupportedTopology { face: 0, arity: 5 })
        ));
    }

    #[test]
    fn closest_point_picks_nearest_face() {
        let cube = CageMesh::unit_cube();

        let hit = cube.closest_point(&Point3::new(0.2, 0.5, 0.5)).unwrap();
        assert_relative_eq!(hit.distance, 0.2, epsilon = 1e-12);
        assert_relative_eq!(hit.point, Point3::new(0.0, 0.5, 0.5), epsilon = 1e-12);
        // Left face.
        assert_eq!(hit.face, 4);

        let hit = cube.closest_point(&Point3::new(0.5, 0.95, 0.4)).unwrap();
        assert_relative_eq!(hit.distance, 0.05, epsilon = 1e-12);
        assert_eq!(hit.face, 3);
    }

    #[test]
    fn closest_point_on_surface_is_zero_distance() {
        let cube = CageMesh::unit_cube();
        let hit = cube.closest_point(&Point3::new(0.3, 0.7, 1.0)).unwrap();
        assert_relative_eq!(hit.distance, 0.0, epsilon = 1e-12);
        assert_eq!(hit.face, 1);
    }

    #[test]
    fn closest_point_outside_cage() {
        let cube = CageMesh::unit_cube();
        let hit = cube.closest_point(&Point3::new(2.0, 2.0, 2.0)).unwrap();
        assert_relative_eq!(hit.point, Point3::new(1.0, 1.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(hit.distance, 3.0_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn non_finite_query_fails() {
        let cube = CageMesh::unit_cube();
        let result = cube.closest_point(&Point3::new(f64::NAN, 0.0, 0.0));
        assert!(matches!(result, Err(CageError::QueryFailed(_))));
    }

    #[test]
    fn mixed_cage_closest_point() {
        // Square pyramid: quad base, four triangle sides.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces: Vec<Vec<u32>> = vec![
            vec![0, 3, 2, 1],
            vec![0, 1, 4],
            vec![1, 2, 4],
            vec![2, 3, 4],
            vec![3, 0, 4],
        ];
        let pyramid = CageMesh::from_faces(vertices, &faces).unwrap();
        assert_eq!(pyramid.topology().triangle_count(), 4);

        let hit = pyramid.closest_point(&Point3::new(0.5, 0.5, 0.05)).unwrap();
        assert_eq!(hit.face, 0);
        assert_relative_eq!(hit.distance, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn target_mesh_from_coords() {
        let target = TargetMesh::from_coords(&[[1.0, 2.0, 3.0]]);
        assert_eq!(target.vertices[0], Point3::new(1.0, 2.0, 3.0));
        assert_eq!(TargetGeometry::vertices(&target).len(), 1);
    }

    #[test]
    fn bounds_cover_cage() {
        let cube = CageMesh::unit_cube();
        let bounds = cube.bounds();
        assert!(bounds.contains(&Point3::new(0.5, 0.5, 0.5)));
        assert_relative_eq!(bounds.diagonal(), 3.0_f64.sqrt(), epsilon = 1e-12);
    }
}
