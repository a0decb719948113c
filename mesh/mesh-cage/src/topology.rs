//! Face classification for mixed triangle/quad cages.
//!
//! A cage face is stored once in a type-specific table (`tri_faces` or
//! `quad_faces`). Every global face index maps to a [`FaceKind`] and a dense
//! local index into the matching table.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{CageError, CageResult};

/// The kind of a cage face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FaceKind {
    /// Three-vertex face.
    Triangle,
    /// Four-vertex face.
    Quad,
}

impl FaceKind {
    /// Classify a face by its vertex count.
    ///
    /// Returns `None` for anything other than 3 or 4.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_cage::FaceKind;
    ///
    /// assert_eq!(FaceKind::from_arity(3), Some(FaceKind::Triangle));
    /// assert_eq!(FaceKind::from_arity(4), Some(FaceKind::Quad));
    /// assert_eq!(FaceKind::from_arity(5), None);
    /// ```
    #[must_use]
    pub const fn from_arity(arity: usize) -> Option<Self> {
        match arity {
            3 => Some(Self::Triangle),
            4 => Some(Self::Quad),
            _ => None,
        }
    }

    /// Number of vertices of this face kind.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Triangle => 3,
            Self::Quad => 4,
        }
    }
}

/// Partition of a cage's faces into triangles and quads.
///
/// Built once from face connectivity and immutable afterwards. Local indices
/// are dense per kind and assigned in face order, starting at 0.
///
/// # Example
///
/// ```
/// use mesh_cage::{CageTopology, FaceKind};
///
/// // One quad followed by one triangle.
/// let topology = CageTopology::new(&[4, 3], &[0, 1, 2, 3, 0, 2, 4], 5).unwrap();
///
/// assert_eq!(topology.quad_count(), 1);
/// assert_eq!(topology.triangle_count(), 1);
/// assert_eq!(topology.kind(1), Some(FaceKind::Triangle));
/// assert_eq!(topology.local_index(1), Some(0));
/// assert_eq!(topology.face_vertices(1), Some(&[0, 2, 4][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CageTopology {
    kinds: Vec<FaceKind>,
    local: Vec<usize>,
    tri_faces: Vec<[u32; 3]>,
    quad_faces: Vec<[u32; 4]>,
}

impl CageTopology {
    /// Classify faces given per-face vertex counts and the concatenated index stream.
    ///
    /// # Arguments
    ///
    /// * `face_counts` - Number of vertices of each face, in face order
    /// * `face_indices` - All face vertex indices, concatenated in face order
    /// * `vertex_count` - Number of cage vertices, for range checking
    ///
    /// # Errors
    ///
    /// - [`CageError::UnsupportedTopology`] if a face has arity other than 3 or 4
    /// - [`CageError::FaceStreamMismatch`] if the counts and the stream disagree
    /// - [`CageError::VertexIndexOutOfRange`] if an index is not a cage vertex
    pub fn new(face_counts: &[u32], face_indices: &[u32], vertex_count: usize) -> CageResult<Self> {
        let mut kinds = Vec::with_capacity(face_counts.len());
        let mut expected = 0usize;

        for (face, &count) in face_counts.iter().enumerate() {
            let arity = count as usize;
            let kind = FaceKind::from_arity(arity)
                .ok_or(CageError::UnsupportedTopology { face, arity })?;
            kinds.push(kind);
            expected += arity;
        }

        if expected != face_indices.len() {
            return Err(CageError::FaceStreamMismatch {
                expected,
                actual: face_indices.len(),
            });
        }

        let mut local = Vec::with_capacity(kinds.len());
        let mut tri_faces = Vec::new();
        let mut quad_faces = Vec::new();
        let mut offset = 0;

        for (face, &kind) in kinds.iter().enumerate() {
            let indices = &face_indices[offset..offset + kind.arity()];
            offset += kind.arity();

            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(CageError::VertexIndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }

            match kind {
                FaceKind::Triangle => {
                    local.push(tri_faces.len());
                    tri_faces.push([indices[0], indices[1], indices[2]]);
                }
                FaceKind::Quad => {
                    local.push(quad_faces.len());
                    quad_faces.push([indices[0], indices[1], indices[2], indices[3]]);
                }
            }
        }

        Ok(Self {
            kinds,
            local,
            tri_faces,
            quad_faces,
        })
    }

    /// Classify faces given as individual index lists.
    ///
    /// # Errors
    ///
    /// Same as [`CageTopology::new`].
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_cage::CageTopology;
    ///
    /// let faces: Vec<Vec<u32>> = vec![vec![0, 1, 2], vec![0, 2, 3, 1]];
    /// let topology = CageTopology::from_faces(&faces, 4).unwrap();
    /// assert_eq!(topology.face_count(), 2);
    /// ```
    pub fn from_faces<F: AsRef<[u32]>>(
        faces: impl IntoIterator<Item = F>,
        vertex_count: usize,
    ) -> CageResult<Self> {
        let (counts, indices) = flatten_faces(faces);
        Self::new(&counts, &indices, vertex_count)
    }

    /// Topology of a cage made only of quads, in the given order.
    pub(crate) fn from_quads(quad_faces: Vec<[u32; 4]>) -> Self {
        Self {
            kinds: vec![FaceKind::Quad; quad_faces.len()],
            local: (0..quad_faces.len()).collect(),
            tri_faces: Vec::new(),
            quad_faces,
        }
    }

    /// Total number of faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.kinds.len()
    }

    /// Number of triangle faces.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.tri_faces.len()
    }

    /// Number of quad faces.
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.quad_faces.len()
    }

    /// Kind of a global face, or `None` if out of range.
    #[must_use]
    pub fn kind(&self, face: usize) -> Option<FaceKind> {
        self.kinds.get(face).copied()
    }

    /// Local index of a global face into its kind's table.
    #[must_use]
    pub fn local_index(&self, face: usize) -> Option<usize> {
        self.local.get(face).copied()
    }

    /// Cage vertex indices of a global face.
    #[must_use]
    pub fn face_vertices(&self, face: usize) -> Option<&[u32]> {
        let local = self.local_index(face)?;
        match self.kind(face)? {
            FaceKind::Triangle => self.tri_faces.get(local).map(|f| &f[..]),
            FaceKind::Quad => self.quad_faces.get(local).map(|f| &f[..]),
        }
    }

    /// All triangle faces, indexed by local triangle index.
    #[must_use]
    pub fn tri_faces(&self) -> &[[u32; 3]] {
        &self.tri_faces
    }

    /// All quad faces, indexed by local quad index.
    #[must_use]
    pub fn quad_faces(&self) -> &[[u32; 4]] {
        &self.quad_faces
    }

    /// Reconstruct a point from face-local weights.
    ///
    /// Computes `Σ w_k · vertices[face[k]]`. Returns `None` if the face does
    /// not exist, `weights` has the wrong length, or a vertex is missing.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_cage::CageTopology;
    /// use nalgebra::Point3;
    ///
    /// let vertices = [
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(2.0, 0.0, 0.0),
    ///     Point3::new(0.0, 2.0, 0.0),
    /// ];
    /// let topology = CageTopology::new(&[3], &[0, 1, 2], 3).unwrap();
    /// let p = topology.interpolate(0, &[0.5, 0.25, 0.25], &vertices).unwrap();
    /// assert!((p - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-12);
    /// ```
    #[must_use]
    pub fn interpolate(
        &self,
        face: usize,
        weights: &[f64],
        vertices: &[Point3<f64>],
    ) -> Option<Point3<f64>> {
        let indices = self.face_vertices(face)?;
        if indices.len() != weights.len() {
            return None;
        }

        let mut sum = Point3::origin();
        for (&index, &w) in indices.iter().zip(weights) {
            sum.coords += vertices.get(index as usize)?.coords * w;
        }
        Some(sum)
    }
}

/// Flatten index lists into the counts + stream layout.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn flatten_faces<F: AsRef<[u32]>>(
    faces: impl IntoIterator<Item = F>,
) -> (Vec<u32>, Vec<u32>) {
    let mut counts = Vec::new();
    let mut indices = Vec::new();
    for face in faces {
        let face = face.as_ref();
        counts.push(face.len() as u32);
        indices.extend_from_slice(face);
    }
    (counts, indices)
}
