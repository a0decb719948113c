//! Error types for cage construction and queries.

use thiserror::Error;

/// Result type for cage operations.
pub type CageResult<T> = Result<T, CageError>;

/// Errors that can occur while building or querying a cage.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CageError {
    /// A face is neither a triangle nor a quad.
    #[error("face {face} has {arity} vertices; only triangles and quads are supported")]
    UnsupportedTopology {
        /// Index of the offending face.
        face: usize,
        /// Number of vertices the face references.
        arity: usize,
    },

    /// The per-face vertex counts do not add up to the index stream length.
    #[error("face counts reference {expected} indices but the index stream has {actual}")]
    FaceStreamMismatch {
        /// Sum of all face counts.
        expected: usize,
        /// Length of the index stream.
        actual: usize,
    },

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {index} (cage has {vertex_count} vertices)")]
    VertexIndexOutOfRange {
        /// Index of the offending face.
        face: usize,
        /// The invalid vertex index.
        index: u32,
        /// Number of vertices in the cage.
        vertex_count: usize,
    },

    /// The cage has no vertices or no faces.
    #[error("cage is empty")]
    EmptyCage,

    /// A closest-point query could not be answered.
    #[error("closest-point query failed: {0}")]
    QueryFailed(String),
}
