//! Error types for harmonic coordinate computation.

use mesh_cage::CageError;
use thiserror::Error;

/// Errors that can occur while computing or applying harmonic weights.
///
/// Every error aborts the whole operation; no partial weight matrix is ever
/// returned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HarmonicError {
    /// A cage face is neither a triangle nor a quad.
    #[error("cage face {face} has {arity} vertices; only triangles and quads are supported")]
    UnsupportedTopology {
        /// Index of the offending face.
        face: usize,
        /// Number of vertices the face references.
        arity: usize,
    },

    /// The cage connectivity is malformed in some other way.
    #[error("invalid cage: {0}")]
    InvalidCage(#[source] CageError),

    /// The cage could not answer a closest-point query during a walk.
    #[error("closest-point query failed while walking from target vertex {vertex}")]
    ClosestPointQueryFailed {
        /// Target vertex whose walk was running.
        vertex: usize,
        /// Error reported by the cage geometry.
        #[source]
        source: CageError,
    },

    /// The accumulated 4×4 moment matrix of a target vertex is not invertible.
    #[error(
        "moment matrix of target vertex {vertex} is singular; \
         increase the walk count or move the vertex off the cage surface"
    )]
    SingularAccumulator {
        /// Target vertex whose matrix could not be inverted.
        vertex: usize,
    },

    /// A weight matrix does not match the geometry it is applied to.
    #[error(
        "weight matrix is {rows}×{cols} but the geometry needs \
         {expected_rows}×{expected_cols}"
    )]
    DimensionMismatch {
        /// Rows required by the geometry (target vertices).
        expected_rows: usize,
        /// Columns required by the geometry (cage vertices).
        expected_cols: usize,
        /// Rows of the supplied weights.
        rows: usize,
        /// Columns of the supplied weights.
        cols: usize,
    },

    /// A parameter is out of its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<CageError> for HarmonicError {
    fn from(err: CageError) -> Self {
        match err {
            CageError::UnsupportedTopology { face, arity } => {
                Self::UnsupportedTopology { face, arity }
            }
            other => Self::InvalidCage(other),
        }
    }
}

/// Result type for harmonic coordinate operations.
pub type HarmonicResult<T> = Result<T, HarmonicError>;
