//! Cage and target geometry for cage-based deformation.
//!
//! A *cage* is a coarse closed mesh of triangles and quads that encloses a
//! finer *target* mesh. Cage-based deformers express every target vertex as a
//! weighted combination of cage vertices; this crate provides the geometry side
//! of that setup:
//!
//! - [`CageGeometry`] / [`TargetGeometry`] - the read-only interfaces solvers consume
//! - [`CageMesh`] / [`TargetMesh`] - in-memory implementations
//! - [`CageTopology`] - classification of cage faces into triangles and quads
//! - [`closest_point_on_triangle`] / [`closest_point_on_quad`] - surface queries
//! - [`Aabb`] - vertex bounds
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Example
//!
//! ```
//! use mesh_cage::{CageGeometry, CageMesh, FaceKind};
//! use nalgebra::Point3;
//!
//! let cage = CageMesh::unit_cube();
//! assert_eq!(cage.topology().kind(0), Some(FaceKind::Quad));
//!
//! let hit = cage.closest_point(&Point3::new(0.5, 0.5, 0.25)).unwrap();
//! assert_eq!(hit.face, 0); // bottom face
//! assert!((hit.distance - 0.25).abs() < 1e-12);
//! ```
//!
//! # Custom geometry
//!
//! Host applications usually own their meshes and their own closest-point
//! acceleration structures. Implement [`CageGeometry`] on the host type and
//! pass it to the solver directly; nothing needs to be copied into a
//! [`CageMesh`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::many_single_char_names)]

mod bounds;
mod cage;
mod error;
mod geometry;
mod query;
mod topology;

pub use bounds::Aabb;
pub use cage::{CageMesh, TargetMesh};
pub use error::{CageError, CageResult};
pub use geometry::{CageGeometry, ClosestHit, Faces, TargetGeometry};
pub use query::{closest_point_on_quad, closest_point_on_triangle};
pub use topology::{CageTopology, FaceKind};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
