//! Stochastic harmonic coordinates for cage-based deformation.
//!
//! Harmonic coordinates express each point inside a cage as a weighted sum of
//! the cage's vertices, with weights that are harmonic functions of position.
//! This crate estimates them by Monte Carlo **Walk on Spheres**: random walks
//! from every target vertex jump across the largest empty sphere until they
//! touch the cage, and the hits are combined by a small least-squares fit that
//! makes every row sum to one and reproduce affine functions.
//!
//! - [`HarmonicSolver`] / [`compute_harmonic_weights`] - run the walks and build
//!   the weight matrix
//! - [`HarmonicWeights`] - dense `targets × cage vertices` result
//! - [`LinearBlend`] - move the target with a posed cage
//! - [`triangle_coordinates`] / [`quad_coordinates`] - face-local weights of a hit
//! - [`DirectionSampler`] / [`random_direction`] - uniform sphere directions
//!
//! Cage and target geometry come from [`mesh_cage`].
//!
//! # Layer 0
//!
//! This is a Layer 0 crate with zero Bevy dependencies.
//!
//! # Quick Start
//!
//! ```
//! use mesh_cage::{CageGeometry, CageMesh, TargetMesh};
//! use mesh_harmonic::{LinearBlend, WalkParams, compute_harmonic_weights};
//! use nalgebra::Vector3;
//!
//! let cage = CageMesh::unit_cube();
//! let target = TargetMesh::from_coords(&[[0.5, 0.5, 0.5], [0.3, 0.4, 0.6]]);
//!
//! let params = WalkParams::default().with_num_walks(400).with_seed(42);
//! let result = compute_harmonic_weights(&cage, &target, &params).unwrap();
//! assert_eq!(result.weights.rows(), 2);
//! assert_eq!(result.weights.cols(), 8);
//!
//! // Translate the cage; the target follows.
//! let offset = Vector3::new(1.0, 0.0, 0.0);
//! let posed: Vec<_> = cage.vertices().iter().map(|v| v + offset).collect();
//! let moved = LinearBlend::new(&result.weights)
//!     .deform(&posed, &target.vertices, 1.0)
//!     .unwrap();
//! assert!((moved[0].x - 1.5).abs() < 1e-4);
//! ```
//!
//! # Reproducibility
//!
//! With [`WalkParams::seed`] set, each `(vertex, batch)` task draws from its
//! own generator derived from the seed, and partial sums are merged in a fixed
//! order. Sequential and parallel runs therefore give identical weights.
//!
//! # Accuracy
//!
//! Every row sums to 1 up to floating-point error, whatever the walk count.
//! Rows reproduce their vertex position to within roughly `epsilon`, since a
//! walk stops near the cage rather than on it. The remaining Monte Carlo noise
//! shrinks as `1 / sqrt(num_walks)`.
//!
//! Hits are accumulated relative to each target vertex, in units of the cage's
//! bounding-box diagonal, so none of this depends on where the cage sits or
//! how large it is. Scale `epsilon` with the cage.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::many_single_char_names)]

mod accumulator;
mod blend;
mod coords;
mod error;
mod params;
mod result;
mod sampler;
mod solver;
mod weights;

pub use accumulator::WalkAccumulator;
pub use blend::LinearBlend;
pub use coords::{
    BILINEAR_MAX_ITERATIONS, BILINEAR_TOLERANCE, BilinearCoordinates, quad_coordinates,
    triangle_coordinates,
};
pub use error::{HarmonicError, HarmonicResult};
pub use params::WalkParams;
pub use result::{HarmonicSolve, WalkStats};
pub use sampler::{DirectionSampler, random_direction};
pub use solver::{FaceCoordinates, HarmonicSolver, WalkSample, compute_harmonic_weights};
pub use weights::HarmonicWeights;
