//! Walk-on-spheres solver for harmonic coordinates.
//!
//! Every target vertex launches `num_walks` random walks. Each walk jumps to a
//! uniformly random point on the largest empty sphere around its position
//! (radius = distance to the cage) until it lands within `epsilon` of the
//! cage. The terminal points and the face-local weights of the hits are
//! accumulated per vertex, in a frame centred on the vertex and scaled by the
//! cage diagonal, and turned into weights by one 4×4 solve.
//!
//! Work is split into `(vertex, batch)` tasks with private generators and
//! accumulators. Partial results are merged in task order, so a given seed
//! yields the same weights whether tasks run on one thread or many.

use std::time::Instant;

use mesh_cage::{
    Aabb, CageError, CageGeometry, CageResult, CageTopology, ClosestHit, FaceKind, TargetGeometry,
};
use nalgebra::{Point3, Vector4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::accumulator::WalkAccumulator;
use crate::coords::{BilinearCoordinates, quad_coordinates, triangle_coordinates};
use crate::params::WalkParams;
use crate::result::{HarmonicSolve, WalkStats};
use crate::sampler::{random_direction, task_seed};
use crate::weights::HarmonicWeights;
use crate::{HarmonicError, HarmonicResult};

/// Walks per `(vertex, batch)` task.
const WALKS_PER_TASK: usize = 32;

/// Face-local weights of a walk's terminal hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceCoordinates {
    /// Barycentric coordinates on a triangle.
    Triangle {
        /// Cage vertices of the face.
        vertices: [u32; 3],
        /// Weight of each face vertex.
        weights: [f64; 3],
    },
    /// Bilinear coordinates on a quad.
    Quad {
        /// Cage vertices of the face.
        vertices: [u32; 4],
        /// Result of the bilinear inversion.
        coords: BilinearCoordinates,
    },
}

impl FaceCoordinates {
    /// Cage vertices of the hit face, in face order.
    #[must_use]
    pub fn vertices(&self) -> &[u32] {
        match self {
            Self::Triangle { vertices, .. } => vertices.as_slice(),
            Self::Quad { vertices, .. } => vertices.as_slice(),
        }
    }

    /// Weight of each face vertex, aligned with [`vertices`](Self::vertices).
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        match self {
            Self::Triangle { weights, .. } => weights.as_slice(),
            Self::Quad { coords, .. } => coords.weights.as_slice(),
        }
    }

    /// Kind of the hit face.
    #[must_use]
    pub fn kind(&self) -> FaceKind {
        match self {
            Self::Triangle { .. } => FaceKind::Triangle,
            Self::Quad { .. } => FaceKind::Quad,
        }
    }

    pub(crate) fn is_degenerate_triangle(&self) -> bool {
        matches!(self, Self::Triangle { weights, .. } if weights.iter().all(|&w| w == 0.0))
    }

    pub(crate) fn is_unconverged_quad(&self) -> bool {
        matches!(self, Self::Quad { coords, .. } if !coords.converged)
    }
}

/// Outcome of a single walk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkSample {
    /// Homogeneous `[x, y, z, 1]` position at which the last cage query was made.
    pub sample: Vector4<f64>,
    /// The last cage query's answer.
    pub hit: ClosestHit,
    /// Face-local weights of `hit.point`.
    pub coordinates: FaceCoordinates,
    /// Cage queries performed.
    pub steps: usize,
    /// Whether the walk stopped on `max_steps` rather than `epsilon`.
    pub capped: bool,
}

/// Computes harmonic coordinates of a target with respect to a cage.
///
/// Borrows both geometries; a solver is consumed by [`solve`](Self::solve).
///
/// # Example
///
/// ```
/// use mesh_cage::{CageMesh, TargetMesh};
/// use mesh_harmonic::{HarmonicSolver, WalkParams};
///
/// let cage = CageMesh::unit_cube();
/// let target = TargetMesh::from_coords(&[[0.5, 0.5, 0.5], [0.25, 0.5, 0.75]]);
///
/// let solver = HarmonicSolver::new(&cage, &target).unwrap();
/// let result = solver
///     .solve(&WalkParams::default().with_num_walks(500).with_seed(1))
///     .unwrap();
///
/// assert_eq!(result.weights.rows(), 2);
/// assert_eq!(result.weights.cols(), 8);
/// for sum in result.weights.row_sums() {
///     assert!((sum - 1.0).abs() < 1e-6);
/// }
/// ```
pub struct HarmonicSolver<'a, C: ?Sized, T: ?Sized> {
    cage: &'a C,
    target: &'a T,
    topology: CageTopology,
    bounds: Aabb,
}

impl<'a, C, T> HarmonicSolver<'a, C, T>
where
    C: CageGeometry + ?Sized,
    T: TargetGeometry + ?Sized,
{
    /// Prepare a solve of `target` against `cage`.
    ///
    /// # Errors
    ///
    /// - [`HarmonicError::UnsupportedTopology`] if a cage face is neither a
    ///   triangle nor a quad
    /// - [`HarmonicError::InvalidCage`] if the cage has no vertices or faces,
    ///   or its face stream is inconsistent
    pub fn new(cage: &'a C, target: &'a T) -> HarmonicResult<Self> {
        let topology = CageTopology::new(
            cage.face_counts(),
            cage.face_indices(),
            cage.vertices().len(),
        )?;
        if cage.vertices().is_empty() || topology.face_count() == 0 {
            return Err(HarmonicError::InvalidCage(CageError::EmptyCage));
        }

        debug!(
            cage_vertices = cage.vertices().len(),
            triangles = topology.triangle_count(),
            quads = topology.quad_count(),
            "Cage topology ready"
        );

        Ok(Self {
            cage,
            target,
            topology,
            bounds: Aabb::from_points(cage.vertices().iter()),
        })
    }

    /// Classified faces of the cage.
    #[must_use]
    pub fn topology(&self) -> &CageTopology {
        &self.topology
    }

    /// Run one walk from `start`.
    ///
    /// At least one cage query is always made, so a walk from a point on the
    /// cage surface ends after one step. Only `max_steps` and `epsilon` of
    /// `params` are used.
    ///
    /// # Errors
    ///
    /// Returns the cage's error if a closest-point query fails, or
    /// [`CageError::QueryFailed`] if the query names a face the cage does not have.
    pub fn walk<R: Rng + ?Sized>(
        &self,
        start: &Point3<f64>,
        params: &WalkParams,
        rng: &mut R,
    ) -> CageResult<WalkSample> {
        let mut position = *start;
        let mut steps = 0;
        let (sample, hit) = loop {
            let hit = self.cage.closest_point(&position)?;
            let sample = position.to_homogeneous();
            position += random_direction(rng) * hit.distance;
            steps += 1;

            if hit.distance <= params.epsilon || steps >= params.max_steps {
                break (sample, hit);
            }
        };

        Ok(WalkSample {
            sample,
            hit,
            coordinates: self.face_coordinates(&hit)?,
            steps,
            capped: hit.distance > params.epsilon,
        })
    }

    /// Compute the weights of every target vertex.
    ///
    /// With `params.seed` set, the result depends only on the inputs and the
    /// seed, not on `params.parallel` or the number of threads.
    ///
    /// # Errors
    ///
    /// - [`HarmonicError::InvalidParameter`] if `params` fails validation
    /// - [`HarmonicError::ClosestPointQueryFailed`] if any cage query fails
    /// - [`HarmonicError::SingularAccumulator`] if a vertex's walks do not
    ///   determine its weights
    pub fn solve(self, params: &WalkParams) -> HarmonicResult<HarmonicSolve> {
        params.validate()?;
        let start = Instant::now();

        let targets = self.target.vertices();
        let cage_vertices = self.cage.vertices().len();
        let seed = params.seed.unwrap_or_else(rand::random::<u64>);

        info!(
            target_vertices = targets.len(),
            cage_vertices,
            cage_faces = self.topology.face_count(),
            num_walks = params.num_walks,
            max_steps = params.max_steps,
            epsilon = params.epsilon,
            "Starting harmonic coordinate solve"
        );
        debug!(seed, parallel = params.parallel, "Walk streams seeded");

        let outside = targets.iter().filter(|p| !self.bounds.contains(p)).count();
        if outside > 0 {
            warn!(
                outside,
                "Target vertices lie outside the cage bounds; their weights extrapolate"
            );
        }

        let rows: Vec<(Vec<f64>, WalkStats)> = if params.parallel {
            (0..targets.len())
                .into_par_iter()
                .map(|vertex| self.solve_vertex(vertex, &targets[vertex], params, seed))
                .collect::<HarmonicResult<_>>()?
        } else {
            (0..targets.len())
                .map(|vertex| self.solve_vertex(vertex, &targets[vertex], params, seed))
                .collect::<HarmonicResult<_>>()?
        };

        let mut stats = WalkStats::default();
        let mut weight_rows = Vec::with_capacity(rows.len());
        for (row, vertex_stats) in rows {
            stats += vertex_stats;
            weight_rows.push(row);
        }
        let weights = HarmonicWeights::from_rows(cage_vertices, weight_rows);
        let elapsed = start.elapsed();

        debug!(
            elapsed_ms = format!("{:.1}", elapsed.as_secs_f64() * 1000.0),
            walks = stats.walks,
            "Walks finished"
        );
        if stats.has_warnings() {
            warn!(
                capped_walks = stats.capped_walks,
                unconverged_quad_hits = stats.unconverged_quad_hits,
                degenerate_triangle_hits = stats.degenerate_triangle_hits,
                "Some walks ended on unreliable samples"
            );
        }
        info!(
            mean_steps = format!("{:.2}", stats.mean_steps()),
            max_partition_error = format!("{:.2e}", weights.max_partition_error()),
            elapsed_ms = format!("{:.1}", elapsed.as_secs_f64() * 1000.0),
            "Harmonic coordinate solve complete"
        );

        Ok(HarmonicSolve {
            weights,
            stats,
            elapsed,
        })
    }

    /// All walks of one target vertex, then its weight row.
    fn solve_vertex(
        &self,
        vertex: usize,
        position: &Point3<f64>,
        params: &WalkParams,
        seed: u64,
    ) -> HarmonicResult<(Vec<f64>, WalkStats)> {
        let batches = params.num_walks.div_ceil(WALKS_PER_TASK);
        let run = |batch| self.run_batch(vertex, position, batch, params, seed);

        let partials: Vec<(WalkAccumulator, WalkStats)> = if params.parallel {
            (0..batches)
                .into_par_iter()
                .map(run)
                .collect::<HarmonicResult<_>>()?
        } else {
            (0..batches).map(run).collect::<HarmonicResult<_>>()?
        };

        let mut accumulator = self.accumulator(position);
        let mut stats = WalkStats::default();
        for (partial, partial_stats) in &partials {
            accumulator += partial;
            stats += *partial_stats;
        }

        let row = accumulator.solve(vertex)?;
        Ok((row, stats))
    }

    fn run_batch(
        &self,
        vertex: usize,
        position: &Point3<f64>,
        batch: usize,
        params: &WalkParams,
        seed: u64,
    ) -> HarmonicResult<(WalkAccumulator, WalkStats)> {
        let first = batch * WALKS_PER_TASK;
        let walks = WALKS_PER_TASK.min(params.num_walks - first);
        let mut rng = StdRng::seed_from_u64(task_seed(seed, vertex, batch));

        let mut accumulator = self.accumulator(position);
        let mut stats = WalkStats::default();
        for _ in 0..walks {
            let walk = self
                .walk(position, params, &mut rng)
                .map_err(|source| HarmonicError::ClosestPointQueryFailed { vertex, source })?;
            accumulator.add_sample(
                &Point3::from(walk.sample.xyz()),
                walk.coordinates.vertices(),
                walk.coordinates.weights(),
            );
            stats.record(&walk);
        }
        Ok((accumulator, stats))
    }

    /// Empty accumulator centred on `position`, in units of the cage diagonal.
    fn accumulator(&self, position: &Point3<f64>) -> WalkAccumulator {
        WalkAccumulator::new(
            self.cage.vertices().len(),
            *position,
            self.bounds.diagonal(),
        )
    }

    fn face_coordinates(&self, hit: &ClosestHit) -> CageResult<FaceCoordinates> {
        let unknown_face = || {
            CageError::QueryFailed(format!(
                "closest-point query returned face {} but the cage has {} faces",
                hit.face,
                self.topology.face_count()
            ))
        };
        let kind = self.topology.kind(hit.face).ok_or_else(unknown_face)?;
        let local = self.topology.local_index(hit.face).ok_or_else(unknown_face)?;
        let v = self.cage.vertices();

        Ok(match kind {
            FaceKind::Triangle => {
                let vertices = self.topology.tri_faces()[local];
                let [a, b, c] = vertices.map(|i| v[i as usize]);
                FaceCoordinates::Triangle {
                    vertices,
                    weights: triangle_coordinates(&hit.point, &a, &b, &c),
                }
            }
            FaceKind::Quad => {
                let vertices = self.topology.quad_faces()[local];
                let [a, b, c, d] = vertices.map(|i| v[i as usize]);
                FaceCoordinates::Quad {
                    vertices,
                    coords: quad_coordinates(&hit.point, &a, &b, &c, &d),
                }
            }
        })
    }
}

/// One-call form of [`HarmonicSolver::new`] followed by [`HarmonicSolver::solve`].
///
/// # Errors
///
/// Any error of [`HarmonicSolver::new`] or [`HarmonicSolver::solve`].
pub fn compute_harmonic_weights<C, T>(
    cage: &C,
    target: &T,
    params: &WalkParams,
) -> HarmonicResult<HarmonicSolve>
where
    C: CageGeometry + ?Sized,
    T: TargetGeometry + ?Sized,
{
    HarmonicSolver::new(cage, target)?.solve(params)
}
