//! Solve output and walk diagnostics.

use std::ops::AddAssign;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::solver::WalkSample;
use crate::weights::HarmonicWeights;

/// Counters gathered over every walk of a solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WalkStats {
    /// Walks performed.
    pub walks: usize,
    /// Sphere jumps performed, summed over all walks.
    pub steps: usize,
    /// Walks stopped by `max_steps` before reaching `epsilon`.
    pub capped_walks: usize,
    /// Quad hits whose bilinear inversion did not converge.
    pub unconverged_quad_hits: usize,
    /// Hits on zero-area triangles (all-zero face weights).
    pub degenerate_triangle_hits: usize,
}

impl WalkStats {
    /// Count one finished walk.
    pub fn record(&mut self, sample: &WalkSample) {
        self.walks += 1;
        self.steps += sample.steps;
        self.capped_walks += usize::from(sample.capped);
        self.unconverged_quad_hits += usize::from(sample.coordinates.is_unconverged_quad());
        self.degenerate_triangle_hits += usize::from(sample.coordinates.is_degenerate_triangle());
    }

    /// Average number of steps per walk.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_steps(&self) -> f64 {
        if self.walks == 0 {
            0.0
        } else {
            self.steps as f64 / self.walks as f64
        }
    }

    /// Returns `true` if any walk was capped or hit a problematic face.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.capped_walks > 0 || self.unconverged_quad_hits > 0 || self.degenerate_triangle_hits > 0
    }
}

impl AddAssign for WalkStats {
    fn add_assign(&mut self, rhs: Self) {
        self.walks += rhs.walks;
        self.steps += rhs.steps;
        self.capped_walks += rhs.capped_walks;
        self.unconverged_quad_hits += rhs.unconverged_quad_hits;
        self.degenerate_triangle_hits += rhs.degenerate_triangle_hits;
    }
}

/// Result of a harmonic-coordinate solve.
#[derive(Debug, Clone)]
pub struct HarmonicSolve {
    /// The `n_target × n_cage` weight matrix.
    pub weights: HarmonicWeights,
    /// Walk counters.
    pub stats: WalkStats,
    /// Wall-clock time of the solve.
    pub elapsed: Duration,
}

impl HarmonicSolve {
    /// Drop the diagnostics and keep the weights.
    #[must_use]
    pub fn into_weights(self) -> HarmonicWeights {
        self.weights
    }
}
