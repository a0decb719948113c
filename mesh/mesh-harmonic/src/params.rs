//! Walk-on-spheres solve parameters.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{HarmonicError, HarmonicResult};

/// Parameters of a harmonic-coordinate solve.
///
/// `max_steps`, `epsilon` and `num_walks` trade accuracy for cost; `seed`
/// makes a solve reproducible.
///
/// # Examples
///
/// ```
/// use mesh_harmonic::WalkParams;
///
/// let params = WalkParams::default();
/// assert_eq!(params.max_steps, 100);
/// assert_eq!(params.num_walks, 200);
///
/// let precise = WalkParams::new()
///     .with_num_walks(4000)
///     .with_epsilon(1e-8)
///     .with_seed(42);
/// assert!(precise.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WalkParams {
    /// Maximum number of sphere jumps per walk.
    pub max_steps: usize,
    /// A walk stops once the cage is closer than this.
    pub epsilon: f64,
    /// Walks per target vertex.
    pub num_walks: usize,
    /// Base seed of all random streams.
    ///
    /// `None` draws a fresh seed from the OS for every solve.
    pub seed: Option<u64>,
    /// Run walks on the rayon thread pool.
    ///
    /// Sequential and parallel runs with the same seed give identical weights.
    pub parallel: bool,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            max_steps: 100,
            epsilon: 1e-6,
            num_walks: 200,
            seed: None,
            parallel: true,
        }
    }
}

impl WalkParams {
    /// Default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-walk step cap.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the boundary proximity tolerance.
    #[must_use]
    pub const fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the number of walks per target vertex.
    #[must_use]
    pub const fn with_num_walks(mut self, num_walks: usize) -> Self {
        self.num_walks = num_walks;
        self
    }

    /// Set a seed for reproducible results.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Remove the seed (fresh randomness per solve).
    #[must_use]
    pub const fn without_seed(mut self) -> Self {
        self.seed = None;
        self
    }

    /// Enable or disable parallel execution.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Check that the parameters describe a runnable solve.
    ///
    /// # Errors
    ///
    /// Returns [`HarmonicError::InvalidParameter`] if `max_steps` or
    /// `num_walks` is zero, or `epsilon` is not a positive finite number.
    pub fn validate(&self) -> HarmonicResult<()> {
        if self.max_steps == 0 {
            return Err(HarmonicError::InvalidParameter(
                "max_steps must be at least 1".into(),
            ));
        }
        if self.num_walks == 0 {
            return Err(HarmonicError::InvalidParameter(
                "num_walks must be at least 1".into(),
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(HarmonicError::InvalidParameter(format!(
                "epsilon must be positive and finite, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}
