//! Global configuration constants and tunables for distance queries.

use serde::{Deserialize, Serialize};

/// Margin given to shapes that never call `set_margin`.
pub const DEFAULT_COLLISION_MARGIN: f32 = 0.04;

/// Default cell size for the broad-phase uniform grid.
pub const DEFAULT_BROADPHASE_CELL_SIZE: f32 = 5.0;

/// Maximum number of contact points retained per manifold.
pub const MAX_MANIFOLD_POINTS: usize = 4;

/// Below this many pairs the matrix is always evaluated on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16;

/// Settings for a distance-matrix computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Evaluate pairs on the rayon pool (requires the `parallel` feature).
    pub parallel: bool,
    /// Minimum pair count before work is spread across threads.
    pub parallel_threshold: usize,
    /// Log a warning for free pairs that are touching within margin tolerance.
    pub warn_on_touching: bool,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            warn_on_touching: true,
        }
    }
}

impl DistanceConfig {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }
}

/// Settings for the reference world's discrete collision-detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub broadphase_cell_size: f32,
    pub max_manifold_points: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            broadphase_cell_size: DEFAULT_BROADPHASE_CELL_SIZE,
            max_manifold_points: MAX_MANIFOLD_POINTS,
        }
    }
}
