//! Pairwise minimum-distance engine.
//!
//! [`PairEnumerator`] drives; each pair is answered by the
//! [`ManifoldSelector`] when a contact manifold exists, otherwise by the
//! [`SeparationSolver`]. [`ResultAggregator`] assembles the ordered
//! [`DistanceMatrix`].

pub mod manifold;
pub mod matrix;
pub mod pairs;
pub mod separation;

pub use manifold::ManifoldSelector;
pub use matrix::{DistanceMatrix, PairKind, PairRecord, ResultAggregator};
pub use pairs::{ObjectPair, PairEnumerator};
pub use separation::{Separation, SeparationSolver};
