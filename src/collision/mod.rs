//! Collision modules: closest-point primitives, hierarchy traversal, contact
//! manifolds, broad phase and mesh narrow phase.

pub mod broadphase;
pub mod contact;
pub mod narrowphase;
pub mod primitives;
pub mod traversal;

pub use broadphase::{BroadPhase, SpatialGrid};
pub use contact::{ContactManifold, ContactPoint};
pub use narrowphase::NarrowPhase;
pub use primitives::ClosestPoints;
pub use traversal::{traverse, LeafPairVisitor, TraversalStats, WorldLeaf};
