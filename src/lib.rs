//! min_dist – pairwise minimum-distance engine for triangle-mesh worlds.
//!
//! For every pair of collision objects the crate reports either the deepest
//! witness of an existing contact manifold (`collision`) or the exact minimum
//! separation between the margin-inflated meshes (`free`). Worlds and shapes
//! are consumed through the [`CollisionWorld`] and [`CollisionShape`] traits;
//! [`MeshWorld`] and [`MeshShape`] are the arena-owned reference backend.

pub mod collision;
pub mod config;
pub mod core;
pub mod distance;
pub mod error;
pub mod utils;
pub mod world;

pub use glam::{Quat, Vec3};

pub use collision::{
    broadphase::BroadPhase,
    contact::{ContactManifold, ContactPoint},
};
pub use config::{DistanceConfig, WorldConfig};
pub use crate::core::{
    mesh::{Aabb, MeshBuilder, Triangle, TriangleMesh},
    object::CollisionObject,
    shape::{BoundingHierarchy, BvhGuard, CollisionShape, MeshShape},
    types::Transform,
};
pub use distance::{DistanceMatrix, PairKind, PairRecord, ResultAggregator};
pub use error::{DistanceError, Result};
pub use utils::{
    allocator::{Arena, EntityId},
    profiling::QueryStats,
};
pub use world::{CollisionWorld, MeshWorld, ObjectView};

/// Computes the distance matrix of `world` with the default configuration.
///
/// Manifolds are read from the world as they are; run the world's collision
/// detection first if `collision` records are expected.
pub fn compute_distance_matrix<W: CollisionWorld>(world: &W) -> Result<DistanceMatrix> {
    ResultAggregator::default().compute(world)
}
