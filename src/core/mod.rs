//! Core geometry and entity types: transforms, meshes, BVHs, shapes, objects.

pub mod types;
pub mod mesh;
pub mod shape;
pub mod object;

pub use types::Transform;
pub use mesh::{Aabb, MeshBuilder, MeshBvh, MeshBvhNode, Triangle, TriangleMesh};
pub use shape::{BoundingHierarchy, BvhGuard, CollisionShape, MeshShape};
pub use object::CollisionObject;
