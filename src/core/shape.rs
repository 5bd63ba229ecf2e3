//! Shape contract consumed by the distance engine, plus the mesh-backed
//! implementation used by [`MeshWorld`](crate::world::MeshWorld).
//!
//! A shape's hierarchy must be locked before any node or triangle access.
//! Locking hands out a guard; dropping the guard releases the lock, so every
//! exit path of a traversal (including early pruning and `?` returns)
//! unlocks.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

use super::mesh::{Aabb, MeshBvh, Triangle, TriangleMesh};
use super::types::Transform;
use crate::config::DEFAULT_COLLISION_MARGIN;
use crate::error::{DistanceError, Result};
use crate::utils::allocator::EntityId;

/// Read access to a locked bounding-volume tree. Node data is in shape-local space.
pub trait BoundingHierarchy {
    fn root(&self) -> Option<usize>;
    fn node_bounds(&self, node: usize) -> Aabb;
    /// `None` for leaves.
    fn children(&self, node: usize) -> Option<(usize, usize)>;
    /// Triangle index and local-space triangle of a leaf.
    fn leaf_triangle(&self, node: usize) -> Option<(usize, Triangle)>;
}

/// A triangle-mesh shape with a collision margin and a lockable hierarchy.
pub trait CollisionShape: Send + Sync {
    type Hierarchy<'a>: BoundingHierarchy
    where
        Self: 'a;

    fn margin(&self) -> f32;
    fn triangle_count(&self) -> usize;
    /// Raw (uninflated) bounds in the shape's local frame.
    fn local_bounds(&self) -> Aabb;
    /// Acquires the hierarchy for reading; `None` when it has not been built.
    fn lock_hierarchy(&self) -> Option<Self::Hierarchy<'_>>;

    /// World-space bounds inflated by the margin.
    fn world_bounds(&self, transform: &Transform) -> Aabb {
        let local = self.local_bounds();
        if local.is_empty() {
            return local;
        }
        local.transformed(transform).expanded(self.margin())
    }
}

/// Resolves and locks the shape of `object`, checking every query precondition.
pub fn lock_object_shape<S: CollisionShape>(
    object: EntityId,
    shape: Option<&S>,
) -> Result<(&S, S::Hierarchy<'_>)> {
    let shape = shape.ok_or(DistanceError::MissingShape { object })?;
    if shape.triangle_count() == 0 {
        return Err(DistanceError::DegenerateShape { object });
    }
    let hierarchy = shape
        .lock_hierarchy()
        .ok_or(DistanceError::MissingBvh { object })?;
    Ok((shape, hierarchy))
}

/// Triangle mesh with margin and an on-demand BVH.
#[derive(Debug)]
pub struct MeshShape {
    mesh: TriangleMesh,
    margin: f32,
    bvh: RwLock<Option<MeshBvh>>,
    active_locks: AtomicUsize,
}

impl MeshShape {
    /// Creates a shape with the default margin. The BVH is not built until
    /// [`update_bound`](Self::update_bound) is called.
    pub fn new(mesh: TriangleMesh) -> Self {
        Self {
            mesh,
            margin: DEFAULT_COLLISION_MARGIN,
            bvh: RwLock::new(None),
            active_locks: AtomicUsize::new(0),
        }
    }

    pub fn with_margin(mut self, margin: f32) -> Self {
        self.set_margin(margin);
        self
    }

    /// Sets the margin; negative or non-finite values are clamped to zero.
    pub fn set_margin(&mut self, margin: f32) {
        if !margin.is_finite() || margin < 0.0 {
            log::warn!("invalid collision margin {margin}, using 0");
            self.margin = 0.0;
        } else {
            self.margin = margin;
        }
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// Builds (or rebuilds) the BVH.
    ///
    /// Fails with [`DistanceError::HierarchyLocked`] while any guard is held,
    /// leaving the current BVH in place.
    pub fn update_bound(&self) -> Result<()> {
        let mut slot = self.bvh.try_write().ok_or(DistanceError::HierarchyLocked)?;
        *slot = Some(MeshBvh::build(&self.mesh));
        Ok(())
    }

    /// Drops the BVH; locking fails until the next `update_bound`.
    pub fn release_bound(&self) -> Result<()> {
        let mut slot = self.bvh.try_write().ok_or(DistanceError::HierarchyLocked)?;
        *slot = None;
        Ok(())
    }

    pub fn has_bound(&self) -> bool {
        self.bvh.read_recursive().is_some()
    }

    /// Margin-inflated world box of the mesh.
    pub fn aabb(&self, transform: &Transform) -> Aabb {
        self.world_bounds(transform)
    }

    /// Locks the BVH for reading. Concurrent readers are allowed, including
    /// the same thread locking twice for two objects sharing this shape.
    pub fn lock(&self) -> Option<BvhGuard<'_>> {
        let bvh = RwLockReadGuard::try_map(self.bvh.read_recursive(), |bvh| bvh.as_ref()).ok()?;
        let held = self.active_locks.fetch_add(1, Ordering::AcqRel) + 1;
        log::trace!("mesh BVH locked ({held} active)");
        Some(BvhGuard {
            mesh: &self.mesh,
            bvh,
            active_locks: &self.active_locks,
        })
    }

    pub fn is_locked(&self) -> bool {
        self.active_locks() > 0
    }

    pub fn active_locks(&self) -> usize {
        self.active_locks.load(Ordering::Acquire)
    }
}

impl CollisionShape for MeshShape {
    type Hierarchy<'a> = BvhGuard<'a>;

    fn margin(&self) -> f32 {
        self.margin
    }

    fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    fn local_bounds(&self) -> Aabb {
        self.mesh.bounds
    }

    fn lock_hierarchy(&self) -> Option<BvhGuard<'_>> {
        self.lock()
    }
}

/// Scoped read lock on a [`MeshShape`]'s BVH.
pub struct BvhGuard<'a> {
    mesh: &'a TriangleMesh,
    bvh: MappedRwLockReadGuard<'a, MeshBvh>,
    active_locks: &'a AtomicUsize,
}

impl Deref for BvhGuard<'_> {
    type Target = MeshBvh;

    fn deref(&self) -> &MeshBvh {
        &self.bvh
    }
}

impl Drop for BvhGuard<'_> {
    fn drop(&mut self) {
        let held = self.active_locks.fetch_sub(1, Ordering::AcqRel) - 1;
        log::trace!("mesh BVH unlocked ({held} active)");
    }
}

impl BoundingHierarchy for BvhGuard<'_> {
    fn root(&self) -> Option<usize> {
        self.bvh.root()
    }

    fn node_bounds(&self, node: usize) -> Aabb {
        self.bvh.node(node).map_or(Aabb::empty(), |n| n.bounds)
    }

    fn children(&self, node: usize) -> Option<(usize, usize)> {
        let node = self.bvh.node(node)?;
        match (node.left, node.right) {
            (Some(left), Some(right)) => Some((left, right)),
            _ => None,
        }
    }

    fn leaf_triangle(&self, node: usize) -> Option<(usize, Triangle)> {
        let primitive = self.bvh.leaf_primitive(node)?;
        self.mesh.triangle(primitive).map(|t| (primitive, t))
    }
}
