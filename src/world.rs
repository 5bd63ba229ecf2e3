//! The world collaborator: the read contract the distance engine consumes,
//! and an arena-owned mesh world implementing it.

use crate::{
    collision::{broadphase::BroadPhase, contact::ContactManifold, narrowphase::NarrowPhase},
    config::WorldConfig,
    core::{
        mesh::Aabb,
        object::CollisionObject,
        shape::{CollisionShape, MeshShape},
        types::Transform,
    },
    distance::{DistanceMatrix, ResultAggregator},
    error::{DistanceError, Result},
    utils::{
        allocator::{Arena, EntityId},
        logging::ScopedTimer,
    },
};

/// Read-only view of one collision object for the duration of a query.
pub struct ObjectView<'w, S> {
    pub id: EntityId,
    pub shape: Option<&'w S>,
    pub transform: Transform,
}

impl<S> Clone for ObjectView<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ObjectView<'_, S> {}

impl<S> std::fmt::Debug for ObjectView<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectView")
            .field("id", &self.id)
            .field("has_shape", &self.shape.is_some())
            .field("transform", &self.transform)
            .finish()
    }
}

/// Snapshot contract of a collision world.
///
/// The world must not change while a computation borrows it.
pub trait CollisionWorld {
    type Shape: CollisionShape;

    /// Objects ordered by ascending stable index.
    fn objects(&self) -> Vec<ObjectView<'_, Self::Shape>>;

    /// Manifolds left by the most recent discrete collision-detection pass.
    fn manifolds(&self) -> &[ContactManifold];
}

/// Arena-owned world of mesh shapes and the objects placing them.
pub struct MeshWorld {
    shapes: Arena<MeshShape>,
    objects: Arena<CollisionObject>,
    manifolds: Vec<ContactManifold>,
    broadphase: BroadPhase,
    config: WorldConfig,
}

impl Default for MeshWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshWorld {
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            shapes: Arena::new(),
            objects: Arena::new(),
            manifolds: Vec::new(),
            broadphase: BroadPhase::new(config.broadphase_cell_size),
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn add_shape(&mut self, shape: MeshShape) -> EntityId {
        self.shapes.insert(shape)
    }

    pub fn shape(&self, id: EntityId) -> Option<&MeshShape> {
        self.shapes.get(id)
    }

    /// Mutable shape access. Existing manifolds are discarded since margins
    /// or geometry may change.
    pub fn shape_mut(&mut self, id: EntityId) -> Option<&mut MeshShape> {
        self.manifolds.clear();
        self.shapes.get_mut(id)
    }

    pub fn remove_shape(&mut self, id: EntityId) -> Option<MeshShape> {
        self.manifolds.clear();
        self.shapes.remove(id)
    }

    /// Places `shape` in the world; the returned id's index is the object's
    /// stable position in every distance matrix.
    pub fn add_object(&mut self, shape: EntityId, transform: Transform) -> Result<EntityId> {
        if !self.shapes.contains(shape) {
            return Err(DistanceError::UnknownObject { object: shape });
        }
        Ok(self.insert_object(CollisionObject::new(shape, transform)))
    }

    /// Adds an object with no shape. Distance queries over it fail.
    pub fn add_unattached_object(&mut self, transform: Transform) -> EntityId {
        self.insert_object(CollisionObject::unattached(transform))
    }

    fn insert_object(&mut self, object: CollisionObject) -> EntityId {
        self.manifolds.clear();
        let id = self.objects.insert(object);
        if let Some(stored) = self.objects.get_mut(id) {
            stored.id = id;
        }
        id
    }

    pub fn remove_object(&mut self, id: EntityId) -> Option<CollisionObject> {
        self.manifolds.clear();
        self.objects.remove(id)
    }

    pub fn set_transform(&mut self, id: EntityId, transform: Transform) -> Result<()> {
        let object = self
            .objects
            .get_mut(id)
            .ok_or(DistanceError::UnknownObject { object: id })?;
        object.transform = transform;
        self.manifolds.clear();
        Ok(())
    }

    pub fn object(&self, id: EntityId) -> Option<&CollisionObject> {
        self.objects.get(id)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn clear_manifolds(&mut self) {
        self.manifolds.clear();
    }

    /// Runs broad and narrow phase over the current placement and stores the
    /// resulting manifolds. Returns how many manifolds were produced.
    pub fn perform_discrete_collision_detection(&mut self) -> Result<usize> {
        let _timer = ScopedTimer::new("world::discrete_collision_detection");
        self.manifolds.clear();

        let views = collect_views(&self.objects, &self.shapes);
        let mut entries: Vec<(EntityId, Aabb)> = Vec::with_capacity(views.len());
        for view in &views {
            let shape = view
                .shape
                .ok_or(DistanceError::MissingShape { object: view.id })?;
            entries.push((view.id, shape.world_bounds(&view.transform)));
        }

        let pairs = self.broadphase.get_potential_pairs(&entries);
        let mut manifolds = Vec::new();
        for (id_a, id_b) in pairs {
            let (Some(a), Some(b)) = (find_view(&views, id_a), find_view(&views, id_b)) else {
                continue;
            };
            if let Some(manifold) = NarrowPhase::collide(a, b, self.config.max_manifold_points)? {
                manifolds.push(manifold);
            }
        }
        drop(views);

        log::debug!(
            "discrete collision detection: {} objects, {} manifolds",
            entries.len(),
            manifolds.len()
        );
        self.manifolds = manifolds;
        Ok(self.manifolds.len())
    }

    /// Distance matrix over the current world with default settings.
    pub fn compute_distance_matrix(&self) -> Result<DistanceMatrix> {
        ResultAggregator::default().compute(self)
    }
}

impl CollisionWorld for MeshWorld {
    type Shape = MeshShape;

    fn objects(&self) -> Vec<ObjectView<'_, MeshShape>> {
        collect_views(&self.objects, &self.shapes)
    }

    fn manifolds(&self) -> &[ContactManifold] {
        &self.manifolds
    }
}

fn collect_views<'w>(
    objects: &'w Arena<CollisionObject>,
    shapes: &'w Arena<MeshShape>,
) -> Vec<ObjectView<'w, MeshShape>> {
    objects
        .iter()
        .map(|(id, object)| ObjectView {
            id,
            shape: object.shape.and_then(|shape| shapes.get(shape)),
            transform: object.transform,
        })
        .collect()
}

// Views are sorted by index.
fn find_view<'v, 'w>(
    views: &'v [ObjectView<'w, MeshShape>],
    id: EntityId,
) -> Option<&'v ObjectView<'w, MeshShape>> {
    views
        .binary_search_by_key(&id.index(), |view| view.id.index())
        .ok()
        .map(|position| &views[position])
        .filter(|view| view.id == id)
}
