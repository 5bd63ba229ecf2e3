use crate::{
    collision::{
        contact::{ContactManifold, ContactPoint},
        primitives::{closest_points_triangles, separating_direction},
        traversal::{traverse, LeafPairVisitor, WorldLeaf},
    },
    core::shape::{lock_object_shape, CollisionShape},
    error::Result,
    world::ObjectView,
};

/// Discrete mesh/mesh contact generation.
pub struct NarrowPhase;

impl NarrowPhase {
    /// Builds the manifold for a pair whose margin-inflated meshes touch.
    ///
    /// Every leaf triangle pair whose raw distance is within the combined
    /// margins becomes a contact. Returns `None` when nothing touches.
    pub fn collide<S: CollisionShape>(
        a: &ObjectView<'_, S>,
        b: &ObjectView<'_, S>,
        max_points: usize,
    ) -> Result<Option<ContactManifold>> {
        let (shape_a, hierarchy_a) = lock_object_shape(a.id, a.shape)?;
        let (shape_b, hierarchy_b) = lock_object_shape(b.id, b.shape)?;

        let mut collector = ContactCollector {
            margin_a: shape_a.margin(),
            margin_b: shape_b.margin(),
            contacts: Vec::new(),
        };
        traverse(
            &hierarchy_a,
            &a.transform,
            &hierarchy_b,
            &b.transform,
            &mut collector,
        );

        if collector.contacts.is_empty() {
            return Ok(None);
        }

        let merge_distance = collector.threshold().max(1e-6);
        let mut manifold = ContactManifold::with_points(a.id, b.id, collector.contacts);
        manifold.reduce(max_points.max(1), merge_distance);
        Ok(Some(manifold))
    }
}

struct ContactCollector {
    margin_a: f32,
    margin_b: f32,
    contacts: Vec<ContactPoint>,
}

impl ContactCollector {
    fn threshold(&self) -> f32 {
        self.margin_a + self.margin_b
    }
}

impl LeafPairVisitor for ContactCollector {
    fn prunes(&self, lower_bound_sq: f32) -> bool {
        lower_bound_sq > self.threshold() * self.threshold()
    }

    fn visit(&mut self, leaf_a: &WorldLeaf, leaf_b: &WorldLeaf) {
        let closest = closest_points_triangles(&leaf_a.triangle, &leaf_b.triangle);
        let raw = closest.distance();
        if raw > self.threshold() {
            return;
        }
        let normal = separating_direction(&closest, &leaf_a.triangle, &leaf_b.triangle);
        self.contacts.push(ContactPoint {
            point_on_a: closest.point_a + normal * self.margin_a,
            point_on_b: closest.point_b - normal * self.margin_b,
            normal,
            distance: raw - self.threshold(),
            triangle_a: leaf_a.primitive,
            triangle_b: leaf_b.primitive,
        });
    }
}
