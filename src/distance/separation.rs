//! Global minimum distance between two margin-expanded meshes.
//!
//! Branch and bound over both hierarchies: the best leaf distance found so
//! far is the upper bound, box distance is the lower bound, and node pairs
//! whose lower bound cannot beat the upper bound are dropped. Leaf triangles
//! are compared exactly and without inflation; margins are applied once at
//! the end.

use glam::Vec3;

use crate::{
    collision::{
        primitives::{closest_points_triangles, separating_direction, ClosestPoints},
        traversal::{traverse, LeafPairVisitor, TraversalStats, WorldLeaf},
    },
    core::shape::{lock_object_shape, BoundingHierarchy, CollisionShape},
    error::{DistanceError, Result},
    world::ObjectView,
};

/// Minimum distance between two margin surfaces and the points realizing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Separation {
    /// `raw_distance - margin_a - margin_b`, or zero when touching.
    pub distance: f32,
    pub point_on_a: Vec3,
    pub point_on_b: Vec3,
    /// Distance between the uninflated triangles.
    pub raw_distance: f32,
    pub triangle_a: usize,
    pub triangle_b: usize,
    /// The margin shells meet or overlap.
    pub touching: bool,
    /// `margin_a + margin_b`.
    pub tolerance: f32,
    pub traversal: TraversalStats,
}

pub struct SeparationSolver;

impl SeparationSolver {
    /// Locks both hierarchies for the duration of the query and returns the
    /// exact minimum. The guards drop on every return path.
    pub fn solve<S: CollisionShape>(
        a: &ObjectView<'_, S>,
        b: &ObjectView<'_, S>,
    ) -> Result<Separation> {
        let (shape_a, hierarchy_a) = lock_object_shape(a.id, a.shape)?;
        let (shape_b, hierarchy_b) = lock_object_shape(b.id, b.shape)?;
        if hierarchy_a.root().is_none() {
            return Err(DistanceError::DegenerateShape { object: a.id });
        }
        if hierarchy_b.root().is_none() {
            return Err(DistanceError::DegenerateShape { object: b.id });
        }

        let mut visitor = ClosestPairVisitor::default();
        let traversal = traverse(
            &hierarchy_a,
            &a.transform,
            &hierarchy_b,
            &b.transform,
            &mut visitor,
        );
        let Some(best) = visitor.best else {
            return Err(DistanceError::DegenerateShape { object: a.id });
        };

        Ok(apply_margins(
            &best,
            shape_a.margin(),
            shape_b.margin(),
            traversal,
        ))
    }
}

struct LeafPairHit {
    closest: ClosestPoints,
    leaf_a: WorldLeaf,
    leaf_b: WorldLeaf,
}

#[derive(Default)]
struct ClosestPairVisitor {
    best: Option<LeafPairHit>,
}

impl ClosestPairVisitor {
    fn best_distance_squared(&self) -> f32 {
        self.best
            .as_ref()
            .map_or(f32::INFINITY, |hit| hit.closest.distance_squared)
    }
}

impl LeafPairVisitor for ClosestPairVisitor {
    fn prunes(&self, lower_bound_sq: f32) -> bool {
        lower_bound_sq >= self.best_distance_squared()
    }

    fn visit(&mut self, leaf_a: &WorldLeaf, leaf_b: &WorldLeaf) {
        let closest = closest_points_triangles(&leaf_a.triangle, &leaf_b.triangle);
        if closest.distance_squared < self.best_distance_squared() {
            self.best = Some(LeafPairHit {
                closest,
                leaf_a: *leaf_a,
                leaf_b: *leaf_b,
            });
        }
    }
}

/// Moves the raw witness points onto the margin surfaces.
///
/// When the shells overlap there is no separating gap to report: both
/// witnesses collapse onto the point splitting the raw segment in margin
/// proportion and the distance is zero.
fn apply_margins(
    hit: &LeafPairHit,
    margin_a: f32,
    margin_b: f32,
    traversal: TraversalStats,
) -> Separation {
    let raw = hit.closest.distance();
    let tolerance = margin_a + margin_b;
    let (pa, pb) = (hit.closest.point_a, hit.closest.point_b);

    let (distance, point_on_a, point_on_b, touching) = if raw > tolerance {
        let n = separating_direction(&hit.closest, &hit.leaf_a.triangle, &hit.leaf_b.triangle);
        (raw - tolerance, pa + n * margin_a, pb - n * margin_b, false)
    } else {
        let t = if tolerance > 0.0 { margin_a / tolerance } else { 0.0 };
        let contact = pa.lerp(pb, t);
        (0.0, contact, contact, true)
    };

    Separation {
        distance,
        point_on_a,
        point_on_b,
        raw_distance: raw,
        triangle_a: hit.leaf_a.primitive,
        triangle_b: hit.leaf_b.primitive,
        touching,
        tolerance,
        traversal,
    }
}
