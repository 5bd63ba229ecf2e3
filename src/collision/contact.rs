use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::utils::allocator::EntityId;

/// One contact between two objects, in world space.
///
/// `normal` points from A toward B. `distance` is measured between the
/// margin surfaces and is negative when the margins overlap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactPoint {
    pub point_on_a: Vec3,
    pub point_on_b: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub triangle_a: usize,
    pub triangle_b: usize,
}

impl ContactPoint {
    /// Same contact seen from B's side.
    pub fn flipped(&self) -> Self {
        Self {
            point_on_a: self.point_on_b,
            point_on_b: self.point_on_a,
            normal: -self.normal,
            distance: self.distance,
            triangle_a: self.triangle_b,
            triangle_b: self.triangle_a,
        }
    }
}

/// Contact manifold storing the points of one colliding object pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactManifold {
    pub object_a: EntityId,
    pub object_b: EntityId,
    pub points: Vec<ContactPoint>,
}

impl ContactManifold {
    pub fn new(object_a: EntityId, object_b: EntityId) -> Self {
        Self {
            object_a,
            object_b,
            points: Vec::new(),
        }
    }

    pub fn with_points(object_a: EntityId, object_b: EntityId, points: Vec<ContactPoint>) -> Self {
        Self {
            object_a,
            object_b,
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether this manifold is about the unordered pair `{a, b}`.
    pub fn references(&self, a: EntityId, b: EntityId) -> bool {
        (self.object_a == a && self.object_b == b) || (self.object_a == b && self.object_b == a)
    }

    /// The most penetrating point; the first one wins ties.
    pub fn deepest(&self) -> Option<&ContactPoint> {
        self.points.iter().fold(None, |best: Option<&ContactPoint>, p| match best {
            Some(b) if b.distance <= p.distance => Some(b),
            _ => Some(p),
        })
    }

    /// Keeps at most `max_points`, deepest first, skipping points whose
    /// witness on A lies within `merge_distance` of one already kept.
    pub fn reduce(&mut self, max_points: usize, merge_distance: f32) {
        let mut candidates = std::mem::take(&mut self.points);
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        let merge_sq = merge_distance * merge_distance;
        for candidate in candidates {
            if self.points.len() >= max_points {
                break;
            }
            let duplicate = self
                .points
                .iter()
                .any(|kept| kept.point_on_a.distance_squared(candidate.point_on_a) <= merge_sq);
            if !duplicate {
                self.points.push(candidate);
            }
        }
    }
}
