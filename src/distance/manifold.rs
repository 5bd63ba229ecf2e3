use std::collections::HashMap;

use crate::collision::contact::{ContactManifold, ContactPoint};
use crate::distance::matrix::{PairKind, PairRecord};
use crate::utils::allocator::EntityId;

/// Answers pairs from the manifolds of a prior detection pass.
///
/// Manifolds are grouped by unordered object pair once, so each lookup only
/// scans the manifolds of the pair asked about.
pub struct ManifoldSelector<'m> {
    by_pair: HashMap<(EntityId, EntityId), Vec<&'m ContactManifold>>,
}

impl<'m> ManifoldSelector<'m> {
    pub fn new(manifolds: &'m [ContactManifold]) -> Self {
        let mut by_pair: HashMap<_, Vec<_>> = HashMap::new();
        for manifold in manifolds {
            by_pair
                .entry(pair_key(manifold.object_a, manifold.object_b))
                .or_default()
                .push(manifold);
        }
        Self { by_pair }
    }

    pub fn manifold_count(&self) -> usize {
        self.by_pair.values().map(Vec::len).sum()
    }

    /// Deepest contact across every manifold referencing `{a, b}`, seen from
    /// `a`. The first point encountered wins ties. `None` when no manifold
    /// references the pair or none has points.
    pub fn deepest_contact(&self, a: EntityId, b: EntityId) -> Option<ContactPoint> {
        let manifolds = self.by_pair.get(&pair_key(a, b))?;
        let mut best: Option<ContactPoint> = None;
        for manifold in manifolds {
            let reversed = manifold.object_a != a;
            for point in &manifold.points {
                if best.is_some_and(|kept| kept.distance <= point.distance) {
                    continue;
                }
                best = Some(if reversed { point.flipped() } else { *point });
            }
        }
        best
    }

    /// A `collision` record for `{a, b}` when the pair has a usable manifold.
    pub fn select(&self, a: EntityId, b: EntityId) -> Option<PairRecord> {
        let contact = self.deepest_contact(a, b)?;
        Some(PairRecord {
            obj_a: a,
            obj_b: b,
            kind: PairKind::Collision,
            distance: contact.distance,
            point_on_a: contact.point_on_a,
            point_on_b: contact.point_on_b,
        })
    }
}

fn pair_key(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn contact(x: f32, distance: f32) -> ContactPoint {
        ContactPoint {
            point_on_a: Vec3::new(x, 0.0, 0.0),
            point_on_b: Vec3::new(x, 1.0, 0.0),
            normal: Vec3::Y,
            distance,
            triangle_a: 0,
            triangle_b: 0,
        }
    }

    fn ids() -> (EntityId, EntityId, EntityId) {
        (
            EntityId::from_index(0),
            EntityId::from_index(1),
            EntityId::from_index(2),
        )
    }

    #[test]
    fn picks_deepest_point_across_manifolds() {
        let (a, b, c) = ids();
        let manifolds = vec![
            ContactManifold::with_points(a, b, vec![contact(0.0, -0.01), contact(1.0, -0.02)]),
            ContactManifold::with_points(a, c, vec![contact(5.0, -1.0)]),
            ContactManifold::with_points(a, b, vec![contact(2.0, -0.05)]),
        ];
        let selector = ManifoldSelector::new(&manifolds);
        let record = selector.select(a, b).unwrap();
        assert_eq!(record.kind, PairKind::Collision);
        assert_eq!(record.distance, -0.05);
        assert_eq!(record.point_on_a.x, 2.0);
    }

    #[test]
    fn first_point_wins_ties() {
        let (a, b, _) = ids();
        let manifolds = vec![ContactManifold::with_points(
            a,
            b,
            vec![contact(3.0, -0.1), contact(4.0, -0.1)],
        )];
        let record = ManifoldSelector::new(&manifolds).select(a, b).unwrap();
        assert_eq!(record.point_on_a.x, 3.0);
    }

    #[test]
    fn reversed_manifold_is_flipped_into_pair_order() {
        let (a, b, _) = ids();
        let manifolds = vec![ContactManifold::with_points(b, a, vec![contact(1.0, -0.2)])];
        let record = ManifoldSelector::new(&manifolds).select(a, b).unwrap();
        assert_eq!((record.obj_a, record.obj_b), (a, b));
        assert_eq!(record.point_on_a, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(record.point_on_b, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn declines_without_points_or_manifold() {
        let (a, b, c) = ids();
        let manifolds = vec![ContactManifold::new(a, b)];
        let selector = ManifoldSelector::new(&manifolds);
        assert!(selector.select(a, b).is_none());
        assert!(selector.select(b, c).is_none());
        assert_eq!(selector.manifold_count(), 1);
    }
}
