//! Simultaneous descent of two bounding-volume trees with box pruning.

use crate::core::{
    mesh::{Aabb, Triangle},
    shape::BoundingHierarchy,
    types::Transform,
};

/// A leaf reached by the traversal, with its triangle in world space.
#[derive(Debug, Clone, Copy)]
pub struct WorldLeaf {
    pub primitive: usize,
    pub triangle: Triangle,
}

/// Decides which node pairs to skip and consumes the leaf pairs that survive.
pub trait LeafPairVisitor {
    /// `true` when no leaf pair under boxes `lower_bound_sq` apart can matter.
    fn prunes(&self, lower_bound_sq: f32) -> bool;
    fn visit(&mut self, leaf_a: &WorldLeaf, leaf_b: &WorldLeaf);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraversalStats {
    pub node_pairs_visited: usize,
    pub node_pairs_pruned: usize,
    pub leaf_pair_tests: usize,
}

#[derive(Clone, Copy)]
struct NodePair {
    a: usize,
    b: usize,
    box_a: Aabb,
    box_b: Aabb,
}

impl NodePair {
    fn lower_bound_sq(&self) -> f32 {
        self.box_a.distance_squared(&self.box_b)
    }
}

/// Walks every node pair of `a × b` that the visitor does not prune.
///
/// The larger node of a pair is split first, and of the two resulting pairs
/// the one with the closer boxes is explored first so the visitor's bound
/// tightens early.
pub fn traverse<A, B, V>(
    a: &A,
    transform_a: &Transform,
    b: &B,
    transform_b: &Transform,
    visitor: &mut V,
) -> TraversalStats
where
    A: BoundingHierarchy,
    B: BoundingHierarchy,
    V: LeafPairVisitor,
{
    let mut stats = TraversalStats::default();
    let (Some(root_a), Some(root_b)) = (a.root(), b.root()) else {
        return stats;
    };

    let mut stack = vec![NodePair {
        a: root_a,
        b: root_b,
        box_a: a.node_bounds(root_a).transformed(transform_a),
        box_b: b.node_bounds(root_b).transformed(transform_b),
    }];

    while let Some(pair) = stack.pop() {
        stats.node_pairs_visited += 1;
        if visitor.prunes(pair.lower_bound_sq()) {
            stats.node_pairs_pruned += 1;
            continue;
        }

        let split_a = match (a.children(pair.a), b.children(pair.b)) {
            (None, None) => {
                let (Some((pa, ta)), Some((pb, tb))) =
                    (a.leaf_triangle(pair.a), b.leaf_triangle(pair.b))
                else {
                    continue;
                };
                stats.leaf_pair_tests += 1;
                visitor.visit(
                    &WorldLeaf {
                        primitive: pa,
                        triangle: ta.transformed(transform_a),
                    },
                    &WorldLeaf {
                        primitive: pb,
                        triangle: tb.transformed(transform_b),
                    },
                );
                continue;
            }
            (Some(children), None) => Some(children),
            (None, Some(_)) => None,
            (Some(children), Some(_)) => {
                if pair.box_a.size_metric() >= pair.box_b.size_metric() {
                    Some(children)
                } else {
                    None
                }
            }
        };

        let (first, second) = match split_a {
            Some((left, right)) => (
                NodePair {
                    a: left,
                    box_a: a.node_bounds(left).transformed(transform_a),
                    ..pair
                },
                NodePair {
                    a: right,
                    box_a: a.node_bounds(right).transformed(transform_a),
                    ..pair
                },
            ),
            None => {
                let Some((left, right)) = b.children(pair.b) else {
                    continue;
                };
                (
                    NodePair {
                        b: left,
                        box_b: b.node_bounds(left).transformed(transform_b),
                        ..pair
                    },
                    NodePair {
                        b: right,
                        box_b: b.node_bounds(right).transformed(transform_b),
                        ..pair
                    },
                )
            }
        };

        // Stack is LIFO: push the farther pair first.
        if first.lower_bound_sq() <= second.lower_bound_sq() {
            stack.push(second);
            stack.push(first);
        } else {
            stack.push(first);
            stack.push(second);
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{mesh::TriangleMesh, shape::MeshShape};
    use glam::Vec3;

    struct CountAll(usize);

    impl LeafPairVisitor for CountAll {
        fn prunes(&self, _lower_bound_sq: f32) -> bool {
            false
        }

        fn visit(&mut self, _leaf_a: &WorldLeaf, _leaf_b: &WorldLeaf) {
            self.0 += 1;
        }
    }

    struct WithinReach(f32);

    impl LeafPairVisitor for WithinReach {
        fn prunes(&self, lower_bound_sq: f32) -> bool {
            lower_bound_sq > self.0 * self.0
        }

        fn visit(&mut self, _leaf_a: &WorldLeaf, _leaf_b: &WorldLeaf) {}
    }

    fn strip(n: u32) -> MeshShape {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for i in 0..=n {
            vertices.push(Vec3::new(i as f32, 0.0, 0.0));
            vertices.push(Vec3::new(i as f32, 1.0, 0.0));
        }
        for i in 0..n {
            let base = 2 * i;
            indices.push([base, base + 2, base + 1]);
            indices.push([base + 1, base + 2, base + 3]);
        }
        let shape = MeshShape::new(TriangleMesh::builder(vertices, indices).build());
        shape.update_bound().unwrap();
        shape
    }

    #[test]
    fn unpruned_traversal_reaches_every_leaf_pair() {
        let a = strip(3);
        let b = strip(2);
        let (ga, gb) = (a.lock().unwrap(), b.lock().unwrap());
        let mut visitor = CountAll(0);
        let stats = traverse(
            &ga,
            &Transform::IDENTITY,
            &gb,
            &Transform::from_position(Vec3::Z),
            &mut visitor,
        );
        assert_eq!(visitor.0, 6 * 4);
        assert_eq!(stats.leaf_pair_tests, 24);
        assert_eq!(stats.node_pairs_pruned, 0);
    }

    #[test]
    fn distant_subtrees_are_pruned() {
        let a = strip(8);
        let b = strip(1);
        let (ga, gb) = (a.lock().unwrap(), b.lock().unwrap());
        let mut visitor = WithinReach(0.5);
        let stats = traverse(
            &ga,
            &Transform::IDENTITY,
            &gb,
            &Transform::from_position(Vec3::new(-1.2, 0.0, 0.0)),
            &mut visitor,
        );
        assert!(stats.node_pairs_pruned > 0);
        assert!(stats.leaf_pair_tests < 16 * 2);
    }
}
