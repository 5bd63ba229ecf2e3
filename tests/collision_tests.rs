use min_dist::collision::narrowphase::NarrowPhase;
use min_dist::*;

fn square(margin: f32) -> MeshShape {
    let shape = MeshShape::new(TriangleMesh::square(1.0)).with_margin(margin);
    shape.update_bound().unwrap();
    shape
}

fn world_with(margin: f32, positions: &[Vec3]) -> (MeshWorld, Vec<EntityId>) {
    let mut world = MeshWorld::new();
    let mut ids = Vec::new();
    for &position in positions {
        let shape = world.add_shape(square(margin));
        ids.push(
            world
                .add_object(shape, Transform::from_position(position))
                .unwrap(),
        );
    }
    (world, ids)
}

#[test]
fn broadphase_pairs_only_overlapping_boxes() {
    let mut broadphase = BroadPhase::new(2.0);
    let boxes = [
        Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
        Aabb::new(Vec3::new(0.5, -1.0, -1.0), Vec3::new(2.5, 1.0, 1.0)),
        Aabb::new(Vec3::splat(20.0), Vec3::splat(21.0)),
    ];
    let entries: Vec<(EntityId, Aabb)> = boxes
        .iter()
        .enumerate()
        .map(|(i, b)| (EntityId::from_index(i as u32), *b))
        .collect();

    let pairs = broadphase.get_potential_pairs(&entries);
    assert_eq!(pairs, vec![(entries[0].0, entries[1].0)]);
}

#[test]
fn detection_pass_builds_manifolds_for_contacts_only() {
    let (mut world, ids) = world_with(
        0.01,
        &[
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 5.0),
        ],
    );
    assert_eq!(world.perform_discrete_collision_detection().unwrap(), 1);

    let manifold = &world.manifolds()[0];
    assert!(manifold.references(ids[1], ids[0]));
    assert!(!manifold.points.is_empty());
    assert!(manifold.points.len() <= world.config().max_manifold_points);
    for point in &manifold.points {
        assert!(point.distance <= 0.0);
        assert!(point.point_on_a.distance(point.point_on_b) <= 2.0 * 0.02 + 1e-6);
    }
}

#[test]
fn gap_just_inside_both_margins_collides() {
    let (mut world, ids) = world_with(0.05, &[Vec3::ZERO, Vec3::new(2.08, 0.0, 0.0)]);
    world.perform_discrete_collision_detection().unwrap();
    let matrix = compute_distance_matrix(&world).unwrap();
    let act = matrix.get(ids[0], ids[1]).unwrap();
    assert_eq!(act.kind, PairKind::Collision);
    assert!((act.distance - (0.08 - 0.1)).abs() < 1e-4);
}

#[test]
fn gap_just_outside_both_margins_is_free() {
    let (mut world, ids) = world_with(0.05, &[Vec3::ZERO, Vec3::new(2.12, 0.0, 0.0)]);
    assert_eq!(world.perform_discrete_collision_detection().unwrap(), 0);
    let act = compute_distance_matrix(&world).unwrap()[0];
    assert_eq!((act.obj_a, act.obj_b), (ids[0], ids[1]));
    assert_eq!(act.kind, PairKind::Free);
    assert!((act.distance - 0.02).abs() < 1e-4);
}

#[test]
fn deeper_manifold_points_come_first() {
    let (sa, sb) = (square(0.01), square(0.01));
    let a = ObjectView {
        id: EntityId::from_index(0),
        shape: Some(&sa),
        transform: Transform::IDENTITY,
    };
    let b = ObjectView {
        id: EntityId::from_index(1),
        shape: Some(&sb),
        transform: Transform::from_position_rotation(
            Vec3::new(0.0, 0.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        ),
    };
    let manifold = NarrowPhase::collide(&a, &b, 4).unwrap().unwrap();
    let deepest = manifold.deepest().unwrap();
    assert_eq!(deepest.distance, manifold.points[0].distance);
    assert!(!sa.is_locked() && !sb.is_locked());
}
