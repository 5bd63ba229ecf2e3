use approx::assert_abs_diff_eq;
use min_dist::core::mesh::MeshBvh;
use min_dist::*;

fn grid_mesh(resolution: u32) -> TriangleMesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for y in 0..=resolution {
        for x in 0..=resolution {
            vertices.push(Vec3::new(x as f32, 0.0, y as f32));
        }
    }
    let width = resolution + 1;
    for y in 0..resolution {
        for x in 0..resolution {
            let i = y * width + x;
            indices.push([i, i + 1, i + width]);
            indices.push([i + 1, i + width + 1, i + width]);
        }
    }
    TriangleMesh::builder(vertices, indices).build()
}

#[test]
fn weld_vertices_reduces_duplicates() {
    let vertices = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    ];
    let indices = vec![[0, 2, 4], [1, 3, 4]];

    let mesh = TriangleMesh::builder(vertices, indices)
        .weld_vertices(0.01)
        .build();

    assert_eq!(mesh.vertices.len(), 3);
    assert_eq!(mesh.indices[0], mesh.indices[1]);
}

#[test]
fn bvh_has_one_leaf_per_triangle_and_covers_the_mesh() {
    let mesh = grid_mesh(6);
    let bvh = MeshBvh::build(&mesh);

    assert_eq!(bvh.leaf_count(), mesh.triangle_count());
    assert_eq!(bvh.nodes.len(), 2 * mesh.triangle_count() - 1);

    let root = bvh.node(bvh.root().unwrap()).unwrap();
    assert_abs_diff_eq!(root.bounds.min.x, mesh.bounds.min.x);
    assert_abs_diff_eq!(root.bounds.max.z, mesh.bounds.max.z);

    // Median splits keep the tree close to balanced.
    let leaves = mesh.triangle_count() as f32;
    assert!(bvh.depth() as f32 <= leaves.log2().ceil() + 1.0);
}

#[test]
fn shape_bounds_are_inflated_by_the_margin() {
    let margin = 1e-4;
    let shape = MeshShape::new(TriangleMesh::square(1.0)).with_margin(margin);
    let aabb = shape.aabb(&Transform::from_position(Vec3::new(3.0, 0.0, 0.0)));

    assert_abs_diff_eq!(aabb.min.x, 2.0 - margin, epsilon = 1e-6);
    assert_abs_diff_eq!(aabb.max.x, 4.0 + margin, epsilon = 1e-6);
    assert_abs_diff_eq!(aabb.min.z, -margin, epsilon = 1e-6);
    assert!((aabb.max - Vec3::new(4.0, 1.0, 0.0)).length() <= 2.0 * margin);
}

#[test]
fn rotated_bounds_enclose_rotated_corners() {
    let mesh = TriangleMesh::square(1.0);
    let transform = Transform::from_rotation(Quat::from_rotation_z(std::f32::consts::FRAC_PI_4));
    let aabb = mesh.bounds.transformed(&transform);
    let expected = std::f32::consts::SQRT_2;
    assert_abs_diff_eq!(aabb.max.x, expected, epsilon = 1e-5);
    assert_abs_diff_eq!(aabb.min.y, -expected, epsilon = 1e-5);
}

#[test]
fn negative_margin_is_clamped() {
    let shape = MeshShape::new(TriangleMesh::square(1.0)).with_margin(-0.5);
    assert_eq!(shape.margin(), 0.0);
    assert_eq!(
        MeshShape::new(TriangleMesh::square(1.0)).margin(),
        min_dist::config::DEFAULT_COLLISION_MARGIN
    );
}

#[test]
fn hierarchy_lock_is_scoped() {
    let shape = MeshShape::new(grid_mesh(2));
    assert!(shape.lock_hierarchy().is_none());

    shape.update_bound().unwrap();
    {
        let first = shape.lock_hierarchy().unwrap();
        let second = shape.lock_hierarchy().unwrap();
        assert_eq!(shape.active_locks(), 2);
        assert_eq!(first.root(), second.root());
    }
    assert!(!shape.is_locked());
}
