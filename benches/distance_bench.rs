use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use min_dist::*;
use std::hint::black_box;

fn generate_grid_mesh(resolution: usize) -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for y in 0..=resolution {
        for x in 0..=resolution {
            vertices.push(Vec3::new(x as f32, 0.0, y as f32) / resolution as f32);
        }
    }
    let width = resolution + 1;
    for y in 0..resolution {
        for x in 0..resolution {
            let i = y * width + x;
            let a = i as u32;
            let b = (i + 1) as u32;
            let c = (i + width) as u32;
            let d = (i + width + 1) as u32;
            indices.push([a, b, c]);
            indices.push([b, d, c]);
        }
    }
    (vertices, indices)
}

fn grid_shape(resolution: usize) -> MeshShape {
    let (vertices, indices) = generate_grid_mesh(resolution);
    let mesh = TriangleMesh::builder(vertices, indices).recenter().build();
    let shape = MeshShape::new(mesh).with_margin(1e-3);
    shape.update_bound().unwrap();
    shape
}

fn prepare_world(object_count: usize, resolution: usize) -> MeshWorld {
    let mut world = MeshWorld::new();
    let shape = world.add_shape(grid_shape(resolution));
    for i in 0..object_count {
        let transform = Transform::from_position_rotation(
            Vec3::new((i % 4) as f32 * 1.5, (i / 4) as f32 * 0.8, (i % 3) as f32 * 1.2),
            Quat::from_rotation_z(i as f32 * 0.3),
        );
        world.add_object(shape, transform).ok();
    }
    world.perform_discrete_collision_detection().ok();
    world
}

fn bench_bvh_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bvh_build");
    for &res in &[16usize, 32, 64] {
        group.bench_with_input(BenchmarkId::new("update_bound", res), &res, |b, &res| {
            let shape = grid_shape(res);
            b.iter(|| {
                shape.update_bound().unwrap();
                black_box(shape.has_bound())
            })
        });
    }
    group.finish();
}

fn bench_distance_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("distance_matrix");
    for &count in &[8usize, 16, 32] {
        let world = prepare_world(count, 16);
        group.bench_with_input(BenchmarkId::new("sequential", count), &world, |b, world| {
            let mut aggregator = ResultAggregator::new(DistanceConfig::sequential());
            b.iter(|| black_box(aggregator.compute(world).ok()))
        });
        group.bench_with_input(BenchmarkId::new("parallel", count), &world, |b, world| {
            let mut aggregator =
                ResultAggregator::new(DistanceConfig::default().with_parallel_threshold(1));
            b.iter(|| black_box(aggregator.compute(world).ok()))
        });
    }
    group.finish();
}

fn bench_collision_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("discrete_collision_detection");
    for &count in &[8usize, 32] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = prepare_world(count, 16);
            b.iter(|| black_box(world.perform_discrete_collision_detection().ok()))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_bvh_build,
    bench_distance_matrix,
    bench_collision_detection
);
criterion_main!(benches);
