use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::types::Transform;

/// Bound on `|n|^2 / longest_edge^4` under which a triangle is treated as a
/// segment or point. Dimensionless, so it holds at any mesh scale.
const DEGENERATE_RATIO: f32 = 1e-12;

/// Axis-aligned bounding box used for mesh bounds and BVH nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bounds = Self::empty();
        for &p in points {
            bounds.extend(p);
        }
        bounds
    }

    /// Size measure used to decide which node of a pair to split first.
    /// Flat boxes have zero volume, so the squared diagonal is used instead.
    pub fn size_metric(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        (self.max - self.min).length_squared()
    }

    pub fn expanded(&self, margin: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// World-space box enclosing this local box after a rigid transform.
    pub fn transformed(&self, transform: &Transform) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        let mut bounds = Aabb::empty();
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            bounds.extend(transform.transform_point(corner));
        }
        bounds
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    /// Squared gap between two boxes; zero when they overlap.
    pub fn distance_squared(&self, other: &Aabb) -> f32 {
        let gap = (other.min - self.max)
            .max(self.min - other.max)
            .max(Vec3::ZERO);
        gap.length_squared()
    }
}

/// A triangle with its three corners, in whatever frame it was fetched in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub vertices: [Vec3; 3],
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    pub fn a(&self) -> Vec3 {
        self.vertices[0]
    }

    pub fn b(&self) -> Vec3 {
        self.vertices[1]
    }

    pub fn c(&self) -> Vec3 {
        self.vertices[2]
    }

    /// Unnormalized face normal (twice the area).
    pub fn scaled_normal(&self) -> Vec3 {
        (self.b() - self.a()).cross(self.c() - self.a())
    }

    pub fn normal(&self) -> Vec3 {
        self.scaled_normal().normalize_or_zero()
    }

    pub fn longest_edge_squared(&self) -> f32 {
        self.edges()
            .iter()
            .map(|&(u, v)| u.distance_squared(v))
            .fold(0.0, f32::max)
    }

    /// Compares `|n|^2` against the fourth power of the longest edge.
    pub fn is_degenerate(&self) -> bool {
        let longest_sq = self.longest_edge_squared();
        self.scaled_normal().length_squared() <= DEGENERATE_RATIO * longest_sq * longest_sq
    }

    pub fn centroid(&self) -> Vec3 {
        (self.a() + self.b() + self.c()) / 3.0
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.vertices)
    }

    pub fn edges(&self) -> [(Vec3, Vec3); 3] {
        [
            (self.vertices[0], self.vertices[1]),
            (self.vertices[1], self.vertices[2]),
            (self.vertices[2], self.vertices[0]),
        ]
    }

    pub fn transformed(&self, transform: &Transform) -> Triangle {
        Triangle {
            vertices: self.vertices.map(|v| transform.transform_point(v)),
        }
    }
}

/// BVH node. Leaves cover exactly one triangle (`count == 1`) and have no children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshBvhNode {
    pub bounds: Aabb,
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub start: usize,
    pub count: usize,
}

impl MeshBvhNode {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Binary bounding-volume tree over the triangles of a mesh, in mesh-local space.
///
/// Node 0 is the root. `primitives[node.start..node.start + node.count]` are
/// the triangle indices covered by a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshBvh {
    pub nodes: Vec<MeshBvhNode>,
    pub primitives: Vec<usize>,
}

impl MeshBvh {
    /// Top-down build splitting at the median centroid of the longest axis.
    pub fn build(mesh: &TriangleMesh) -> Self {
        let count = mesh.triangle_count();
        let triangles: Vec<Option<Triangle>> = (0..count).map(|i| mesh.triangle(i)).collect();
        let mut bvh = MeshBvh {
            nodes: Vec::with_capacity(count.saturating_mul(2)),
            primitives: (0..count).filter(|&i| triangles[i].is_some()).collect(),
        };
        if bvh.primitives.is_empty() {
            return bvh;
        }

        let degenerate = triangles
            .iter()
            .flatten()
            .filter(|t| t.is_degenerate())
            .count();
        if degenerate > 0 {
            log::warn!("mesh contains {degenerate} degenerate triangle(s)");
        }
        let centroids: Vec<Vec3> = triangles
            .iter()
            .map(|t| t.map_or(Vec3::ZERO, |t| t.centroid()))
            .collect();
        let boxes: Vec<Aabb> = triangles
            .iter()
            .map(|t| t.map_or(Aabb::empty(), |t| t.bounds()))
            .collect();

        let leaves = bvh.primitives.len();
        bvh.build_node(&boxes, &centroids, 0, leaves);
        log::debug!(
            "built mesh BVH: {} triangles, {} nodes, depth {}",
            leaves,
            bvh.nodes.len(),
            bvh.depth()
        );
        bvh
    }

    fn build_node(&mut self, boxes: &[Aabb], centroids: &[Vec3], start: usize, end: usize) -> usize {
        let index = self.nodes.len();
        let bounds = self.primitives[start..end]
            .iter()
            .fold(Aabb::empty(), |acc, &p| acc.merge(&boxes[p]));
        self.nodes.push(MeshBvhNode {
            bounds,
            left: None,
            right: None,
            start,
            count: end - start,
        });

        if end - start == 1 {
            return index;
        }

        let centroid_bounds = self.primitives[start..end]
            .iter()
            .fold(Aabb::empty(), |mut acc, &p| {
                acc.extend(centroids[p]);
                acc
            });
        let size = centroid_bounds.max - centroid_bounds.min;
        let axis = if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        };
        self.primitives[start..end]
            .sort_by(|&a, &b| centroids[a][axis].total_cmp(&centroids[b][axis]));

        let mid = start + (end - start) / 2;
        let left = self.build_node(boxes, centroids, start, mid);
        let right = self.build_node(boxes, centroids, mid, end);
        self.nodes[index].left = Some(left);
        self.nodes[index].right = Some(right);
        index
    }

    pub fn root(&self) -> Option<usize> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn node(&self, index: usize) -> Option<&MeshBvhNode> {
        self.nodes.get(index)
    }

    /// Triangle index held by a leaf node.
    pub fn leaf_primitive(&self, index: usize) -> Option<usize> {
        let node = self.nodes.get(index)?;
        if node.is_leaf() {
            self.primitives.get(node.start).copied()
        } else {
            None
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(bvh: &MeshBvh, index: usize) -> usize {
            match bvh.nodes.get(index) {
                Some(node) => {
                    let left = node.left.map_or(0, |l| walk(bvh, l));
                    let right = node.right.map_or(0, |r| walk(bvh, r));
                    1 + left.max(right)
                }
                None => 0,
            }
        }
        self.root().map_or(0, |root| walk(self, root))
    }
}

/// Triangle mesh geometry in its local frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<[u32; 3]>,
    pub bounds: Aabb,
}

impl TriangleMesh {
    pub fn builder(vertices: Vec<Vec3>, indices: Vec<[u32; 3]>) -> MeshBuilder {
        MeshBuilder::new(vertices, indices)
    }

    /// Two triangles spanning `[-half, half]²` in the local XY plane.
    pub fn square(half: f32) -> Self {
        let vertices = vec![
            Vec3::new(-half, -half, 0.0),
            Vec3::new(half, -half, 0.0),
            Vec3::new(half, half, 0.0),
            Vec3::new(-half, half, 0.0),
        ];
        let indices = vec![[0, 1, 2], [2, 3, 0]];
        MeshBuilder::new(vertices, indices).build()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        let [a, b, c] = *self.indices.get(index)?;
        Some(Triangle::new(
            *self.vertices.get(a as usize)?,
            *self.vertices.get(b as usize)?,
            *self.vertices.get(c as usize)?,
        ))
    }
}

/// Helper used to cook triangle meshes from raw vertex/index buffers.
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    vertices: Vec<Vec3>,
    indices: Vec<[u32; 3]>,
}

impl MeshBuilder {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<[u32; 3]>) -> Self {
        Self { vertices, indices }
    }

    /// Deduplicates vertices using a quantized grid for stability.
    pub fn weld_vertices(mut self, epsilon: f32) -> Self {
        if epsilon <= 0.0 || self.vertices.is_empty() {
            return self;
        }

        let inv = 1.0 / epsilon;
        let mut map: HashMap<(i32, i32, i32), u32> = HashMap::new();
        let mut new_vertices: Vec<Vec3> = Vec::new();
        let mut remap: Vec<u32> = Vec::with_capacity(self.vertices.len());

        for v in &self.vertices {
            let key = (
                (v.x * inv).round() as i32,
                (v.y * inv).round() as i32,
                (v.z * inv).round() as i32,
            );
            let index = *map.entry(key).or_insert_with(|| {
                let idx = new_vertices.len() as u32;
                new_vertices.push(*v);
                idx
            });
            remap.push(index);
        }

        for tri in &mut self.indices {
            for corner in tri.iter_mut() {
                if let Some(&mapped) = remap.get(*corner as usize) {
                    *corner = mapped;
                }
            }
        }

        self.vertices = new_vertices;
        self
    }

    /// Recenters vertices around their centroid.
    pub fn recenter(mut self) -> Self {
        if self.vertices.is_empty() {
            return self;
        }
        let centroid: Vec3 =
            self.vertices.iter().copied().sum::<Vec3>() / self.vertices.len() as f32;
        for vertex in &mut self.vertices {
            *vertex -= centroid;
        }
        self
    }

    /// Finalizes the mesh, dropping triangles that index past the vertex buffer.
    pub fn build(self) -> TriangleMesh {
        let vertex_count = self.vertices.len();
        let before = self.indices.len();
        let indices: Vec<[u32; 3]> = self
            .indices
            .into_iter()
            .filter(|tri| tri.iter().all(|&i| (i as usize) < vertex_count))
            .collect();
        if indices.len() != before {
            log::warn!(
                "dropped {} triangle(s) with out-of-range vertex indices",
                before - indices.len()
            );
        }
        let bounds = Aabb::from_points(&self.vertices);
        TriangleMesh {
            vertices: self.vertices,
            indices,
            bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_mesh(resolution: usize) -> TriangleMesh {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for y in 0..=resolution {
            for x in 0..=resolution {
                vertices.push(Vec3::new(x as f32, y as f32, 0.0));
            }
        }
        let width = (resolution + 1) as u32;
        for y in 0..resolution as u32 {
            for x in 0..resolution as u32 {
                let i = y * width + x;
                indices.push([i, i + 1, i + width]);
                indices.push([i + 1, i + width + 1, i + width]);
            }
        }
        TriangleMesh::builder(vertices, indices).build()
    }

    #[test]
    fn bvh_has_one_leaf_per_triangle() {
        let mesh = grid_mesh(4);
        let bvh = MeshBvh::build(&mesh);
        assert_eq!(bvh.leaf_count(), mesh.triangle_count());
        assert_eq!(bvh.nodes.len(), 2 * mesh.triangle_count() - 1);

        let mut seen: Vec<usize> = (0..bvh.nodes.len())
            .filter_map(|n| bvh.leaf_primitive(n))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..mesh.triangle_count()).collect::<Vec<_>>());
    }

    #[test]
    fn parent_bounds_cover_children() {
        let mesh = grid_mesh(3);
        let bvh = MeshBvh::build(&mesh);
        for node in &bvh.nodes {
            for child in [node.left, node.right].into_iter().flatten() {
                let child_bounds = bvh.nodes[child].bounds;
                assert!(node.bounds.min.cmple(child_bounds.min).all());
                assert!(node.bounds.max.cmpge(child_bounds.max).all());
            }
        }
        assert_eq!(bvh.nodes[0].bounds, mesh.bounds);
    }

    #[test]
    fn empty_mesh_builds_empty_bvh() {
        let mesh = TriangleMesh::builder(Vec::new(), Vec::new()).build();
        let bvh = MeshBvh::build(&mesh);
        assert!(bvh.root().is_none());
        assert_eq!(bvh.depth(), 0);
    }

    #[test]
    fn out_of_range_triangles_are_dropped() {
        let mesh = TriangleMesh::builder(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2], [0, 1, 7]],
        )
        .build();
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn box_distance_is_axis_gap() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::new(3.0, 0.0, 0.0), Vec3::new(4.0, 1.0, 1.0));
        assert!((a.distance_squared(&b) - 4.0).abs() < 1e-6);
        assert_eq!(a.distance_squared(&a), 0.0);
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn transformed_box_contains_rotated_corners() {
        let local = Aabb::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let t = Transform::from_position_rotation(
            Vec3::new(2.0, 0.0, 0.0),
            glam::Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let world = local.transformed(&t);
        assert!((world.min.x - 2.0).abs() < 1e-5);
        assert!((world.max.x - 2.0).abs() < 1e-5);
        assert!((world.min.z + 1.0).abs() < 1e-5);
    }
}
