//! Exact closest-point geometry for points, segments and triangles.

use glam::Vec3;

use crate::core::mesh::Triangle;
use crate::utils::math::direction_or;

/// Segments shorter than the float spacing of their own coordinates are
/// treated as points.
const SEGMENT_EPSILON_SQ: f32 = f32::EPSILON * f32::EPSILON;

fn is_point_like(start: Vec3, end: Vec3) -> bool {
    let scale_sq = start.length_squared().max(end.length_squared());
    let len_sq = start.distance_squared(end);
    len_sq <= SEGMENT_EPSILON_SQ * scale_sq || len_sq <= f32::MIN_POSITIVE
}

/// Closest pair of points between two primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoints {
    pub point_a: Vec3,
    pub point_b: Vec3,
    pub distance_squared: f32,
}

impl ClosestPoints {
    pub fn new(point_a: Vec3, point_b: Vec3) -> Self {
        Self {
            point_a,
            point_b,
            distance_squared: point_a.distance_squared(point_b),
        }
    }

    pub fn distance(&self) -> f32 {
        self.distance_squared.sqrt()
    }

    fn keep_closer(&mut self, candidate: ClosestPoints) {
        if candidate.distance_squared < self.distance_squared {
            *self = candidate;
        }
    }
}

pub fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    if is_point_like(a, b) {
        return a;
    }
    let len_sq = ab.length_squared();
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point on a triangle to `p`, by Voronoi region classification.
pub fn closest_point_on_triangle(p: Vec3, triangle: &Triangle) -> Vec3 {
    let [a, b, c] = triangle.vertices;
    if triangle.is_degenerate() {
        return closest_point_on_edges(p, triangle);
    }

    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

fn closest_point_on_edges(p: Vec3, triangle: &Triangle) -> Vec3 {
    triangle
        .edges()
        .iter()
        .map(|&(a, b)| closest_point_on_segment(p, a, b))
        .min_by(|x, y| x.distance_squared(p).total_cmp(&y.distance_squared(p)))
        .unwrap_or(triangle.a())
}

/// Closest points between segments `p1q1` and `p2q2`.
pub fn closest_points_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> ClosestPoints {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);
    let (point_1, point_2) = (is_point_like(p1, q1), is_point_like(p2, q2));

    if point_1 && point_2 {
        return ClosestPoints::new(p1, p2);
    }

    let (s, t) = if point_1 {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if point_2 {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            // Parallel segments: any s works, pick the start.
            let mut s = if denom > 0.0 {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    ClosestPoints::new(p1 + d1 * s, p2 + d2 * t)
}

/// Point where segment `pq` crosses the triangle, if it does.
///
/// Segments lying in the triangle's plane return `None`; coplanar overlap is
/// found by the vertex and edge candidates of [`closest_points_triangles`].
pub fn segment_triangle_intersection(p: Vec3, q: Vec3, triangle: &Triangle) -> Option<Vec3> {
    if triangle.is_degenerate() {
        return None;
    }
    let n = triangle.scaled_normal();
    let a = triangle.a();
    let dp = (p - a).dot(n);
    let dq = (q - a).dot(n);
    if (dp > 0.0 && dq > 0.0) || (dp < 0.0 && dq < 0.0) || dp == dq {
        return None;
    }

    let t = dp / (dp - dq);
    let x = p + (q - p) * t;

    let tolerance = -1e-6 * n.length_squared();
    let inside = triangle
        .edges()
        .iter()
        .all(|&(u, v)| (v - u).cross(x - u).dot(n) >= tolerance);
    inside.then_some(x)
}

/// Exact closest points between two triangles. Intersecting triangles return
/// a shared point at distance zero.
pub fn closest_points_triangles(a: &Triangle, b: &Triangle) -> ClosestPoints {
    for (p, q) in a.edges() {
        if let Some(x) = segment_triangle_intersection(p, q, b) {
            return ClosestPoints::new(x, x);
        }
    }
    for (p, q) in b.edges() {
        if let Some(x) = segment_triangle_intersection(p, q, a) {
            return ClosestPoints::new(x, x);
        }
    }

    let mut best = ClosestPoints {
        point_a: a.a(),
        point_b: b.a(),
        distance_squared: f32::INFINITY,
    };
    for &v in &a.vertices {
        best.keep_closer(ClosestPoints::new(v, closest_point_on_triangle(v, b)));
    }
    for &v in &b.vertices {
        best.keep_closer(ClosestPoints::new(closest_point_on_triangle(v, a), v));
    }
    for (p1, q1) in a.edges() {
        for (p2, q2) in b.edges() {
            best.keep_closer(closest_points_segments(p1, q1, p2, q2));
        }
    }
    best
}

/// Unit direction from triangle `a` toward triangle `b` at their closest points.
///
/// When the points coincide the direction is taken from a face normal,
/// oriented toward the other triangle's centroid.
pub fn separating_direction(closest: &ClosestPoints, a: &Triangle, b: &Triangle) -> Vec3 {
    let delta = closest.point_b - closest.point_a;
    if !is_point_like(closest.point_a, closest.point_b) {
        return delta / closest.distance();
    }

    let towards_b = b.centroid() - a.centroid();
    let face = if a.is_degenerate() { b.normal() } else { a.normal() };
    if face != Vec3::ZERO {
        return if face.dot(towards_b) < 0.0 { -face } else { face };
    }
    direction_or(towards_b, Vec3::Z)
}
