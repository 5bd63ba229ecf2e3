//! Additional math helpers layered on top of `glam`.

use glam::Vec3;

/// Unit vector along `v`, or `fallback` when `v` is too short to normalize.
pub fn direction_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq <= f32::EPSILON * f32::EPSILON {
        fallback
    } else {
        v / len_sq.sqrt()
    }
}
