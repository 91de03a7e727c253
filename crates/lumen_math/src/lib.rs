//! Lumen math - the geometry kernel.
//!
//! Double precision vectors come from glam; this crate adds the ray type,
//! a couple of free helpers the tracer leans on and the viewer camera.

pub use glam;
pub use glam::DVec3 as Vec3;

mod camera;
mod ray;

pub use camera::Camera;
pub use ray::Ray3;

/// World up axis. The scene is z-up: the camera's horizon is the xy plane.
pub const WORLD_UP: Vec3 = Vec3::Z;

/// Normalize `v`, leaving the zero vector untouched.
///
/// Callers must not assume a unit result: a zero input yields a zero output
/// instead of NaNs.
#[inline]
pub fn normalize(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}

/// Mirror `direction` about the plane with unit `normal`.
///
/// d' = d - 2 (d . n) n
#[inline]
pub fn reflect(direction: Vec3, normal: Vec3) -> Vec3 {
    direction - normal * (2.0 * direction.dot(normal))
}
