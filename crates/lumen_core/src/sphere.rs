//! Sphere primitive.

use std::f64::consts::PI;

use lumen_math::{normalize, Ray3, Vec3};

/// Roots at or behind this distance along the ray are ignored, so rays
/// spawned on the surface do not hit it again.
const HIT_EPSILON: f64 = 1e-6;

/// A sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Intersect a ray with a unit direction against the sphere.
    ///
    /// Returns the surface normal ray at the nearest hit in front of the
    /// ray origin. When the origin is inside the sphere the normal is
    /// flipped to face the interior, which is the side the ray sees.
    pub fn collide(&self, ray: &Ray3) -> Option<Ray3> {
        let radius_squared = self.radius * self.radius;

        let along = (self.center - ray.origin).dot(ray.direction);
        let closest_point = ray.at(along);
        let perpendicular = closest_point - self.center;
        let perpendicular_squared = perpendicular.length_squared();
        if perpendicular_squared >= radius_squared {
            return None;
        }

        let half_chord = ray.direction * (radius_squared - perpendicular_squared).sqrt();
        let near = self.center + perpendicular - half_chord;
        let far = self.center + perpendicular + half_chord;
        let near_distance = (near - ray.origin).dot(ray.direction);
        let far_distance = (far - ray.origin).dot(ray.direction);

        let near_ok = near_distance > HIT_EPSILON;
        let far_ok = far_distance > HIT_EPSILON;
        let point = match (near_ok, far_ok) {
            (false, false) => return None,
            (true, false) => near,
            (false, true) => far,
            (true, true) if near_distance < far_distance => near,
            (true, true) => far,
        };

        let mut normal = point - self.center;
        if (ray.origin - self.center).length_squared() < radius_squared {
            normal = -normal;
        }
        Some(Ray3::new(point, normalize(normal)))
    }

    /// Equirectangular texture coordinates of a surface point.
    ///
    /// `u` is longitude around the z axis, `v` runs from the north pole
    /// (0) to the south pole (1), matching image row order.
    pub fn texture_coordinates(&self, point: Vec3) -> (f64, f64) {
        let local = point - self.center;
        let u = local.y.atan2(local.x) / (2.0 * PI) + 0.5;
        let latitude = (local.z / local.length()).clamp(-1.0, 1.0).asin() / PI + 0.5;
        (u, 1.0 - latitude)
    }
}
