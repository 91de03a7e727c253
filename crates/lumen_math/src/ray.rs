use crate::Vec3;

/// A ray in 3D space: an origin point and a direction.
///
/// Producers normally hand out a unit `direction`, but the type does not
/// enforce it. Two other uses exist:
/// - surface normals are carried as a `Ray3` whose origin is the hit point
///   and whose direction is the unit outward normal;
/// - cube faces are stored as (face center, outward normal).
///
/// Intersection code assumes unit directions when it measures distances
/// along the ray.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray3 {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray3 {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }
}
