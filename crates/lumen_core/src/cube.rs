//! Axis-aligned cube primitive.

use lumen_math::{Ray3, Vec3};

/// Face hits closer than this along the ray are ignored (self-intersection
/// guard for rays that start on a face).
const FACE_EPSILON: f64 = 1e-5;

/// How many times a texture repeats across one face, per axis.
const TEXTURE_REPEAT: f64 = 5.0;

/// An axis-aligned cube, stored as six face planes.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    pub center: Vec3,
    pub side_length: f64,
    /// (face center, outward unit normal) for -x, +x, -y, +y, -z, +z
    faces: [Ray3; 6],
}

impl Cube {
    /// Create a new cube.
    pub fn new(center: Vec3, side_length: f64) -> Self {
        let hs = side_length / 2.0;
        let face = |normal: Vec3| Ray3::new(center + normal * hs, normal);
        Self {
            center,
            side_length,
            faces: [
                face(-Vec3::X),
                face(Vec3::X),
                face(-Vec3::Y),
                face(Vec3::Y),
                face(-Vec3::Z),
                face(Vec3::Z),
            ],
        }
    }

    /// Intersect a ray with a unit direction against the cube.
    ///
    /// Each face plane is oriented towards the ray origin, the ray is
    /// projected onto it, and the hit is kept if it lies ahead of the
    /// origin and inside the face square. The nearest accepted face wins;
    /// on exact ties the earlier face in -x, +x, -y, +y, -z, +z order does.
    pub fn collide(&self, ray: &Ray3) -> Option<Ray3> {
        let hs = self.side_length / 2.0;
        let mut closest: Option<(Ray3, f64)> = None;

        for face in &self.faces {
            let mut face_normal = face.direction;
            let mut distance = (ray.origin - face.origin).dot(face_normal);
            if distance < 0.0 {
                face_normal = -face_normal;
                distance = -distance;
            }

            // Walks back from the origin when the ray runs away from the
            // face; a parallel ray yields a non-finite point. Both fail
            // the check below.
            let point = ray.origin - ray.direction * (distance / ray.direction.dot(face_normal));
            let ahead = (point - ray.origin).dot(ray.direction);
            if !(ahead >= FACE_EPSILON) {
                continue;
            }

            let offset = point - face.origin;
            let inside = offset.x.abs() <= hs && offset.y.abs() <= hs && offset.z.abs() <= hs;
            if !inside {
                continue;
            }

            let distance_squared = (point - ray.origin).length_squared();
            if closest.map_or(true, |(_, best)| distance_squared < best) {
                closest = Some((Ray3::new(point, face_normal), distance_squared));
            }
        }

        closest.map(|(normal, _)| normal)
    }

    /// Tiled texture coordinates of a surface point.
    ///
    /// The two axes spanning the face are the ones other than the dominant
    /// component of the point's offset from the center. When components
    /// tie (edges and corners) the first pair in the order (x, y), (x, z),
    /// (y, z) is used, i.e. z is preferred as the face axis, then y.
    pub fn texture_coordinates(&self, point: Vec3) -> (f64, f64) {
        let offset = point - self.center;
        let magnitude = offset.abs();

        let (a, b) = if magnitude.z >= magnitude.x && magnitude.z >= magnitude.y {
            (offset.x, offset.y)
        } else if magnitude.y >= magnitude.x {
            (offset.x, offset.z)
        } else {
            (offset.y, offset.z)
        };

        let tile = |c: f64| (TEXTURE_REPEAT * (c / self.side_length + 0.5)).rem_euclid(1.0);
        (tile(a), tile(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Cube {
        Cube::new(Vec3::ZERO, 1.0)
    }

    #[test]
    fn test_cube_hit_from_positive_x() {
        let cube = unit_cube();
        let ray = Ray3::new(Vec3::new(5.0, 0.0, 0.0), -Vec3::X);

        let normal = cube.collide(&ray).expect("ray aimed at the cube must hit");
        assert!((normal.origin - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-12);
        assert_eq!(normal.direction, Vec3::X);
    }

    #[test]
    fn test_cube_hit_each_axis() {
        let cube = Cube::new(Vec3::new(1.0, 2.0, 3.0), 2.0);
        let ray = Ray3::new(Vec3::new(1.0, 2.0, -10.0), Vec3::Z);

        let normal = cube.collide(&ray).expect("should hit the -z face");
        assert!((normal.origin - Vec3::new(1.0, 2.0, 2.0)).length() < 1e-12);
        assert_eq!(normal.direction, -Vec3::Z);
    }

    #[test]
    fn test_cube_miss_outside_face() {
        let cube = unit_cube();
        let ray = Ray3::new(Vec3::new(5.0, 0.6, 0.0), -Vec3::X);
        assert!(cube.collide(&ray).is_none());
    }

    #[test]
    fn test_cube_pointing_away() {
        let cube = unit_cube();
        let ray = Ray3::new(Vec3::new(5.0, 0.0, 0.0), Vec3::X);
        assert!(cube.collide(&ray).is_none());
    }

    #[test]
    fn test_cube_parallel_ray_misses() {
        let cube = unit_cube();
        let ray = Ray3::new(Vec3::new(0.0, 5.0, 5.0), Vec3::X);
        assert!(cube.collide(&ray).is_none());
    }

    #[test]
    fn test_cube_from_inside() {
        let cube = unit_cube();
        let ray = Ray3::new(Vec3::ZERO, Vec3::Y);

        let normal = cube.collide(&ray).expect("ray from inside must hit a face");
        assert!((normal.origin - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-12);
        // Oriented towards the ray origin, i.e. the interior.
        assert_eq!(normal.direction, -Vec3::Y);
    }

    #[test]
    fn test_cube_from_face_ignores_self() {
        let cube = unit_cube();
        let ray = Ray3::new(Vec3::new(0.5, 0.0, 0.0), Vec3::X);
        assert!(cube.collide(&ray).is_none());
    }

    #[test]
    fn test_cube_diagonal_picks_nearest_face() {
        let cube = unit_cube();
        let direction = Vec3::new(-1.0, -0.2, 0.0).normalize();
        let ray = Ray3::new(Vec3::new(3.0, 0.3, 0.0), direction);

        let normal = cube.collide(&ray).expect("should hit");
        assert_eq!(normal.direction, Vec3::X);
        assert!((normal.origin.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_texture_coordinates_tile() {
        let cube = unit_cube();

        // +z face: spans x and y.
        let (u, v) = cube.texture_coordinates(Vec3::new(0.0, 0.0, 0.5));
        assert!((u - 0.5).abs() < 1e-12);
        assert!((v - 0.5).abs() < 1e-12);

        // Five repeats per face: a tenth of the side is half a tile.
        let (u, _) = cube.texture_coordinates(Vec3::new(0.1, 0.0, 0.5));
        assert!(u.abs() < 1e-9 || (u - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_texture_coordinates_face_axes() {
        let cube = unit_cube();

        // +x face: spans y and z.
        let (u, v) = cube.texture_coordinates(Vec3::new(0.5, 0.05, -0.05));
        assert!((u - 0.75).abs() < 1e-9);
        assert!((v - 0.25).abs() < 1e-9);

        // +y face: spans x and z.
        let (u, v) = cube.texture_coordinates(Vec3::new(0.05, 0.5, 0.0));
        assert!((u - 0.75).abs() < 1e-9);
        assert!((v - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_texture_coordinates_edge_tie() {
        let cube = unit_cube();

        // On the x/z edge |x| == |z|: z wins, so the face spans x and y.
        let point = Vec3::new(0.5, 0.05, 0.5);
        let (u, v) = cube.texture_coordinates(point);
        let expected_u = (TEXTURE_REPEAT * (0.5 + 0.5)).rem_euclid(1.0);
        let expected_v = (TEXTURE_REPEAT * (0.05 + 0.5)).rem_euclid(1.0);
        assert!((u - expected_u).abs() < 1e-12);
        assert!((v - expected_v).abs() < 1e-12);

        // On the x/y edge: y wins over x, face spans x and z.
        let point = Vec3::new(0.5, 0.5, 0.05);
        let (_, v) = cube.texture_coordinates(point);
        assert!((v - expected_v).abs() < 1e-12);
    }
}
