use crate::{normalize, Ray3, Vec3, WORLD_UP};

/// Vertical look limit in degrees, measured from the horizon.
const MAX_PITCH: f64 = 89.0;

/// Viewer camera: a pose ray plus lens settings.
///
/// `pose.origin` is the eye position and `pose.direction` the unit view
/// direction. The horizon is the xy plane (z is up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pose: Ray3,
    /// Field of view in degrees
    pub fov: f64,
    /// Width of the near plane in world units
    pub size: f64,
}

impl Camera {
    /// Create a new camera. The direction is normalized.
    pub fn new(position: Vec3, direction: Vec3, fov: f64, size: f64) -> Self {
        Self {
            pose: Ray3::new(position, normalize(direction)),
            fov,
            size,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.pose.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.pose.direction
    }

    /// Screen-right axis: view direction crossed with world up.
    fn right(&self) -> Vec3 {
        normalize(self.pose.direction.cross(WORLD_UP))
    }

    /// Build the primary ray through normalized screen coordinates.
    ///
    /// `x` and `y` range over [0, 1] with (0, 0) at the bottom-left.
    /// The ray starts on the near plane (width `size`) and points at the
    /// matching spot on a far plane one unit ahead, widened by
    /// `2 tan(fov / 2)` to give the perspective spread.
    pub fn ray(&self, x: f64, y: f64, aspect_ratio: f64) -> Ray3 {
        let position = self.pose.origin;
        let direction = self.pose.direction;
        let x_axis = self.right();
        let y_axis = x_axis.cross(direction);

        let width_near = self.size;
        let height_near = width_near / aspect_ratio;

        let width_far = 2.0 * (self.fov / 2.0).to_radians().tan() + width_near;
        let height_far = width_far / aspect_ratio;

        let origin_near = position - x_axis * (width_near / 2.0) - y_axis * (height_near / 2.0);
        let origin_far =
            position + direction - x_axis * (width_far / 2.0) - y_axis * (height_far / 2.0);

        let point_near = origin_near + x_axis * (x * width_near) + y_axis * (y * height_near);
        let point_far = origin_far + x_axis * (x * width_far) + y_axis * (y * height_far);

        Ray3::new(point_near, normalize(point_far - point_near))
    }

    /// Translate the camera.
    ///
    /// `movement.y` moves along the view direction, `movement.x` strafes
    /// along the screen-right axis. `movement.z` is ignored.
    pub fn translate(&mut self, movement: Vec3) {
        self.pose.origin += self.pose.direction * movement.y + self.right() * movement.x;
    }

    /// Turn the camera by `dx` degrees of yaw and `dy` degrees of pitch.
    ///
    /// Pitch is clamped so the view never passes 89 degrees above or below
    /// the horizon. The turn is applied as tangential and radial offsets on
    /// the unit sphere of directions followed by a renormalization, which
    /// tracks a true rotation closely for the small per-frame deltas the
    /// viewer produces.
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        let direction = self.pose.direction;
        let sin = direction.z.clamp(-1.0, 1.0);
        let pitch = sin.asin().to_degrees();

        let dy = if pitch + dy > MAX_PITCH {
            MAX_PITCH - pitch
        } else if pitch + dy < -MAX_PITCH {
            -MAX_PITCH - pitch
        } else {
            dy
        };

        let cos = (1.0 - sin * sin).sqrt();
        let (sin_half, cos_half) = (dx / 2.0).to_radians().sin_cos();
        let yaw_tangent = normalize(direction.cross(WORLD_UP)) * (2.0 * cos * cos_half * sin_half);
        let yaw_radius =
            normalize(yaw_tangent.cross(WORLD_UP)) * (2.0 * cos * sin_half * sin_half);

        let (sin_half, cos_half) = (dy / 2.0).to_radians().sin_cos();
        let pitch_tangent = normalize(direction.cross(direction.cross(WORLD_UP)))
            * (-2.0 * cos_half * sin_half);
        let pitch_radius = direction * (2.0 * sin_half * sin_half);

        self.pose.direction =
            normalize(direction + yaw_tangent + yaw_radius + pitch_tangent + pitch_radius);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::X, 90.0, 0.0)
    }
}
