//! Scene aggregate: camera, entities and lights.

use lumen_math::{Camera, Ray3, Vec3};

use crate::color;
use crate::entity::{Collision, Entity};

/// A point light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    /// Packed 0xRRGGBB
    pub color: u32,
}

impl Light {
    pub fn new(position: Vec3, color: u32) -> Self {
        Self { position, color }
    }

    /// Color channels normalized to [0, 1].
    #[inline]
    pub fn channels(&self) -> [f64; 3] {
        color::channels(self.color)
    }
}

/// Everything the tracer needs to render one view.
///
/// Entities and lights are fixed once the scene is built; only the camera
/// moves. Entity order matters only for exact distance ties in
/// [`Scene::cast_ray`], where the earlier entity wins.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub camera: Camera,
    pub entities: Vec<Entity>,
    pub lights: Vec<Light>,
}

impl Scene {
    /// Create an empty scene viewed through `camera`.
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            entities: Vec::new(),
            lights: Vec::new(),
        }
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Find the closest entity hit by `ray`.
    ///
    /// Linear scan over every entity, comparing squared distances from the
    /// ray origin to each hit point.
    pub fn cast_ray(&self, ray: &Ray3) -> Option<Collision<'_>> {
        let mut closest: Option<(Collision<'_>, f64)> = None;

        for entity in &self.entities {
            let Some(normal) = entity.collide(ray) else {
                continue;
            };
            let distance_squared = (normal.origin - ray.origin).length_squared();
            if closest.map_or(true, |(_, best)| distance_squared < best) {
                closest = Some((Collision { entity, normal }, distance_squared));
            }
        }

        closest.map(|(collision, _)| collision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Surface;

    fn scene_with(entities: Vec<Entity>) -> Scene {
        Scene {
            entities,
            ..Scene::default()
        }
    }

    #[test]
    fn test_empty_scene_misses() {
        let scene = Scene::default();
        let ray = Ray3::new(Vec3::ZERO, Vec3::X);
        assert!(scene.cast_ray(&ray).is_none());
    }

    #[test]
    fn test_cast_ray_picks_closest() {
        let scene = scene_with(vec![
            Entity::sphere(Vec3::new(10.0, 0.0, 0.0), 1.0, Surface::Diffuse),
            Entity::sphere(Vec3::new(5.0, 0.0, 0.0), 1.0, Surface::Specular),
            Entity::cube(Vec3::new(-5.0, 0.0, 0.0), 1.0, Surface::Diffuse),
        ]);
        let ray = Ray3::new(Vec3::ZERO, Vec3::X);

        let collision = scene.cast_ray(&ray).expect("should hit");
        assert_eq!(collision.surface(), Surface::Specular);
        assert!((collision.point() - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn test_exact_tie_keeps_first_entity() {
        let scene = scene_with(vec![
            Entity::sphere(Vec3::new(5.0, 0.0, 0.0), 1.0, Surface::Transparent),
            Entity::sphere(Vec3::new(5.0, 0.0, 0.0), 1.0, Surface::Specular),
        ]);
        let ray = Ray3::new(Vec3::ZERO, Vec3::X);

        let collision = scene.cast_ray(&ray).expect("should hit");
        assert!(std::ptr::eq(collision.entity, &scene.entities[0]));
    }

    #[test]
    fn test_light_channels() {
        let light = Light::new(Vec3::ZERO, 0xff0000);
        assert_eq!(light.channels(), [1.0, 0.0, 0.0]);
    }
}
