//! Scene entities: a shape, how its surface responds to light, and an
//! optional texture.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use lumen_math::{Ray3, Vec3};

use crate::cube::Cube;
use crate::sphere::Sphere;
use crate::texture::Texture;

/// How a surface handles an incoming ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    /// Matte: shaded from the lights, casts shadows, may be textured
    Diffuse,
    /// Mirror: the ray is reflected
    Specular,
    /// Glass-like: the ray is refracted through; casts no shadow
    Transparent,
}

impl FromStr for Surface {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "diffuse" => Ok(Surface::Diffuse),
            "specular" => Ok(Surface::Specular),
            "transparent" => Ok(Surface::Transparent),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Surface::Diffuse => "diffuse",
            Surface::Specular => "specular",
            Surface::Transparent => "transparent",
        };
        f.write_str(name)
    }
}

/// Geometry of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere(Sphere),
    Cube(Cube),
}

impl Shape {
    /// Surface normal ray at the nearest hit in front of `ray`, if any.
    pub fn collide(&self, ray: &Ray3) -> Option<Ray3> {
        match self {
            Shape::Sphere(sphere) => sphere.collide(ray),
            Shape::Cube(cube) => cube.collide(ray),
        }
    }

    /// Texture coordinates of a surface point, `v` in image row order.
    pub fn texture_coordinates(&self, point: Vec3) -> (f64, f64) {
        match self {
            Shape::Sphere(sphere) => sphere.texture_coordinates(point),
            Shape::Cube(cube) => cube.texture_coordinates(point),
        }
    }

    pub fn position(&self) -> Vec3 {
        match self {
            Shape::Sphere(sphere) => sphere.center,
            Shape::Cube(cube) => cube.center,
        }
    }
}

/// A renderable object. Immutable once the scene is built.
#[derive(Debug, Clone)]
pub struct Entity {
    pub shape: Shape,
    pub surface: Surface,
    pub texture: Option<Arc<Texture>>,
}

impl Entity {
    pub fn new(shape: Shape, surface: Surface) -> Self {
        Self {
            shape,
            surface,
            texture: None,
        }
    }

    pub fn sphere(center: Vec3, radius: f64, surface: Surface) -> Self {
        Self::new(Shape::Sphere(Sphere::new(center, radius)), surface)
    }

    pub fn cube(center: Vec3, side_length: f64, surface: Surface) -> Self {
        Self::new(Shape::Cube(Cube::new(center, side_length)), surface)
    }

    /// Attach a texture.
    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    #[inline]
    pub fn collide(&self, ray: &Ray3) -> Option<Ray3> {
        self.shape.collide(ray)
    }

    /// Texture color at a surface point, or `None` when untextured.
    pub fn sample_texture(&self, point: Vec3) -> Option<u32> {
        let texture = self.texture.as_ref()?;
        let (u, v) = self.shape.texture_coordinates(point);
        Some(texture.sample(u, v))
    }
}

/// The nearest hit of a ray: the entity and the surface normal ray there
/// (origin at the hit point, unit direction).
#[derive(Debug, Clone, Copy)]
pub struct Collision<'a> {
    pub entity: &'a Entity,
    pub normal: Ray3,
}

impl<'a> Collision<'a> {
    #[inline]
    pub fn point(&self) -> Vec3 {
        self.normal.origin
    }

    #[inline]
    pub fn surface(&self) -> Surface {
        self.entity.surface
    }
}
