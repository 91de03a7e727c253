//! Ray color resolution.
//!
//! A primary ray is followed through mirror reflections and refractions
//! until it lands on a diffuse surface, which is then shaded from the
//! scene's point lights with hard shadows, a flat ambient term and an
//! optional texture.

use lumen_core::color::{self, BLACK};
use lumen_core::{Collision, Scene, Surface};
use lumen_math::{normalize, reflect, Ray3, Vec3};

/// Bounce limit. A ray still bouncing after this many reflections or
/// refractions is shaded where it last landed.
pub const MAX_REFLECTIONS: u32 = 20;

/// Index of refraction of transparent surfaces (glass).
pub const REFRACTIVE_INDEX: f64 = 1.5;

/// Refracted rays start this far inside the surface they crossed.
const SURFACE_OFFSET: f64 = 0.001;

/// Light intensity multiplier.
const BRIGHTNESS: f64 = 10.0;

/// Flat ambient term added to every channel.
const AMBIENT: f64 = 0.05;

/// Compute the color seen along a ray, as packed 0xRRGGBB.
pub fn ray_color(scene: &Scene, ray: Ray3) -> u32 {
    let mut ray = ray;
    let mut reflections = 0;

    let collision = loop {
        let Some(collision) = scene.cast_ray(&ray) else {
            return BLACK;
        };

        let last = match collision.surface() {
            Surface::Diffuse => break collision,
            Surface::Specular => {
                ray = Ray3::new(
                    collision.point(),
                    reflect(ray.direction, collision.normal.direction),
                );
                collision
            }
            Surface::Transparent => {
                // Enter, travel to the far side, exit.
                let inside = refract(&collision, ray.direction, 1.0 / REFRACTIVE_INDEX);
                let Some(exit) = scene.cast_ray(&inside) else {
                    return BLACK;
                };
                ray = refract(&exit, inside.direction, REFRACTIVE_INDEX);
                exit
            }
        };

        reflections += 1;
        if reflections >= MAX_REFLECTIONS {
            break last;
        }
    };

    diffuse_color(scene, &collision)
}

/// Bend `direction` through the surface at `collision`.
///
/// This is a fixed-ratio approximation rather than Snell's law: the
/// tangential part of the direction, measured per unit of travel along
/// the normal, is scaled by `ratio`. The new ray starts just past the
/// surface.
fn refract(collision: &Collision<'_>, direction: Vec3, ratio: f64) -> Ray3 {
    let normal = collision.normal.direction;
    let tangent = normalize(normal.cross(normal.cross(direction)));
    let normal_projection = -direction.dot(normal);
    let tangent_projection = (direction / normal_projection).dot(tangent);

    Ray3::new(
        collision.point() - normal * SURFACE_OFFSET,
        normalize(-normal + tangent * (tangent_projection * ratio)),
    )
}

/// Shade a surface point from the scene lights.
///
/// A light counts when nothing lies between it and the point, or the
/// blocker is transparent. Its contribution falls off with the squared
/// distance and scales with the light color.
pub fn diffuse_color(scene: &Scene, collision: &Collision<'_>) -> u32 {
    let point = collision.point();
    let normal = collision.normal.direction;
    let mut intensity = [0.0; 3];

    for light in &scene.lights {
        let to_light = light.position - point;
        let distance_squared = to_light.length_squared();
        let direction = normalize(to_light);

        let lit = match scene.cast_ray(&Ray3::new(point, direction)) {
            None => true,
            Some(blocker) => {
                (blocker.point() - point).length_squared() > distance_squared
                    || blocker.surface() == Surface::Transparent
            }
        };
        if !lit {
            continue;
        }

        let strength = normal.dot(direction).abs() / distance_squared;
        for (sum, channel) in intensity.iter_mut().zip(light.channels()) {
            *sum += channel * strength;
        }
    }

    for sum in &mut intensity {
        *sum = *sum * BRIGHTNESS + AMBIENT;
    }

    if collision.surface() == Surface::Diffuse {
        if let Some(texel) = collision.entity.sample_texture(point) {
            for (sum, channel) in intensity.iter_mut().zip(color::channels(texel)) {
                *sum *= channel;
            }
        }
    }

    color::intensity_to_rgb(intensity)
}

/// Color of pixel (`x`, `y`) in a `width` x `height` image, row 0 at the top.
pub fn render_pixel(scene: &Scene, x: u32, y: u32, width: u32, height: u32) -> u32 {
    let u = (x as f64 + 0.5) / width as f64;
    let v = 1.0 - (y as f64 + 0.5) / height as f64;
    let aspect_ratio = width as f64 / height as f64;
    ray_color(scene, scene.camera.ray(u, v, aspect_ratio))
}
