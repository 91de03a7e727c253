//! Lumen core - scene representation.
//!
//! This crate holds what the tracer renders: primitives, entities with
//! their surfaces and textures, lights and the scene aggregate that casts
//! rays against them. Scenes are built in code or loaded from a scene file.

pub mod color;
pub mod cube;
pub mod entity;
pub mod scene;
pub mod scene_file;
pub mod sphere;
pub mod texture;

pub use cube::Cube;
pub use entity::{Collision, Entity, Shape, Surface};
pub use scene::{Light, Scene};
pub use scene_file::{load_scene, parse_scene, SceneError, SceneResult};
pub use sphere::Sphere;
pub use texture::{Texture, TextureCache, TextureError, TextureResult};
