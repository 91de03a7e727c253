//! Scene description file loader.
//!
//! Scenes are plain text: a section header on its own line, followed by
//! indented `key: value` properties.
//!
//! ```text
//! camera:
//!     position: (0, 0, 1)
//!     direction: (1, 0, 0)
//!     fov: 90
//! sphere:
//!     position: (5, 0, 1)
//!     radius: 1
//!     surface: specular
//! cube:
//!     position: (0, 0, -50)
//!     sideLength: 98
//!     texture: floor.png
//! light:
//!     position: (0, 0, 10)
//!     color: ffffff
//! ```
//!
//! # Supported Sections
//!
//! - `camera:` with `position`, `direction`, `fov`, `size`
//! - `sphere:` with `position`, `radius`, `surface`, `texture`
//! - `cube:` with `position`, `sideLength`, `surface`, `texture`
//! - `light:` with `position`, `color` (hex RRGGBB)
//!
//! `#` starts a comment. Unknown keys are ignored; unknown sections are not.

use std::path::Path;

use lumen_math::{Camera, Vec3};
use thiserror::Error;

use crate::color::WHITE;
use crate::entity::{Entity, Surface};
use crate::scene::{Light, Scene};
use crate::texture::TextureCache;

/// Errors that can occur while loading a scene file.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Unknown section '{name}' at line {line}")]
    UnknownSection { line: usize, name: String },

    #[error("Unknown surface '{name}' at line {line}")]
    UnknownSurface { line: usize, name: String },

    #[error("Scene has no camera section")]
    MissingCamera,
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Load a scene file. Texture paths are resolved relative to the file.
pub fn load_scene(path: impl AsRef<Path>) -> SceneResult<Scene> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut textures = TextureCache::with_base_dir(base_dir);
    let scene = parse_scene(&content, &mut textures)?;

    log::info!(
        "Loaded scene {}: {} entities, {} lights, {} textures",
        path.display(),
        scene.entities.len(),
        scene.lights.len(),
        textures.len()
    );
    Ok(scene)
}

/// Parse scene text, loading textures through `textures`.
pub fn parse_scene(content: &str, textures: &mut TextureCache) -> SceneResult<Scene> {
    let mut camera = None;
    let mut entities = Vec::new();
    let mut lights = Vec::new();
    let mut current: Option<Section> = None;

    for (index, raw) in content.lines().enumerate() {
        let line = index + 1;
        let text = match raw.find('#') {
            Some(comment) => &raw[..comment],
            None => raw,
        };
        if text.trim().is_empty() {
            continue;
        }

        let indented = text.starts_with(' ') || text.starts_with('\t');
        if indented {
            let Some(section) = current.as_mut() else {
                return Err(parse_error(line, "property outside of a section"));
            };
            let Some((key, value)) = text.split_once(':') else {
                let message = format!("expected 'key: value', got '{}'", text.trim());
                return Err(parse_error(line, message));
            };
            section.set(key.trim(), value.trim(), line)?;
            continue;
        }

        if let Some(section) = current.take() {
            section.finish(&mut camera, &mut entities, &mut lights, textures);
        }

        let header = text.trim();
        let name = header.strip_suffix(':').unwrap_or(header);
        let kind = match name {
            "camera" => SectionKind::Camera,
            "sphere" => SectionKind::Sphere,
            "cube" => SectionKind::Cube,
            "light" => SectionKind::Light,
            _ => {
                return Err(SceneError::UnknownSection {
                    line,
                    name: name.to_string(),
                })
            }
        };
        if !header.ends_with(':') {
            let message = format!("section header '{}' must end with ':'", name);
            return Err(parse_error(line, message));
        }
        current = Some(Section::new(kind));
    }

    if let Some(section) = current.take() {
        section.finish(&mut camera, &mut entities, &mut lights, textures);
    }

    let camera = camera.ok_or(SceneError::MissingCamera)?;
    Ok(Scene {
        camera,
        entities,
        lights,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Camera,
    Sphere,
    Cube,
    Light,
}

/// Properties collected for the section being parsed, with defaults.
struct Section {
    kind: SectionKind,
    position: Vec3,
    direction: Vec3,
    fov: f64,
    size: f64,
    /// Sphere radius or cube side length
    extent: f64,
    surface: Surface,
    texture: Option<String>,
    color: u32,
}

impl Section {
    fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            position: Vec3::ZERO,
            direction: Vec3::X,
            fov: 90.0,
            size: 0.0,
            extent: 1.0,
            surface: Surface::Diffuse,
            texture: None,
            color: WHITE,
        }
    }

    fn set(&mut self, key: &str, value: &str, line: usize) -> SceneResult<()> {
        let is_entity = matches!(self.kind, SectionKind::Sphere | SectionKind::Cube);

        match (self.kind, key) {
            (_, "position") => self.position = parse_vec3(value, line)?,
            (SectionKind::Camera, "direction") => self.direction = parse_vec3(value, line)?,
            (SectionKind::Camera, "fov") => self.fov = parse_number(value, line)?,
            (SectionKind::Camera, "size") => self.size = parse_number(value, line)?,
            (SectionKind::Sphere, "radius") | (SectionKind::Cube, "sideLength") => {
                self.extent = parse_number(value, line)?
            }
            (_, "surface") if is_entity => {
                self.surface = value
                    .parse()
                    .map_err(|name| SceneError::UnknownSurface { line, name })?
            }
            (_, "texture") if is_entity && !value.is_empty() => {
                self.texture = Some(value.to_string())
            }
            (SectionKind::Light, "color") => self.color = parse_color(value, line)?,
            _ => log::debug!("Ignoring property '{}' at line {}", key, line),
        }
        Ok(())
    }

    fn finish(
        self,
        camera: &mut Option<Camera>,
        entities: &mut Vec<Entity>,
        lights: &mut Vec<Light>,
        textures: &mut TextureCache,
    ) {
        let entity = match self.kind {
            SectionKind::Camera => {
                *camera = Some(Camera::new(self.position, self.direction, self.fov, self.size));
                return;
            }
            SectionKind::Light => {
                lights.push(Light::new(self.position, self.color));
                return;
            }
            SectionKind::Sphere => Entity::sphere(self.position, self.extent, self.surface),
            SectionKind::Cube => Entity::cube(self.position, self.extent, self.surface),
        };

        let entity = match self.texture {
            Some(path) => match textures.load(&path) {
                Ok(texture) => entity.with_texture(texture),
                Err(e) => {
                    log::warn!("Failed to load texture '{}': {}; rendering untextured", path, e);
                    entity
                }
            },
            None => entity,
        };
        entities.push(entity);
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> SceneError {
    SceneError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_number(value: &str, line: usize) -> SceneResult<f64> {
    value
        .parse()
        .map_err(|_| parse_error(line, format!("invalid number '{}'", value)))
}

/// Parse a parenthesized `(x, y, z)` triple.
fn parse_vec3(value: &str, line: usize) -> SceneResult<Vec3> {
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .ok_or_else(|| parse_error(line, "coordinates must be parenthesized"))?;

    let components: Vec<&str> = inner.split(',').map(str::trim).collect();
    if components.len() != 3 {
        return Err(parse_error(line, "coordinates must have exactly 3 components"));
    }

    let mut xyz = [0.0; 3];
    for (slot, component) in xyz.iter_mut().zip(&components) {
        *slot = parse_number(component, line)?;
    }
    Ok(Vec3::from_array(xyz))
}

/// Parse a hex `RRGGBB` color, with an optional `0x` prefix.
fn parse_color(value: &str, line: usize) -> SceneResult<u32> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    match u32::from_str_radix(digits, 16) {
        Ok(color) if color <= WHITE => Ok(color),
        _ => Err(parse_error(line, format!("invalid color '{}'", value))),
    }
}
