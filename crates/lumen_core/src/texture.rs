//! Texture loading and caching for entities.
//!
//! Textures are decoded once into packed 0xRRGGBB samples and shared
//! between entities through a cache keyed by path.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::color::pack_rgb;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Texture has no pixels: {0}")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A decoded texture raster.
#[derive(Clone, Debug)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// Packed 0xRRGGBB samples, row-major, top row first
    pub pixels: Vec<u32>,
    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Create a texture from packed pixels.
    ///
    /// Fails if the raster is empty or `pixels` does not match the size.
    pub fn new(
        width: u32,
        height: u32,
        pixels: Vec<u32>,
        path: impl Into<String>,
    ) -> TextureResult<Self> {
        let path = path.into();
        if width == 0 || height == 0 || pixels.len() != (width as usize) * (height as usize) {
            return Err(TextureError::Empty(path));
        }
        Ok(Self {
            width,
            height,
            pixels,
            path,
        })
    }

    /// Load and decode an image file.
    pub fn load(path: &Path) -> TextureResult<Self> {
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        let pixels = rgb.pixels().map(|p| pack_rgb(p[0], p[1], p[2])).collect();
        Self::new(width, height, pixels, path.to_string_lossy())
    }

    /// Get the pixel at integer coordinates, clamped into the raster.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }

    /// Nearest-neighbour lookup at `u`, `v` in [0, 1], (0, 0) being the
    /// top-left corner. Out of range coordinates are clamped.
    pub fn sample(&self, u: f64, v: f64) -> u32 {
        let x = (u * self.width as f64).max(0.0) as u32;
        let y = (v * self.height as f64).max(0.0) as u32;
        self.pixel(x, y)
    }
}

/// Cache for loaded textures.
pub struct TextureCache {
    textures: HashMap<PathBuf, Arc<Texture>>,
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    /// Create a new empty texture cache.
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a texture cache resolving relative paths against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load a texture from file, using the cache if available.
    pub fn load(&mut self, path: &str) -> TextureResult<Arc<Texture>> {
        let full_path = self.resolve_path(path);
        if let Some(texture) = self.textures.get(&full_path) {
            return Ok(Arc::clone(texture));
        }

        let texture = Arc::new(Texture::load(&full_path)?);
        log::debug!(
            "Loaded texture: {} ({}x{})",
            full_path.display(),
            texture.width,
            texture.height
        );
        self.textures.insert(full_path, Arc::clone(&texture));

        Ok(texture)
    }

    /// Get the number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}
