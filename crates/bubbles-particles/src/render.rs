//! Renderer seam: backends implement `EffectRenderer` to draw effects

use crate::effect::ParticleEffect;
use crate::particle::Particle;
use bubbles_core::{Result, Vec2};
use std::collections::HashMap;

/// Shapes every backend is expected to draw without a texture
pub const BUILTIN_SHAPES: [&str; 2] = ["circle", "square"];

/// Textures a renderer has loaded, keyed by the shape name particles use
#[derive(Debug, Clone)]
pub struct TextureRegistry<T> {
    textures: HashMap<String, T>,
}

impl<T> TextureRegistry<T> {
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
        }
    }

    /// Insert or replace a texture
    pub fn insert(&mut self, name: impl Into<String>, texture: T) -> Option<T> {
        self.textures.insert(name.into(), texture)
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.textures.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.textures.keys().map(String::as_str)
    }
}

impl<T> Default for TextureRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A backend that can draw particle effects onto some surface.
///
/// Backends supply texture loading and single-particle drawing; effect
/// traversal and texture registration are provided.
pub trait EffectRenderer {
    /// What particles are drawn onto (image buffer, window frame, ...)
    type Surface: ?Sized;
    /// Backend texture handle
    type Texture;

    /// Size in pixels of a particle with scale 1
    fn base_size(&self) -> f32 {
        32.0
    }

    /// Whether `shape` is drawn procedurally and needs no texture
    fn is_builtin_shape(&self, shape: &str) -> bool {
        BUILTIN_SHAPES.contains(&shape)
    }

    fn textures(&self) -> &TextureRegistry<Self::Texture>;

    fn textures_mut(&mut self) -> &mut TextureRegistry<Self::Texture>;

    /// Load the texture a shape name refers to
    fn load_texture(&mut self, name: &str) -> Result<Self::Texture>;

    /// Draw one particle with its top-left corner at `position`
    fn render_particle(&mut self, particle: &Particle, surface: &mut Self::Surface, position: Vec2);

    /// Draw every live particle of `effect`, centred on its world position
    fn render_effect(&mut self, effect: &ParticleEffect, surface: &mut Self::Surface) {
        let base_size = self.base_size();
        for emitter in effect.emitters() {
            for particle in emitter.particles() {
                let half = base_size * particle.scale() / 2.0;
                let position = effect.position() + particle.position() - Vec2::new(half, half);
                self.render_particle(particle, surface, position);
            }
        }
    }

    /// Load textures for every non-builtin shape the effect's emitters use.
    /// Returns how many textures were loaded.
    fn register_effect(&mut self, effect: &ParticleEffect) -> Result<usize> {
        let mut loaded = 0;
        for emitter in effect.emitters() {
            let Some(shape) = emitter.settings().particle.shape.as_deref() else {
                continue;
            };
            if self.is_builtin_shape(shape) || self.textures().contains(shape) {
                continue;
            }
            let texture = self.load_texture(shape)?;
            self.textures_mut().insert(shape, texture);
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Register a texture that is already in memory
    fn register_texture(&mut self, name: &str, texture: Self::Texture) {
        self.textures_mut().insert(name, texture);
    }
}
