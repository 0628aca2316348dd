//! Bubbles Particles - CPU-side 2D particle effects
//!
//! Provides frame-stepped particle simulation with:
//! - Per-attribute control-point tracks with linear or cosine easing
//! - Emitters that spawn jittered batches on a fixed frame period
//! - Effects that move their emitters together and loop their timelines
//! - Swap-remove particle pools, purged after each frame's updates
//! - A renderer trait for drawing effects and registering textures
//!
//! ```no_run
//! use bubbles_particles::{
//!     Attribute, Channel, Emitter, EmitterSettings, ParticleEffect, ParticleSettings,
//! };
//!
//! let mut effect = ParticleEffect::new();
//! effect.set_pos(160.0, 120.0).add_emitter(
//!     Emitter::new(EmitterSettings {
//!         particle: ParticleSettings::default()
//!             .with(Channel::Scale, Attribute::Sequence(vec![0.0, 1.0, 0.0])),
//!         ..Default::default()
//!     })
//!     .unwrap(),
//! );
//! for _ in 0..60 {
//!     effect.update(1.0);
//! }
//! ```

pub mod curves;
pub mod effect;
pub mod emitter;
pub mod loader;
pub mod particle;
pub mod render;
pub mod rng;
pub mod settings;

pub use curves::{Interpolation, Track};
pub use effect::{EffectSettings, ParticleEffect};
pub use emitter::{Emitter, EmitterSettings};
pub use loader::{load_effect_from_file, load_effect_from_str};
pub use particle::{Particle, ParticlePool};
pub use render::{EffectRenderer, TextureRegistry, BUILTIN_SHAPES};
pub use rng::ParticleRng;
pub use settings::{Attribute, Channel, ParticleSettings, ParticleVariation, Variation};
