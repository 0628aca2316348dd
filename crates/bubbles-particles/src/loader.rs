//! TOML-based effect loading

use crate::effect::{EffectSettings, ParticleEffect};
use bubbles_core::{BubblesError, Result};
use std::path::Path;

/// Load a particle effect from a `.effect.toml` file.
///
/// The file format mirrors `EffectSettings`:
/// ```toml
/// x = 320
/// y = 240
/// loops = 2
///
/// [[emitters]]
/// frames = 5
/// spawn_amount = 3
/// spawns = 1
///
/// [emitters.particle]
/// lifetime = 40
/// scale = [0.0, 1.0, 0.0]
/// shape = "spark"
///
/// [emitters.variation]
/// x_speed = 0.5
/// # ...more emitters
/// ```
pub fn load_effect_from_file(path: &Path) -> Result<ParticleEffect> {
    let content = std::fs::read_to_string(path)?;
    load_effect_from_str(&content).map_err(|e| match e {
        BubblesError::TomlParseError(msg) => {
            BubblesError::TomlParseError(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Parse a particle effect from a TOML string.
pub fn load_effect_from_str(content: &str) -> Result<ParticleEffect> {
    let table: toml::value::Table = toml::from_str(content)?;
    ParticleEffect::from_settings(EffectSettings::from_toml(&table)?)
}
