//! Particle effects: a group of emitters that moves and loops as one

use crate::emitter::{Emitter, EmitterSettings};
use crate::settings::{toml_f32, toml_limit, type_error};
use bubbles_core::{Result, Vec2};
use log::{debug, warn};
use std::collections::HashSet;

/// Configuration for a whole effect
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectSettings {
    pub x: f32,
    pub y: f32,
    pub x_speed: f32,
    pub y_speed: f32,
    /// Number of times the emitter timelines play; `None` loops forever
    pub loops: Option<u32>,
    pub emitters: Vec<EmitterSettings>,
}

impl EffectSettings {
    /// Parse effect settings from a TOML table, including its `emitters` array.
    /// Unknown keys are logged and skipped.
    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let mut settings = Self::default();

        for (key, value) in table {
            match key.as_str() {
                "x" => settings.x = toml_f32(key, value)?,
                "y" => settings.y = toml_f32(key, value)?,
                "x_speed" => settings.x_speed = toml_f32(key, value)?,
                "y_speed" => settings.y_speed = toml_f32(key, value)?,
                "loops" => settings.loops = toml_limit(key, value)?,
                "emitters" => {
                    let entries = value
                        .as_array()
                        .ok_or_else(|| type_error(key, "array of tables", value))?;
                    for entry in entries {
                        let table = entry
                            .as_table()
                            .ok_or_else(|| type_error(key, "array of tables", entry))?;
                        settings.emitters.push(EmitterSettings::from_toml(table)?);
                    }
                }
                _ => warn!("Ignoring unknown effect setting '{key}'"),
            }
        }

        Ok(settings)
    }
}

/// A set of emitters sharing one position and velocity.
///
/// Particles store positions relative to the effect; renderers add the effect
/// position back when drawing. When every emitter has finished its timeline
/// the effect rewinds them all, until the loop count runs out.
#[derive(Debug, Clone)]
pub struct ParticleEffect {
    position: Vec2,
    velocity: Vec2,
    loops: Option<u32>,
    current_loop: u32,
    emitters: Vec<Emitter>,
    /// Indices of emitters that finished during the current loop
    finished: HashSet<usize>,
}

impl ParticleEffect {
    pub fn new() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            loops: None,
            current_loop: 1,
            emitters: Vec::new(),
            finished: HashSet::new(),
        }
    }

    /// Build an effect and all of its emitters
    pub fn from_settings(settings: EffectSettings) -> Result<Self> {
        let mut effect = Self::new();
        effect
            .set_pos(settings.x, settings.y)
            .set_velocity(settings.x_speed, settings.y_speed)
            .set_loops(settings.loops);
        for emitter in settings.emitters {
            effect.add_emitter(Emitter::new(emitter)?);
        }
        Ok(effect)
    }

    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        Self::from_settings(EffectSettings::from_toml(table)?)
    }

    /// Advance the effect by one frame.
    ///
    /// `delta_time` scales movement (target fps / actual fps); pass 1.0 for a
    /// fixed-rate loop.
    pub fn update(&mut self, delta_time: f32) {
        self.update_with(delta_time, Emitter::update_particles);
    }

    fn update_with(&mut self, delta_time: f32, step_particles: fn(&mut Emitter, f32, Vec2)) {
        let shift = self.velocity * delta_time;
        self.position += shift;

        for (index, emitter) in self.emitters.iter_mut().enumerate() {
            emitter.update();
            if emitter.is_dead() {
                self.finished.insert(index);
            }
            // Cancel the effect's own movement so particles keep their world trajectory
            step_particles(emitter, delta_time, -shift);
            emitter.purge_dead();
        }

        self.advance_loop();
    }

    fn advance_loop(&mut self) {
        if self.emitters.is_empty()
            || self.finished.len() < self.emitters.len()
            || self.is_dead()
        {
            return;
        }

        if let Some(loops) = self.loops {
            self.current_loop += 1;
            if self.current_loop > loops {
                debug!("Particle effect finished after {loops} loop(s)");
                return;
            }
        }

        for emitter in &mut self.emitters {
            emitter.reset();
        }
        self.finished.clear();
        debug!("Particle effect starting loop {}", self.current_loop);
    }

    /// Dead once a limited loop count has played out. An effect without
    /// emitters is never dead.
    pub fn is_dead(&self) -> bool {
        match self.loops {
            Some(loops) => self.current_loop > loops && !self.emitters.is_empty(),
            None => false,
        }
    }

    /// Add an emitter. Returns `self` for chaining.
    pub fn add_emitter(&mut self, emitter: Emitter) -> &mut Self {
        self.emitters.push(emitter);
        self
    }

    /// Set the effect position. Returns `self` for chaining.
    pub fn set_pos(&mut self, x: f32, y: f32) -> &mut Self {
        self.position = Vec2::new(x, y);
        self
    }

    /// Set the effect velocity, in units per frame. Returns `self` for chaining.
    pub fn set_velocity(&mut self, x_speed: f32, y_speed: f32) -> &mut Self {
        self.velocity = Vec2::new(x_speed, y_speed);
        self
    }

    /// Set the loop count; `None` loops forever. Returns `self` for chaining.
    pub fn set_loops(&mut self, loops: Option<u32>) -> &mut Self {
        self.loops = loops;
        self
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn emitters_mut(&mut self) -> &mut [Emitter] {
        &mut self.emitters
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn loops(&self) -> Option<u32> {
        self.loops
    }

    pub fn current_loop(&self) -> u32 {
        self.current_loop
    }

    /// Live particles across all emitters
    pub fn particle_count(&self) -> usize {
        self.emitters.iter().map(Emitter::particle_count).sum()
    }
}

impl Default for ParticleEffect {
    fn default() -> Self {
        Self::new()
    }
}
