//! Emitter settings (parsed from TOML) and the spawn timeline

use crate::particle::{Particle, ParticlePool};
use crate::rng::ParticleRng;
use crate::settings::{
    toml_count, toml_f32, toml_i64, toml_limit, toml_table, ParticleSettings, ParticleVariation,
};
use bubbles_core::{BubblesError, Result, Vec2};
use log::{trace, warn};

/// Configuration for one emitter
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterSettings {
    pub x: f32,
    pub y: f32,
    /// Spawn area extends `width` to the right of `x`
    pub width: f32,
    /// Spawn area extends `height` below `y`
    pub height: f32,
    /// Number of batches to spawn per loop; `None` spawns forever
    pub spawns: Option<u32>,
    /// Frames between batches
    pub frames: u32,
    pub max_particles: usize,
    /// Particles per batch
    pub spawn_amount: u32,
    /// Fixed seed for reproducible jitter; `None` seeds from the OS
    pub seed: Option<u64>,
    pub particle: ParticleSettings,
    pub variation: ParticleVariation,
}

impl Default for EmitterSettings {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            spawns: None,
            frames: 30,
            max_particles: 1000,
            spawn_amount: 10,
            seed: None,
            particle: ParticleSettings::default(),
            variation: ParticleVariation::default(),
        }
    }
}

impl EmitterSettings {
    pub fn validate(&self) -> Result<()> {
        if self.frames == 0 {
            return Err(BubblesError::ValueOutOfRange {
                field: "frames".into(),
                min: 1.0,
                max: u32::MAX as f64,
                value: 0.0,
            });
        }
        for (field, value) in [("width", self.width), ("height", self.height)] {
            if value < 0.0 || value.is_nan() {
                return Err(BubblesError::ValueOutOfRange {
                    field: field.into(),
                    min: 0.0,
                    max: f64::MAX,
                    value: value as f64,
                });
            }
        }
        self.particle.validate()?;
        self.variation.validate(&self.particle)
    }

    /// Parse an EmitterSettings from a TOML table.
    ///
    /// Particle settings live in the `particle` sub-table and jitter
    /// amplitudes in `variation`. Unknown keys are logged and skipped.
    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let mut settings = Self::default();

        for (key, value) in table {
            match key.as_str() {
                "x" => settings.x = toml_f32(key, value)?,
                "y" => settings.y = toml_f32(key, value)?,
                "width" => settings.width = toml_f32(key, value)?,
                "height" => settings.height = toml_f32(key, value)?,
                "spawns" => settings.spawns = toml_limit(key, value)?,
                "frames" => settings.frames = toml_count(key, value, 1)?,
                "max_particles" => settings.max_particles = toml_count(key, value, 0)? as usize,
                "spawn_amount" => settings.spawn_amount = toml_count(key, value, 0)?,
                "seed" => settings.seed = Some(toml_i64(key, value)? as u64),
                "particle" => {
                    settings.particle = ParticleSettings::from_toml(toml_table(key, value)?)?
                }
                "variation" => {
                    settings.variation = ParticleVariation::from_toml(toml_table(key, value)?)?
                }
                _ => warn!("Ignoring unknown emitter setting '{key}'"),
            }
        }

        settings.validate()?;
        Ok(settings)
    }
}

/// Spawns batches of particles on a fixed frame period and owns them until they die
#[derive(Debug, Clone)]
pub struct Emitter {
    settings: EmitterSettings,
    pool: ParticlePool,
    rng: ParticleRng,
    /// Batches attempted since the last reset (only counted when spawns are limited)
    current_spawn: u32,
    /// Position within the spawn period, in [0, frames)
    current_frame: u32,
}

impl Emitter {
    pub fn new(settings: EmitterSettings) -> Result<Self> {
        settings.validate()?;
        let rng = settings
            .seed
            .map(ParticleRng::new)
            .unwrap_or_else(ParticleRng::from_entropy);
        let pool = ParticlePool::new(settings.max_particles);
        Ok(Self {
            settings,
            pool,
            rng,
            current_spawn: 0,
            current_frame: 0,
        })
    }

    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        Self::new(EmitterSettings::from_toml(table)?)
    }

    /// Advance the spawn timeline by one frame, spawning a batch at the start of each period.
    pub fn update(&mut self) {
        if self.current_frame == 0 {
            self.spawn_batch();
        }
        self.current_frame = (self.current_frame + 1) % self.settings.frames;
    }

    /// Dead once a limited spawn count is used up and every particle has expired.
    pub fn is_dead(&self) -> bool {
        match self.settings.spawns {
            Some(limit) => self.current_spawn > limit && self.pool.is_empty(),
            None => false,
        }
    }

    /// Rewind the batch count so the timeline plays again.
    /// The position within the current spawn period is kept.
    pub fn reset(&mut self) {
        self.current_spawn = 0;
    }

    fn spawn_batch(&mut self) {
        if self.settings.spawns.is_some() {
            self.current_spawn = self.current_spawn.saturating_add(1);
        }
        let allowed = match self.settings.spawns {
            Some(limit) => self.current_spawn <= limit,
            None => true,
        };
        if !allowed {
            return;
        }

        let mut spawned = 0;
        for _ in 0..self.settings.spawn_amount {
            if self.pool.is_full() {
                break;
            }
            let particle = self.spawn_particle();
            self.pool.spawn(particle);
            spawned += 1;
        }
        trace!(
            "Emitter batch {} spawned {spawned} particle(s), {} live",
            self.current_spawn,
            self.pool.len()
        );
    }

    fn spawn_particle(&mut self) -> Particle {
        let settings = &self.settings;
        let mut values = settings.variation.sample(&settings.particle, &mut self.rng);
        values.x = Some(self.rng.range(settings.x, settings.x + settings.width));
        values.y = Some(self.rng.range(settings.y, settings.y + settings.height));
        Particle::from_settings(&values)
    }

    /// Update every live particle, moving each by `offset` afterwards.
    /// Dead particles stay in the pool until `purge_dead`.
    pub(crate) fn update_particles(&mut self, delta_time: f32, offset: Vec2) {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            self.pool.as_mut_slice().par_iter_mut().for_each(|particle| {
                particle.update(delta_time);
                particle.shift(offset);
            });
        }
        #[cfg(not(feature = "parallel"))]
        self.update_particles_serial(delta_time, offset);
    }

    /// Single-threaded particle pass
    #[cfg_attr(all(feature = "parallel", not(test)), allow(dead_code))]
    pub(crate) fn update_particles_serial(&mut self, delta_time: f32, offset: Vec2) {
        for particle in self.pool.as_mut_slice() {
            particle.update(delta_time);
            particle.shift(offset);
        }
    }

    pub(crate) fn purge_dead(&mut self) -> usize {
        self.pool.purge_dead()
    }

    /// Move the spawn area. Returns `self` for chaining.
    pub fn set_pos(&mut self, x: f32, y: f32) -> &mut Self {
        self.settings.x = x;
        self.settings.y = y;
        self
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.settings.x, self.settings.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.settings.width, self.settings.height)
    }

    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    pub fn particles(&self) -> &[Particle] {
        self.pool.as_slice()
    }

    pub fn particle_count(&self) -> usize {
        self.pool.len()
    }

    pub fn current_spawn(&self) -> u32 {
        self.current_spawn
    }

    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Attribute, Channel, Variation};

    fn emitter(
        frames: u32,
        spawn_amount: u32,
        max_particles: usize,
        spawns: Option<u32>,
    ) -> Emitter {
        Emitter::new(EmitterSettings {
            frames,
            spawn_amount,
            max_particles,
            spawns,
            seed: Some(11),
            ..Default::default()
        })
        .unwrap()
    }

    fn tick(emitter: &mut Emitter) {
        emitter.update();
        emitter.update_particles(1.0, Vec2::ZERO);
        emitter.purge_dead();
    }

    #[test]
    fn default_settings_are_sane() {
        let settings = EmitterSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.frames, 30);
        assert_eq!(settings.spawns, None);
        assert!(settings.max_particles > 0);
    }

    #[test]
    fn batches_follow_period_and_saturate() {
        let mut e = emitter(5, 3, 10, None);
        for _ in 0..5 {
            e.update();
        }
        assert_eq!(e.particle_count(), 3);
        for _ in 0..5 {
            e.update();
        }
        assert_eq!(e.particle_count(), 6);
        for _ in 0..10 {
            e.update();
            assert!(e.particle_count() <= 10);
        }
        assert_eq!(e.particle_count(), 10);
        for _ in 0..50 {
            e.update();
        }
        assert_eq!(e.particle_count(), 10);
    }

    #[test]
    fn frame_counter_wraps() {
        let mut e = emitter(3, 1, 100, None);
        let frames: Vec<u32> = (0..6)
            .map(|_| {
                e.update();
                e.current_frame()
            })
            .collect();
        assert_eq!(frames, vec![1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn limited_spawns_die_and_reset_revives() {
        let mut e = Emitter::new(EmitterSettings {
            frames: 5,
            spawn_amount: 2,
            spawns: Some(2),
            seed: Some(3),
            particle: ParticleSettings::default().with_lifetime(3.0),
            ..Default::default()
        })
        .unwrap();

        let mut batches = 0;
        let mut live = 0;
        for _ in 0..10 {
            tick(&mut e);
            if e.particle_count() > live {
                batches += 1;
            }
            live = e.particle_count();
            assert!(!e.is_dead());
        }
        assert_eq!(batches, 2);
        assert_eq!(e.particle_count(), 0);

        // Third period start: limit passed with nothing alive
        tick(&mut e);
        assert!(e.is_dead());
        assert_eq!(e.current_spawn(), 3);

        e.reset();
        assert!(!e.is_dead());
        assert_eq!(e.current_spawn(), 0);
        assert_eq!(e.current_frame(), 1);

        for _ in 0..5 {
            tick(&mut e);
        }
        assert_eq!(e.current_spawn(), 1);
        assert_eq!(e.particle_count(), 2);
    }

    #[test]
    fn zero_spawns_never_spawns() {
        let mut e = emitter(2, 4, 10, Some(0));
        tick(&mut e);
        assert_eq!(e.particle_count(), 0);
        assert!(e.is_dead());
    }

    #[test]
    fn unlimited_never_dies() {
        let mut e = emitter(1, 0, 10, None);
        for _ in 0..20 {
            tick(&mut e);
        }
        assert!(!e.is_dead());
    }

    #[test]
    fn particles_spawn_inside_area() {
        let mut e = Emitter::new(EmitterSettings {
            x: 10.0,
            y: -5.0,
            width: 4.0,
            height: 2.0,
            frames: 1,
            spawn_amount: 50,
            max_particles: 50,
            seed: Some(17),
            ..Default::default()
        })
        .unwrap();
        e.update();
        assert_eq!(e.particle_count(), 50);
        for p in e.particles() {
            assert!((10.0..14.0).contains(&p.x()));
            assert!((-5.0..-3.0).contains(&p.y()));
        }
    }

    #[test]
    fn variation_applies_per_particle() {
        let particle = ParticleSettings::default()
            .with(Channel::XSpeed, Attribute::Constant(2.0))
            .with(Channel::Scale, Attribute::Constant(1.0));
        let variation = ParticleVariation::default().with(Channel::XSpeed, Variation::Uniform(1.0));
        let mut e = Emitter::new(EmitterSettings {
            frames: 1,
            spawn_amount: 20,
            seed: Some(23),
            particle,
            variation,
            ..Default::default()
        })
        .unwrap();
        e.update();
        let speeds: Vec<f32> = e.particles().iter().map(Particle::x_speed).collect();
        assert!(speeds.iter().all(|s| (1.0..=3.0).contains(s)));
        assert!(speeds.iter().any(|s| (*s - speeds[0]).abs() > 1e-6));
        assert!(e.particles().iter().all(|p| p.scale() == 1.0));
    }

    #[test]
    fn invalid_settings_rejected() {
        let zero_frames = EmitterSettings {
            frames: 0,
            ..Default::default()
        };
        assert!(Emitter::new(zero_frames).is_err());

        let negative_width = EmitterSettings {
            width: -1.0,
            ..Default::default()
        };
        assert!(Emitter::new(negative_width).is_err());

        let bad_points = EmitterSettings {
            particle: ParticleSettings::default().with(Channel::Scale, Attribute::Sequence(vec![])),
            ..Default::default()
        };
        assert!(Emitter::new(bad_points).is_err());
    }

    #[test]
    fn parse_from_toml() {
        let toml_str = r#"
x = 50
y = 20.5
width = 10
spawns = -1
frames = 4
max_particles = 64
spawn_amount = 8
seed = 9
launch_angle = 45

[particle]
lifetime = 12
scale = [0, 1, 0]

[variation]
lifetime = 2
scale = [0, 0.5, 0]
"#;
        let table: toml::value::Table = toml::from_str(toml_str).unwrap();
        let e = Emitter::from_toml(&table).unwrap();
        let settings = e.settings();
        assert_eq!(e.position(), Vec2::new(50.0, 20.5));
        assert_eq!(e.size(), Vec2::new(10.0, 0.0));
        assert_eq!(settings.spawns, None);
        assert_eq!(settings.frames, 4);
        assert_eq!(settings.max_particles, 64);
        assert_eq!(settings.spawn_amount, 8);
        assert_eq!(settings.seed, Some(9));
        assert_eq!(settings.particle.lifetime, Some(12.0));
        assert_eq!(
            settings.variation.scale,
            Some(Variation::PerPoint(vec![0.0, 0.5, 0.0]))
        );
    }

    #[test]
    fn toml_rejects_zero_frames() {
        let table: toml::value::Table = toml::from_str("frames = 0").unwrap();
        assert!(matches!(
            EmitterSettings::from_toml(&table),
            Err(BubblesError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn set_pos_chains() {
        let mut e = emitter(1, 1, 1, None);
        e.set_pos(3.0, 4.0).set_pos(5.0, 6.0);
        assert_eq!(e.position(), Vec2::new(5.0, 6.0));
    }
}
