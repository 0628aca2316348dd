//! Particle state, per-frame integration, and the emitter's particle pool

use crate::curves::{Interpolation, Track};
use crate::settings::{Channel, ParticleSettings};
use bubbles_core::{Color, Vec2};

pub const DEFAULT_LIFETIME: u32 = 30;
pub const DEFAULT_SHAPE: &str = "circle";

/// One attribute value plus the track that changes it each frame
#[derive(Debug, Clone, PartialEq)]
struct Animated {
    value: f32,
    track: Track,
}

impl Animated {
    fn new(settings: &ParticleSettings, channel: Channel, lifetime: u32) -> Self {
        match settings.attribute(channel) {
            Some(attribute) => Self {
                value: attribute.initial(),
                track: attribute.to_track(lifetime),
            },
            None => Self {
                value: channel.default_value(),
                track: Track::Still,
            },
        }
    }

    fn delta(&self, age: u32, lifetime: u32, interpolation: Interpolation) -> f32 {
        self.track.delta(age, lifetime, interpolation)
    }

    fn step(&mut self, age: u32, lifetime: u32, interpolation: Interpolation) {
        self.value += self.delta(age, lifetime, interpolation);
    }
}

/// A single simulated particle. Position is relative to the owning effect.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    position: Vec2,
    x_speed: Animated,
    y_speed: Animated,
    x_acceleration: Animated,
    y_acceleration: Animated,
    scale: Animated,
    opacity: Animated,
    rotation: Animated,
    red: Animated,
    green: Animated,
    blue: Animated,
    shape: String,
    colorize: bool,
    lifetime: u32,
    interpolation: Interpolation,
    age: u32,
}

impl Particle {
    /// Build a particle from fully resolved settings (no jitter is applied here).
    pub fn from_settings(settings: &ParticleSettings) -> Self {
        let lifetime = settings
            .lifetime
            .map(|l| l.floor().max(1.0) as u32)
            .unwrap_or(DEFAULT_LIFETIME);
        let animated = |channel| Animated::new(settings, channel, lifetime);

        Self {
            position: Vec2::new(settings.x.unwrap_or(0.0), settings.y.unwrap_or(0.0)),
            x_speed: animated(Channel::XSpeed),
            y_speed: animated(Channel::YSpeed),
            x_acceleration: animated(Channel::XAcceleration),
            y_acceleration: animated(Channel::YAcceleration),
            scale: animated(Channel::Scale),
            opacity: animated(Channel::Opacity),
            rotation: animated(Channel::Rotation),
            red: animated(Channel::Red),
            green: animated(Channel::Green),
            blue: animated(Channel::Blue),
            shape: settings
                .shape
                .clone()
                .unwrap_or_else(|| DEFAULT_SHAPE.to_string()),
            colorize: settings.colorize.unwrap_or(false),
            lifetime,
            interpolation: settings.interpolation.unwrap_or_default(),
            age: 0,
        }
    }

    /// Advance one frame. `delta_time` scales movement only; tracks always
    /// advance by exactly one frame.
    pub fn update(&mut self, delta_time: f32) {
        let (age, lifetime, mode) = (self.age, self.lifetime, self.interpolation);

        self.x_acceleration.step(age, lifetime, mode);
        self.y_acceleration.step(age, lifetime, mode);

        self.x_speed.value += self.x_speed.delta(age, lifetime, mode) + self.x_acceleration.value;
        self.y_speed.value += self.y_speed.delta(age, lifetime, mode) + self.y_acceleration.value;

        self.position.x += self.x_speed.value * delta_time;
        self.position.y += self.y_speed.value * delta_time;

        for attribute in [
            &mut self.scale,
            &mut self.opacity,
            &mut self.rotation,
            &mut self.red,
            &mut self.green,
            &mut self.blue,
        ] {
            attribute.step(age, lifetime, mode);
        }

        self.age = self.age.saturating_add(1);
    }

    /// A particle is still alive on the frame where its age equals its lifetime.
    pub fn is_dead(&self) -> bool {
        self.age > self.lifetime
    }

    /// Move the stored position without touching velocity
    pub(crate) fn shift(&mut self, offset: Vec2) {
        self.position += offset;
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn x(&self) -> f32 {
        self.position.x
    }

    pub fn y(&self) -> f32 {
        self.position.y
    }

    pub fn x_speed(&self) -> f32 {
        self.x_speed.value
    }

    pub fn y_speed(&self) -> f32 {
        self.y_speed.value
    }

    pub fn x_acceleration(&self) -> f32 {
        self.x_acceleration.value
    }

    pub fn y_acceleration(&self) -> f32 {
        self.y_acceleration.value
    }

    pub fn scale(&self) -> f32 {
        self.scale.value
    }

    pub fn opacity(&self) -> f32 {
        self.opacity.value
    }

    pub fn rotation(&self) -> f32 {
        self.rotation.value
    }

    pub fn red(&self) -> f32 {
        self.red.value
    }

    pub fn green(&self) -> f32 {
        self.green.value
    }

    pub fn blue(&self) -> f32 {
        self.blue.value
    }

    /// Color channels with opacity as alpha
    pub fn color(&self) -> Color {
        Color::new(self.red.value, self.green.value, self.blue.value, self.opacity.value)
    }

    pub fn shape(&self) -> &str {
        &self.shape
    }

    pub fn colorize(&self) -> bool {
        self.colorize
    }

    pub fn lifetime(&self) -> u32 {
        self.lifetime
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::from_settings(&ParticleSettings::default())
    }
}

/// Live particles of one emitter, compacted with swap-remove.
/// Order is not stable across purges.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    capacity: usize,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.particles.len() >= self.capacity
    }

    /// Add a particle. Returns false (and drops it) if the pool is full.
    pub fn spawn(&mut self, particle: Particle) -> bool {
        if self.is_full() {
            return false;
        }
        self.particles.push(particle);
        true
    }

    /// Remove dead particles via swap-remove. Returns how many were removed.
    pub fn purge_dead(&mut self) -> usize {
        let before = self.particles.len();
        let mut i = 0;
        while i < self.particles.len() {
            if self.particles[i].is_dead() {
                self.particles.swap_remove(i);
                // Don't increment i — the swapped-in particle needs checking
            } else {
                i += 1;
            }
        }
        before - self.particles.len()
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Attribute;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn defaults_match_library_defaults() {
        let p = Particle::default();
        assert_eq!(p.lifetime(), DEFAULT_LIFETIME);
        assert_eq!(p.scale(), 1.0);
        assert_eq!(p.opacity(), 1.0);
        assert_eq!(p.color(), Color::WHITE);
        assert_eq!(p.shape(), "circle");
        assert!(!p.colorize());
        assert_eq!(p.interpolation(), Interpolation::Linear);
    }

    #[test]
    fn age_counts_updates_and_death_is_strict() {
        let mut p = Particle::from_settings(&ParticleSettings::default().with_lifetime(5.0));
        for n in 1..=8 {
            p.update(1.0);
            assert_eq!(p.age(), n);
            assert_eq!(p.is_dead(), n > 5);
        }
    }

    #[test]
    fn lifetime_is_floored_and_clamped() {
        let p = Particle::from_settings(&ParticleSettings::default().with_lifetime(7.9));
        assert_eq!(p.lifetime(), 7);
        let p = Particle::from_settings(&ParticleSettings::default().with_lifetime(-3.0));
        assert_eq!(p.lifetime(), 1);
        let p = Particle::from_settings(&ParticleSettings::default().with_lifetime(0.0));
        assert_eq!(p.lifetime(), 1);
    }

    #[test]
    fn sequence_sets_initial_value() {
        let settings = ParticleSettings::default()
            .with(Channel::Opacity, Attribute::Sequence(vec![0.2, 1.0]))
            .with(Channel::Rotation, Attribute::Sequence(vec![45.0]));
        let p = Particle::from_settings(&settings);
        assert_eq!(p.opacity(), 0.2);
        assert_eq!(p.rotation(), 45.0);
    }

    #[test]
    fn linear_two_points_reaches_end() {
        let settings = ParticleSettings::default()
            .with_lifetime(8.0)
            .with(Channel::Scale, Attribute::Sequence(vec![1.0, 3.0]));
        let mut p = Particle::from_settings(&settings);
        let mut last = p.scale();
        for _ in 0..8 {
            p.update(1.0);
            assert!(approx(p.scale() - last, 0.25));
            last = p.scale();
        }
        assert!(approx(p.scale(), 3.0));
    }

    #[test]
    fn three_points_rise_then_fall() {
        let settings = ParticleSettings::default()
            .with_lifetime(10.0)
            .with(Channel::Opacity, Attribute::Sequence(vec![0.0, 10.0, 0.0]));
        let mut p = Particle::from_settings(&settings);
        for _ in 0..5 {
            p.update(1.0);
        }
        assert!(approx(p.opacity(), 10.0));
        for _ in 0..5 {
            p.update(1.0);
        }
        assert!(approx(p.opacity(), 0.0));
    }

    #[test]
    fn ramp_is_constant_delta() {
        let settings = ParticleSettings::default()
            .with_lifetime(4.0)
            .with(Channel::Red, Attribute::Ramp { start: 200.0, end: 0.0 });
        let mut p = Particle::from_settings(&settings);
        p.update(1.0);
        assert!(approx(p.red(), 150.0));
        for _ in 0..3 {
            p.update(1.0);
        }
        assert!(approx(p.red(), 0.0));
    }

    #[test]
    fn motion_integrates_acceleration_then_speed() {
        let settings = ParticleSettings::default()
            .with(Channel::XSpeed, Attribute::Constant(1.0))
            .with(Channel::YAcceleration, Attribute::Constant(0.5));
        let mut p = Particle::from_settings(&settings);
        p.update(1.0);
        assert!(approx(p.x(), 1.0));
        assert!(approx(p.y_speed(), 0.5));
        assert!(approx(p.y(), 0.5));
        p.update(2.0);
        assert!(approx(p.x(), 3.0));
        assert!(approx(p.y_speed(), 1.0));
        assert!(approx(p.y(), 2.5));
    }

    #[test]
    fn acceleration_track_feeds_speed() {
        let settings = ParticleSettings::default()
            .with_lifetime(2.0)
            .with(Channel::XAcceleration, Attribute::Sequence(vec![0.0, 2.0]));
        let mut p = Particle::from_settings(&settings);
        p.update(1.0);
        assert!(approx(p.x_acceleration(), 1.0));
        assert!(approx(p.x_speed(), 1.0));
        p.update(1.0);
        assert!(approx(p.x_acceleration(), 2.0));
        assert!(approx(p.x_speed(), 3.0));
    }

    #[test]
    fn pool_spawn_and_purge() {
        let mut pool = ParticlePool::new(4);
        assert!(pool.is_empty());

        for lifetime in [1.0, 5.0, 1.0] {
            let settings = ParticleSettings::default().with_lifetime(lifetime);
            assert!(pool.spawn(Particle::from_settings(&settings)));
        }
        assert_eq!(pool.len(), 3);

        for _ in 0..2 {
            for p in pool.as_mut_slice() {
                p.update(1.0);
            }
        }
        assert_eq!(pool.purge_dead(), 2);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.as_slice()[0].lifetime(), 5);

        // Capacity 4 — spawn should fail after 4
        for _ in 0..3 {
            assert!(pool.spawn(Particle::default()));
        }
        assert!(pool.is_full());
        assert!(!pool.spawn(Particle::default()));
        assert_eq!(pool.iter().count(), 4);
    }
}
