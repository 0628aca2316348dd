//! Particle settings and jitter ranges, built in code or parsed from TOML tables

use crate::curves::{Interpolation, Track};
use crate::rng::ParticleRng;
use bubbles_core::{BubblesError, Result};
use log::warn;

/// Value of an animatable particle attribute
#[derive(Debug, Clone, PartialEq)]
pub enum Attribute {
    /// Fixed for the whole lifetime
    Constant(f32),
    /// Control points spread evenly over the lifetime. A single point is a constant.
    Sequence(Vec<f32>),
    /// Straight line from `start` to `end` over the lifetime
    Ramp { start: f32, end: f32 },
}

impl Attribute {
    /// Value the particle starts with
    pub fn initial(&self) -> f32 {
        match self {
            Attribute::Constant(value) => *value,
            Attribute::Sequence(points) => points.first().copied().unwrap_or_default(),
            Attribute::Ramp { start, .. } => *start,
        }
    }

    pub(crate) fn to_track(&self, lifetime: u32) -> Track {
        match self {
            Attribute::Constant(_) => Track::Still,
            Attribute::Sequence(points) if points.len() > 1 => Track::Points(points.clone()),
            Attribute::Sequence(_) => Track::Still,
            Attribute::Ramp { start, end } => Track::Ramp((end - start) / lifetime.max(1) as f32),
        }
    }

    /// Copy with every base value moved by up to the given amplitude
    pub(crate) fn jittered(&self, variation: &Variation, rng: &mut ParticleRng) -> Attribute {
        match (self, variation) {
            (Attribute::Constant(value), Variation::Uniform(amp)) => {
                Attribute::Constant(rng.spread(*value, *amp))
            }
            (Attribute::Sequence(points), Variation::Uniform(amp)) => {
                Attribute::Sequence(points.iter().map(|p| rng.spread(*p, *amp)).collect())
            }
            (Attribute::Sequence(points), Variation::PerPoint(amps)) => Attribute::Sequence(
                points
                    .iter()
                    .zip(amps.iter().chain(std::iter::repeat(&0.0)))
                    .map(|(p, amp)| rng.spread(*p, *amp))
                    .collect(),
            ),
            (Attribute::Ramp { start, end }, Variation::Uniform(amp)) => Attribute::Ramp {
                start: rng.spread(*start, *amp),
                end: *end,
            },
            // Rejected by validation; pass through unchanged
            (attribute, Variation::PerPoint(_)) => attribute.clone(),
        }
    }

    fn validate(&self, field: &str) -> Result<()> {
        if let Attribute::Sequence(points) = self {
            if points.is_empty() {
                return Err(BubblesError::ValidationError(format!(
                    "'{field}' has an empty control-point sequence"
                )));
            }
        }
        Ok(())
    }
}

impl From<f32> for Attribute {
    fn from(value: f32) -> Self {
        Attribute::Constant(value)
    }
}

impl From<Vec<f32>> for Attribute {
    fn from(points: Vec<f32>) -> Self {
        Attribute::Sequence(points)
    }
}

/// Half-width of the uniform jitter applied to an attribute at spawn time
#[derive(Debug, Clone, PartialEq)]
pub enum Variation {
    /// Same amplitude for the value or for every control point
    Uniform(f32),
    /// One amplitude per control point
    PerPoint(Vec<f32>),
}

impl Variation {
    fn validate(&self, field: &str, base: Option<&Attribute>) -> Result<()> {
        let amplitudes: &[f32] = match self {
            Variation::Uniform(amp) => std::slice::from_ref(amp),
            Variation::PerPoint(amps) => amps,
        };
        for amp in amplitudes {
            if *amp < 0.0 || amp.is_nan() {
                return Err(BubblesError::ValueOutOfRange {
                    field: format!("variation.{field}"),
                    min: 0.0,
                    max: f64::MAX,
                    value: *amp as f64,
                });
            }
        }
        if let Variation::PerPoint(amps) = self {
            match base {
                Some(Attribute::Sequence(points)) if points.len() == amps.len() => {}
                Some(Attribute::Sequence(points)) => {
                    return Err(BubblesError::ValidationError(format!(
                        "variation.{field} has {} amplitudes for {} control points",
                        amps.len(),
                        points.len()
                    )));
                }
                _ => {
                    return Err(BubblesError::ValidationError(format!(
                        "variation.{field} is a list but '{field}' is not a control-point sequence"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl From<f32> for Variation {
    fn from(amp: f32) -> Self {
        Variation::Uniform(amp)
    }
}

/// The animatable particle attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    XSpeed,
    YSpeed,
    XAcceleration,
    YAcceleration,
    Scale,
    Opacity,
    Rotation,
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; 10] = [
        Channel::XSpeed,
        Channel::YSpeed,
        Channel::XAcceleration,
        Channel::YAcceleration,
        Channel::Scale,
        Channel::Opacity,
        Channel::Rotation,
        Channel::Red,
        Channel::Green,
        Channel::Blue,
    ];

    /// Settings key for this channel
    pub fn key(self) -> &'static str {
        match self {
            Channel::XSpeed => "x_speed",
            Channel::YSpeed => "y_speed",
            Channel::XAcceleration => "x_acceleration",
            Channel::YAcceleration => "y_acceleration",
            Channel::Scale => "scale",
            Channel::Opacity => "opacity",
            Channel::Rotation => "rotation",
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|channel| channel.key() == key)
    }

    /// Value a particle gets when the channel is not configured
    pub fn default_value(self) -> f32 {
        match self {
            Channel::Scale | Channel::Opacity => 1.0,
            Channel::Red | Channel::Green | Channel::Blue => 255.0,
            _ => 0.0,
        }
    }
}

/// Everything needed to build one particle. Unset fields take particle defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSettings {
    /// Lifetime in frames; fractional values are floored, minimum 1
    pub lifetime: Option<f32>,
    pub interpolation: Option<Interpolation>,
    pub shape: Option<String>,
    pub colorize: Option<bool>,
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub x_speed: Option<Attribute>,
    pub y_speed: Option<Attribute>,
    pub x_acceleration: Option<Attribute>,
    pub y_acceleration: Option<Attribute>,
    pub scale: Option<Attribute>,
    pub opacity: Option<Attribute>,
    pub rotation: Option<Attribute>,
    pub red: Option<Attribute>,
    pub green: Option<Attribute>,
    pub blue: Option<Attribute>,
}

impl ParticleSettings {
    pub fn attribute(&self, channel: Channel) -> Option<&Attribute> {
        match channel {
            Channel::XSpeed => self.x_speed.as_ref(),
            Channel::YSpeed => self.y_speed.as_ref(),
            Channel::XAcceleration => self.x_acceleration.as_ref(),
            Channel::YAcceleration => self.y_acceleration.as_ref(),
            Channel::Scale => self.scale.as_ref(),
            Channel::Opacity => self.opacity.as_ref(),
            Channel::Rotation => self.rotation.as_ref(),
            Channel::Red => self.red.as_ref(),
            Channel::Green => self.green.as_ref(),
            Channel::Blue => self.blue.as_ref(),
        }
    }

    pub fn attribute_mut(&mut self, channel: Channel) -> &mut Option<Attribute> {
        match channel {
            Channel::XSpeed => &mut self.x_speed,
            Channel::YSpeed => &mut self.y_speed,
            Channel::XAcceleration => &mut self.x_acceleration,
            Channel::YAcceleration => &mut self.y_acceleration,
            Channel::Scale => &mut self.scale,
            Channel::Opacity => &mut self.opacity,
            Channel::Rotation => &mut self.rotation,
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }

    /// Builder-style setter for one channel
    pub fn with(mut self, channel: Channel, attribute: Attribute) -> Self {
        *self.attribute_mut(channel) = Some(attribute);
        self
    }

    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn validate(&self) -> Result<()> {
        for channel in Channel::ALL {
            if let Some(attribute) = self.attribute(channel) {
                attribute.validate(channel.key())?;
            }
        }
        Ok(())
    }

    /// Parse particle settings from a TOML table.
    ///
    /// Channel keys take a number or an array of control points. `<channel>_end`
    /// turns a constant into a start/end ramp, and `color = [r, g, b]` sets all
    /// three color channels at once. Unknown keys are logged and skipped.
    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let mut settings = Self::default();
        let mut ends = Vec::new();

        for (key, value) in table {
            match key.as_str() {
                "lifetime" => settings.lifetime = Some(toml_f32(key, value)?),
                "interpolation" => settings.interpolation = Some(toml_interpolation(value)?),
                "shape" => settings.shape = Some(toml_str(key, value)?.to_string()),
                "colorize" => settings.colorize = Some(toml_bool(key, value)?),
                "x" => settings.x = Some(toml_f32(key, value)?),
                "y" => settings.y = Some(toml_f32(key, value)?),
                "color" => {
                    let channels = value
                        .as_array()
                        .filter(|arr| arr.len() == 3)
                        .ok_or_else(|| type_error(key, "array of 3 channels", value))?;
                    for (channel, v) in [Channel::Red, Channel::Green, Channel::Blue]
                        .into_iter()
                        .zip(channels)
                    {
                        *settings.attribute_mut(channel) = Some(toml_attribute(key, v)?);
                    }
                }
                _ => {
                    if let Some(channel) = Channel::from_key(key) {
                        *settings.attribute_mut(channel) = Some(toml_attribute(key, value)?);
                    } else if let Some(channel) =
                        key.strip_suffix("_end").and_then(Channel::from_key)
                    {
                        ends.push((channel, toml_f32(key, value)?));
                    } else {
                        warn!("Ignoring unknown particle setting '{key}'");
                    }
                }
            }
        }

        for (channel, end) in ends {
            let slot = settings.attribute_mut(channel);
            if matches!(&*slot, Some(Attribute::Sequence(points)) if points.len() > 1) {
                warn!(
                    "Ignoring '{}_end': '{}' already has control points",
                    channel.key(),
                    channel.key()
                );
                continue;
            }
            let start = slot
                .as_ref()
                .map(Attribute::initial)
                .unwrap_or_else(|| channel.default_value());
            *slot = Some(Attribute::Ramp { start, end });
        }

        settings.validate()?;
        Ok(settings)
    }
}

/// Spawn-time jitter amplitudes, keyed like the particle settings they vary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleVariation {
    pub lifetime: Option<f32>,
    pub x_speed: Option<Variation>,
    pub y_speed: Option<Variation>,
    pub x_acceleration: Option<Variation>,
    pub y_acceleration: Option<Variation>,
    pub scale: Option<Variation>,
    pub opacity: Option<Variation>,
    pub rotation: Option<Variation>,
    pub red: Option<Variation>,
    pub green: Option<Variation>,
    pub blue: Option<Variation>,
}

impl ParticleVariation {
    pub fn channel(&self, channel: Channel) -> Option<&Variation> {
        match channel {
            Channel::XSpeed => self.x_speed.as_ref(),
            Channel::YSpeed => self.y_speed.as_ref(),
            Channel::XAcceleration => self.x_acceleration.as_ref(),
            Channel::YAcceleration => self.y_acceleration.as_ref(),
            Channel::Scale => self.scale.as_ref(),
            Channel::Opacity => self.opacity.as_ref(),
            Channel::Rotation => self.rotation.as_ref(),
            Channel::Red => self.red.as_ref(),
            Channel::Green => self.green.as_ref(),
            Channel::Blue => self.blue.as_ref(),
        }
    }

    pub fn channel_mut(&mut self, channel: Channel) -> &mut Option<Variation> {
        match channel {
            Channel::XSpeed => &mut self.x_speed,
            Channel::YSpeed => &mut self.y_speed,
            Channel::XAcceleration => &mut self.x_acceleration,
            Channel::YAcceleration => &mut self.y_acceleration,
            Channel::Scale => &mut self.scale,
            Channel::Opacity => &mut self.opacity,
            Channel::Rotation => &mut self.rotation,
            Channel::Red => &mut self.red,
            Channel::Green => &mut self.green,
            Channel::Blue => &mut self.blue,
        }
    }

    /// Builder-style setter for one channel
    pub fn with(mut self, channel: Channel, variation: Variation) -> Self {
        *self.channel_mut(channel) = Some(variation);
        self
    }

    /// Check amplitudes against the particle settings they will jitter
    pub fn validate(&self, base: &ParticleSettings) -> Result<()> {
        if let Some(amp) = self.lifetime {
            Variation::Uniform(amp).validate("lifetime", None)?;
        }
        for channel in Channel::ALL {
            if let Some(variation) = self.channel(channel) {
                variation.validate(channel.key(), base.attribute(channel))?;
            }
        }
        Ok(())
    }

    /// Draw one concrete set of particle settings from `base`.
    /// Attributes without a variation pass through unchanged.
    pub(crate) fn sample(
        &self,
        base: &ParticleSettings,
        rng: &mut ParticleRng,
    ) -> ParticleSettings {
        let mut values = base.clone();
        if let (Some(lifetime), Some(amp)) = (base.lifetime, self.lifetime) {
            values.lifetime = Some(rng.spread(lifetime, amp));
        }
        for channel in Channel::ALL {
            if let (Some(attribute), Some(variation)) =
                (base.attribute(channel), self.channel(channel))
            {
                *values.attribute_mut(channel) = Some(attribute.jittered(variation, rng));
            }
        }
        values
    }

    /// Parse variation amplitudes from a TOML table. Unknown keys are logged and skipped.
    pub fn from_toml(table: &toml::value::Table) -> Result<Self> {
        let mut variation = Self::default();
        for (key, value) in table {
            if key == "lifetime" {
                variation.lifetime = Some(toml_f32(key, value)?);
            } else if let Some(channel) = Channel::from_key(key) {
                let parsed = match toml_attribute(key, value)? {
                    Attribute::Sequence(amps) => Variation::PerPoint(amps),
                    other => Variation::Uniform(other.initial()),
                };
                *variation.channel_mut(channel) = Some(parsed);
            } else {
                warn!("Ignoring variation for unsupported setting '{key}'");
            }
        }
        Ok(variation)
    }
}

// ── TOML helpers (handle integer/float coercion) ──

pub(crate) fn type_error(field: &str, expected: &str, v: &toml::Value) -> BubblesError {
    BubblesError::InvalidFieldType {
        field: field.to_string(),
        expected: expected.to_string(),
        got: v.type_str().to_string(),
    }
}

pub(crate) fn toml_f32(field: &str, v: &toml::Value) -> Result<f32> {
    v.as_float()
        .map(|f| f as f32)
        .or_else(|| v.as_integer().map(|i| i as f32))
        .ok_or_else(|| type_error(field, "number", v))
}

pub(crate) fn toml_i64(field: &str, v: &toml::Value) -> Result<i64> {
    v.as_integer().ok_or_else(|| type_error(field, "integer", v))
}

pub(crate) fn toml_bool(field: &str, v: &toml::Value) -> Result<bool> {
    v.as_bool().ok_or_else(|| type_error(field, "boolean", v))
}

pub(crate) fn toml_str<'a>(field: &str, v: &'a toml::Value) -> Result<&'a str> {
    v.as_str().ok_or_else(|| type_error(field, "string", v))
}

pub(crate) fn toml_table<'a>(field: &str, v: &'a toml::Value) -> Result<&'a toml::value::Table> {
    v.as_table().ok_or_else(|| type_error(field, "table", v))
}

/// A number, or an array of numbers (control points)
fn toml_attribute(field: &str, v: &toml::Value) -> Result<Attribute> {
    match v.as_array() {
        Some(arr) => {
            let points = arr
                .iter()
                .map(|p| toml_f32(field, p))
                .collect::<Result<Vec<_>>>()?;
            Ok(Attribute::Sequence(points))
        }
        None => toml_f32(field, v).map(Attribute::Constant),
    }
}

fn toml_interpolation(v: &toml::Value) -> Result<Interpolation> {
    v.clone()
        .try_into::<Interpolation>()
        .map_err(|_| BubblesError::InvalidEnumValue {
            value: v.to_string(),
            allowed: Interpolation::NAMES.iter().map(|s| s.to_string()).collect(),
        })
}

/// Map the `-1 = unlimited` convention onto `Option`
pub(crate) fn toml_limit(field: &str, v: &toml::Value) -> Result<Option<u32>> {
    let n = toml_i64(field, v)?;
    match n {
        -1 => Ok(None),
        0..=0xFFFF_FFFF => Ok(Some(n as u32)),
        _ => Err(BubblesError::ValueOutOfRange {
            field: field.to_string(),
            min: -1.0,
            max: u32::MAX as f64,
            value: n as f64,
        }),
    }
}

/// Non-negative integer that fits in `u32`
pub(crate) fn toml_count(field: &str, v: &toml::Value, min: i64) -> Result<u32> {
    let n = toml_i64(field, v)?;
    if n < min || n > u32::MAX as i64 {
        return Err(BubblesError::ValueOutOfRange {
            field: field.to_string(),
            min: min as f64,
            max: u32::MAX as f64,
            value: n as f64,
        });
    }
    Ok(n as u32)
}
