//! Per-frame attribute deltas driven by control-point tracks

use serde::Deserialize;
use std::f32::consts::{FRAC_PI_2, PI};

/// How a particle moves between neighbouring control points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Constant change per frame across a segment
    #[default]
    Linear,
    /// Change eased by a half sine wave, slow at segment edges and fast in the middle
    Cosine,
}

impl Interpolation {
    pub const NAMES: [&'static str; 2] = ["linear", "cosine"];

    /// Change to apply on the frame `offset` frames into a segment that runs
    /// from `from` to `to` over `frames` frames.
    pub fn segment_delta(self, from: f32, to: f32, frames: u32, offset: u32) -> f32 {
        let frames = frames.max(1) as f32;
        let slope = (to - from) / frames;
        match self {
            Interpolation::Linear => slope,
            Interpolation::Cosine => slope * FRAC_PI_2 * (PI * offset as f32 / frames).sin(),
        }
    }
}

/// How one attribute changes over a particle's lifetime
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Track {
    /// No change
    #[default]
    Still,
    /// Fixed change every frame (start/end pairs)
    Ramp(f32),
    /// Control points spread evenly over the lifetime
    Points(Vec<f32>),
}

impl Track {
    /// Change for the frame at `age`
    pub fn delta(&self, age: u32, lifetime: u32, interpolation: Interpolation) -> f32 {
        match self {
            Track::Still => 0.0,
            Track::Ramp(step) => *step,
            Track::Points(points) => points_delta(points, age, lifetime, interpolation),
        }
    }
}

/// Delta for frame `age` of a control-point sequence spread over `lifetime` frames.
///
/// The lifetime is cut into `points.len() - 1` segments of
/// `lifetime / (points.len() - 1)` frames (floor, at least one). Frames past the
/// last segment hold the final value.
pub fn points_delta(points: &[f32], age: u32, lifetime: u32, interpolation: Interpolation) -> f32 {
    if points.len() < 2 {
        return 0.0;
    }
    let last = points.len() - 1;
    let frames_per_point = (lifetime / last as u32).max(1);
    let current = ((age / frames_per_point) as usize).min(last);
    let next = (current + 1).min(last);
    let offset = age - current as u32 * frames_per_point;
    interpolation.segment_delta(points[current], points[next], frames_per_point, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrate(points: &[f32], lifetime: u32, frames: u32, mode: Interpolation) -> f32 {
        (0..frames).fold(points[0], |value, age| {
            value + points_delta(points, age, lifetime, mode)
        })
    }

    #[test]
    fn linear_two_points_constant_delta() {
        let points = [2.0, 12.0];
        for age in 0..10 {
            let d = points_delta(&points, age, 10, Interpolation::Linear);
            assert!((d - 1.0).abs() < 1e-6);
        }
        assert!((integrate(&points, 10, 10, Interpolation::Linear) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn linear_three_points_peak_mid_life() {
        let points = [0.0, 10.0, 0.0];
        assert!((integrate(&points, 10, 5, Interpolation::Linear) - 10.0).abs() < 1e-4);
        assert!(integrate(&points, 10, 10, Interpolation::Linear).abs() < 1e-4);
    }

    #[test]
    fn frames_past_last_segment_hold_value() {
        // 11 frames over 2 segments: 5 frames each, frame 10 is past the end
        let points = [0.0, 10.0, 0.0];
        assert_eq!(points_delta(&points, 10, 11, Interpolation::Linear), 0.0);
        assert_eq!(points_delta(&points, 50, 11, Interpolation::Linear), 0.0);
    }

    #[test]
    fn short_lifetime_never_divides_by_zero() {
        let points = [0.0, 1.0, 2.0, 3.0, 4.0];
        let d = points_delta(&points, 0, 2, Interpolation::Linear);
        assert!(d.is_finite());
        assert!((d - 1.0).abs() < 1e-6);
    }

    #[test]
    fn single_point_is_constant() {
        assert_eq!(points_delta(&[5.0], 3, 10, Interpolation::Cosine), 0.0);
        assert_eq!(points_delta(&[], 3, 10, Interpolation::Linear), 0.0);
    }

    #[test]
    fn cosine_starts_still_and_peaks_mid_segment() {
        let points = [0.0, 100.0];
        assert_eq!(points_delta(&points, 0, 100, Interpolation::Cosine), 0.0);
        let mid = points_delta(&points, 50, 100, Interpolation::Cosine);
        assert!((mid - FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn cosine_segment_reaches_target() {
        let points = [0.0, 100.0];
        let end = integrate(&points, 100, 100, Interpolation::Cosine);
        assert!((end - 100.0).abs() < 0.1);
    }

    #[test]
    fn track_variants() {
        assert_eq!(Track::Still.delta(4, 10, Interpolation::Linear), 0.0);
        assert_eq!(Track::Ramp(0.25).delta(4, 10, Interpolation::Cosine), 0.25);
        let points = Track::Points(vec![0.0, 10.0]);
        assert!((points.delta(4, 10, Interpolation::Linear) - 1.0).abs() < 1e-6);
    }
}
