// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera poses and keyframe interpolation.

use crate::track::TIME_EPSILON;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A captured camera pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    /// Camera position
    pub position: Vec3,
    /// Point the camera looks at
    pub focal_point: Vec3,
    /// View-up direction
    pub view_up: Vec3,
}

impl CameraPose {
    /// Create a pose
    pub fn new(position: Vec3, focal_point: Vec3, view_up: Vec3) -> Self {
        Self {
            position,
            focal_point,
            view_up,
        }
    }

    /// Pose at `position` looking at the origin with a +Z up vector
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Vec3::ZERO, Vec3::Z)
    }

    /// Distance between the two camera positions
    pub fn distance(&self, other: &CameraPose) -> f32 {
        self.position.distance(other.position)
    }
}

impl Default for CameraPose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Interpolation utilities
pub struct Interpolation;

impl Interpolation {
    /// Linear interpolation between two floats
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Hermite spline interpolation
    pub fn hermite(p0: Vec3, m0: Vec3, p1: Vec3, m1: Vec3, t: f32) -> Vec3 {
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        p0 * h00 + m0 * h10 + p1 * h01 + m1 * h11
    }

    /// Uniform Catmull-Rom interpolation between `p1` and `p2`
    pub fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
        let m1 = (p2 - p0) * 0.5;
        let m2 = (p3 - p1) * 0.5;
        Self::hermite(p1, m1, p2, m2, t)
    }
}

/// A registered (time, pose) sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyframeSample {
    /// Time in seconds
    pub time: f32,
    /// Pose at that time
    pub pose: CameraPose,
}

/// Cubic camera interpolator over registered keyframe samples.
///
/// Samples are kept in time order. Between two samples the position, focal
/// point and view-up are each interpolated with a non-uniform Catmull-Rom
/// spline (tangents scaled by the neighbouring time spans). Queries outside
/// `[min_time, max_time]` return `None`.
#[derive(Debug, Clone, Default)]
pub struct KeyframeInterpolator {
    samples: Vec<KeyframeSample>,
}

impl KeyframeInterpolator {
    /// Create an empty interpolator
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sample. Samples with equal times keep registration order.
    pub fn register(&mut self, time: f32, pose: CameraPose) {
        let idx = self.samples.partition_point(|s| s.time <= time);
        self.samples.insert(idx, KeyframeSample { time, pose });
    }

    /// Whether no samples are registered
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of registered samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Registered samples in time order
    pub fn samples(&self) -> &[KeyframeSample] {
        &self.samples
    }

    /// Earliest registered time
    pub fn min_time(&self) -> Option<f32> {
        self.samples.first().map(|s| s.time)
    }

    /// Latest registered time
    pub fn max_time(&self) -> Option<f32> {
        self.samples.last().map(|s| s.time)
    }

    /// Whether `time` lies within `[min_time, max_time]`
    pub fn covers(&self, time: f32) -> bool {
        match (self.min_time(), self.max_time()) {
            (Some(min), Some(max)) => min <= time && time <= max,
            _ => false,
        }
    }

    /// Index of the segment used for `time`: the last `i` with
    /// `samples[i].time <= time`, capped so that `i + 1` exists.
    fn segment_index(&self, time: f32) -> usize {
        let after = self.samples.partition_point(|s| s.time <= time);
        after
            .saturating_sub(1)
            .min(self.samples.len().saturating_sub(2))
    }

    /// The registered pair bracketing `time`.
    ///
    /// This is the pair with `t_i <= time < t_i+1`, or the final pair when
    /// `time` equals the last registered time.
    pub fn bracket(&self, time: f32) -> Option<(&KeyframeSample, &KeyframeSample)> {
        if self.samples.len() < 2 || !self.covers(time) {
            return None;
        }
        let i = self.segment_index(time);
        Some((&self.samples[i], &self.samples[i + 1]))
    }

    /// Interpolated pose at `time`
    pub fn interpolate(&self, time: f32) -> Option<CameraPose> {
        if !self.covers(time) {
            return None;
        }
        if self.samples.len() == 1 {
            return Some(self.samples[0].pose);
        }

        let i = self.segment_index(time);
        let last = self.samples.len() - 1;
        let prev = &self.samples[i.saturating_sub(1)];
        let a = &self.samples[i];
        let b = &self.samples[i + 1];
        let next = &self.samples[(i + 2).min(last)];

        let span = b.time - a.time;
        if span.abs() < TIME_EPSILON {
            return Some(b.pose);
        }
        let t = (time - a.time) / span;

        let channel = |get: fn(&CameraPose) -> Vec3| {
            let m0 = tangent(prev, b, span, get);
            let m1 = tangent(a, next, span, get);
            Interpolation::hermite(get(&a.pose), m0, get(&b.pose), m1, t)
        };

        let view_up = channel(|p| p.view_up).normalize_or_zero();
        Some(CameraPose {
            position: channel(|p| p.position),
            focal_point: channel(|p| p.focal_point),
            view_up: if view_up == Vec3::ZERO { a.pose.view_up } else { view_up },
        })
    }
}

/// Finite-difference tangent between two samples, scaled to a segment of
/// length `span`.
fn tangent(
    from: &KeyframeSample,
    to: &KeyframeSample,
    span: f32,
    get: fn(&CameraPose) -> Vec3,
) -> Vec3 {
    let dt = to.time - from.time;
    if dt.abs() < TIME_EPSILON {
        return Vec3::ZERO;
    }
    (get(&to.pose) - get(&from.pose)) * (span / dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpolator(points: &[(f32, Vec3)]) -> KeyframeInterpolator {
        let mut interp = KeyframeInterpolator::new();
        for (t, p) in points {
            interp.register(*t, CameraPose::at(*p));
        }
        interp
    }

    #[test]
    fn test_register_keeps_time_order() {
        let interp = interpolator(&[
            (8.0, Vec3::X),
            (2.0, Vec3::Y),
            (5.0, Vec3::Z),
        ]);
        let times: Vec<f32> = interp.samples().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![2.0, 5.0, 8.0]);
        assert_eq!(interp.min_time(), Some(2.0));
        assert_eq!(interp.max_time(), Some(8.0));
    }

    #[test]
    fn test_interpolate_hits_samples() {
        let interp = interpolator(&[
            (0.0, Vec3::new(0.0, 0.0, 0.0)),
            (1.0, Vec3::new(10.0, 0.0, 0.0)),
            (3.0, Vec3::new(10.0, 10.0, 0.0)),
        ]);
        let at = |t| interp.interpolate(t).unwrap().position;
        assert!(at(0.0).distance(Vec3::ZERO) < 1e-5);
        assert!(at(1.0).distance(Vec3::new(10.0, 0.0, 0.0)) < 1e-5);
        assert!(at(3.0).distance(Vec3::new(10.0, 10.0, 0.0)) < 1e-5);
    }

    #[test]
    fn test_interpolate_two_points_is_linear() {
        let interp = interpolator(&[(0.0, Vec3::ZERO), (2.0, Vec3::new(4.0, 0.0, 0.0))]);
        let mid = interp.interpolate(1.0).unwrap().position;
        assert!(mid.distance(Vec3::new(2.0, 0.0, 0.0)) < 1e-5);
    }

    #[test]
    fn test_outside_range_is_none() {
        let interp = interpolator(&[(1.0, Vec3::ZERO), (2.0, Vec3::X)]);
        assert!(interp.interpolate(0.5).is_none());
        assert!(interp.interpolate(2.5).is_none());
        assert!(interp.bracket(0.5).is_none());
        assert!(KeyframeInterpolator::new().interpolate(0.0).is_none());
    }

    #[test]
    fn test_single_sample() {
        let interp = interpolator(&[(4.0, Vec3::Y)]);
        assert_eq!(interp.interpolate(4.0).unwrap().position, Vec3::Y);
        assert!(interp.bracket(4.0).is_none());
    }

    #[test]
    fn test_bracket_rules() {
        let interp = interpolator(&[(5.0, Vec3::X), (8.0, Vec3::Y), (12.0, Vec3::Z)]);
        let (a, b) = interp.bracket(6.0).unwrap();
        assert_eq!((a.time, b.time), (5.0, 8.0));
        let (a, b) = interp.bracket(8.0).unwrap();
        assert_eq!((a.time, b.time), (8.0, 12.0));
        // Final registered time uses the final pair
        let (a, b) = interp.bracket(12.0).unwrap();
        assert_eq!((a.time, b.time), (8.0, 12.0));
    }

    #[test]
    fn test_coincident_times_use_later_pose() {
        let interp = interpolator(&[(1.0, Vec3::X), (1.0, Vec3::Y)]);
        assert_eq!(interp.interpolate(1.0).unwrap().position, Vec3::Y);
    }

    #[test]
    fn test_catmull_rom_endpoints() {
        let p = Interpolation::catmull_rom(Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z, 0.0);
        assert_eq!(p, Vec3::X);
        let p = Interpolation::catmull_rom(Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z, 1.0);
        assert!(p.distance(Vec3::Y) < 1e-6);
        assert_eq!(Interpolation::lerp(2.0, 4.0, 0.5), 3.0);
    }
}
