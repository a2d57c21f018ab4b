// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera path position lookup.

use crate::keyframe::Interpolation;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Maps a path segment and a progress fraction to a camera position
pub trait SplineResolver {
    /// Position on segment `item_index` at `progress` in `[0, 1]`
    fn position_at(&self, item_index: usize, progress: f32) -> Vec3;
}

/// Catmull-Rom camera path through a list of control points.
///
/// Segment `i` runs from `points[i]` to `points[i + 1]`; end points are
/// duplicated to supply the outer tangents. A closed path wraps around.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatmullRomPath {
    points: Vec<Vec3>,
    /// Whether the last point connects back to the first
    pub closed: bool,
}

impl CatmullRomPath {
    /// Create an open path
    pub fn new(points: Vec<Vec3>) -> Self {
        Self {
            points,
            closed: false,
        }
    }

    /// Create a closed loop
    pub fn closed(points: Vec<Vec3>) -> Self {
        Self {
            points,
            closed: true,
        }
    }

    /// Control points
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Number of segments
    pub fn segment_count(&self) -> usize {
        match self.points.len() {
            0 | 1 => 0,
            n if self.closed => n,
            n => n - 1,
        }
    }

    /// Axis-aligned bounds of the control points
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.points.first()?;
        Some(
            self.points
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }

    fn point(&self, index: isize) -> Vec3 {
        let n = self.points.len() as isize;
        let idx = if self.closed {
            index.rem_euclid(n)
        } else {
            index.clamp(0, n - 1)
        };
        self.points[idx as usize]
    }
}

impl SplineResolver for CatmullRomPath {
    fn position_at(&self, item_index: usize, progress: f32) -> Vec3 {
        match self.points.len() {
            0 => return Vec3::ZERO,
            1 => return self.points[0],
            _ => {}
        }
        let segment = item_index.min(self.segment_count() - 1) as isize;
        Interpolation::catmull_rom(
            self.point(segment - 1),
            self.point(segment),
            self.point(segment + 1),
            self.point(segment + 2),
            progress.clamp(0.0, 1.0),
        )
    }
}
