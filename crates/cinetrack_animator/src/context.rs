// SPDX-License-Identifier: MIT OR Apache-2.0
//! State carried from one frame to the next.

use cinetrack_sequencer::{ItemId, TimepointBinding, TrackId, TrackItem};
use glam::Vec3;

/// The spline item that last drove the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveSplineItem {
    /// Item ID
    pub id: ItemId,
    /// Whether the camera stays put once this item has been passed
    pub stopped: bool,
}

impl From<&TrackItem> for ActiveSplineItem {
    fn from(item: &TrackItem) -> Self {
        Self {
            id: item.id,
            stopped: item.is_stopped(),
        }
    }
}

/// Cross-frame interpolation state.
///
/// A render session owns exactly one context. Pausing keeps it untouched so
/// a resumed render continues with the same camera history; a fresh render
/// starts from [`InterpolationContext::default`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterpolationContext {
    /// Position last produced by a spline item
    pub last_spline_position: Option<Vec3>,
    /// Spline item that produced it
    pub active_spline_item: Option<ActiveSplineItem>,
    /// Position placed on the previous frame, from any source
    pub last_position: Option<Vec3>,
    /// Track currently driving the camera
    pub active_track: Option<TrackId>,
    /// Dataset timepoint currently displayed
    pub timepoint: TimepointBinding,
}

impl InterpolationContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the position placed this frame
    pub fn commit(&mut self, position: Vec3) {
        self.last_position = Some(position);
    }
}
