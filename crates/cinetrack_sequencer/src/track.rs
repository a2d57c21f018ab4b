// SPDX-License-Identifier: MIT OR Apache-2.0
//! Track definitions for the timeline.

use crate::keyframe::CameraPose;
use crate::timeline::TimelineError;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tolerance used when matching a time against an item's closing boundary
pub(crate) const TIME_EPSILON: f32 = 0.0001;

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    /// Create a new random track ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a track item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Create a new random item ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

/// Kind of track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    /// Binds time ranges to dataset timepoints
    Timepoint,
    /// Camera moves along an authored path
    Spline,
    /// Captured camera poses at single instants
    Keyframe,
}

impl TrackKind {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Timepoint => "Timepoint",
            Self::Spline => "Camera Path",
            Self::Keyframe => "Keyframe",
        }
    }
}

/// Data carried by a track item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemPayload {
    /// A segment of the owning camera path
    Spline {
        /// Segment index along the path
        index: usize,
        /// Camera stays where it is once this segment has been passed
        stopped: bool,
        /// Reference position of the segment start
        reference: Vec3,
    },
    /// A captured camera pose
    Keyframe {
        /// The pose at this instant
        pose: CameraPose,
    },
    /// A dataset timepoint shown during the interval
    Timepoint {
        /// Dataset timepoint index
        timepoint: usize,
    },
}

impl ItemPayload {
    /// Track kind this payload belongs to
    pub fn kind(&self) -> TrackKind {
        match self {
            Self::Spline { .. } => TrackKind::Spline,
            Self::Keyframe { .. } => TrackKind::Keyframe,
            Self::Timepoint { .. } => TrackKind::Timepoint,
        }
    }
}

/// A single authored unit on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackItem {
    /// Unique item ID
    pub id: ItemId,
    /// Start time in seconds
    pub start: f32,
    /// End time in seconds (equal to `start` for keyframes)
    pub end: f32,
    /// Item data
    pub payload: ItemPayload,
}

impl TrackItem {
    /// Create a camera path segment covering `[start, end)`
    pub fn spline(start: f32, end: f32, index: usize, reference: Vec3) -> Self {
        Self {
            id: ItemId::new(),
            start,
            end,
            payload: ItemPayload::Spline {
                index,
                stopped: false,
                reference,
            },
        }
    }

    /// Create a keyframe at a single instant
    pub fn keyframe(time: f32, pose: CameraPose) -> Self {
        Self {
            id: ItemId::new(),
            start: time,
            end: time,
            payload: ItemPayload::Keyframe { pose },
        }
    }

    /// Create a timepoint binding covering `[start, end)`
    pub fn timepoint(start: f32, end: f32, timepoint: usize) -> Self {
        Self {
            id: ItemId::new(),
            start,
            end,
            payload: ItemPayload::Timepoint { timepoint },
        }
    }

    /// Mark a spline segment as stopped. No effect on other payloads.
    pub fn with_stopped(mut self, value: bool) -> Self {
        if let ItemPayload::Spline { stopped, .. } = &mut self.payload {
            *stopped = value;
        }
        self
    }

    /// Track kind this item belongs on
    pub fn kind(&self) -> TrackKind {
        self.payload.kind()
    }

    /// Time of the item (its start)
    pub fn time(&self) -> f32 {
        self.start
    }

    /// Length of the interval
    pub fn duration(&self) -> f32 {
        self.end - self.start
    }

    /// Half-open containment: `start <= time < end`
    pub fn contains(&self, time: f32) -> bool {
        self.start <= time && time < self.end
    }

    /// Whether `time` sits on the closing boundary of the interval
    pub fn closes_at(&self, time: f32) -> bool {
        (time - self.end).abs() < TIME_EPSILON
    }

    /// Fraction of the interval elapsed at `time`, clamped to `[0, 1]`.
    ///
    /// Zero-length items report `0.0`.
    pub fn progress(&self, time: f32) -> f32 {
        let length = self.duration();
        if length <= 0.0 {
            return 0.0;
        }
        ((time - self.start) / length).clamp(0.0, 1.0)
    }

    /// Segment index for spline items
    pub fn spline_index(&self) -> Option<usize> {
        match self.payload {
            ItemPayload::Spline { index, .. } => Some(index),
            _ => None,
        }
    }

    /// Whether this is a stopped spline item
    pub fn is_stopped(&self) -> bool {
        matches!(self.payload, ItemPayload::Spline { stopped: true, .. })
    }

    /// Reference position for spline items
    pub fn reference(&self) -> Option<Vec3> {
        match self.payload {
            ItemPayload::Spline { reference, .. } => Some(reference),
            _ => None,
        }
    }

    /// Captured pose for keyframe items
    pub fn pose(&self) -> Option<&CameraPose> {
        match &self.payload {
            ItemPayload::Keyframe { pose } => Some(pose),
            _ => None,
        }
    }

    /// Dataset timepoint for timepoint items
    pub fn timepoint_index(&self) -> Option<usize> {
        match self.payload {
            ItemPayload::Timepoint { timepoint } => Some(timepoint),
            _ => None,
        }
    }
}

/// A track in the timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique track ID
    pub id: TrackId,
    /// Track name
    pub name: String,
    /// Track kind
    pub kind: TrackKind,
    /// Items, sorted by start time
    items: Vec<TrackItem>,
    /// Keep the camera upright while this track drives it
    pub maintain_up_direction: bool,
}

impl Track {
    /// Create a new track
    pub fn new(name: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: TrackId::new(),
            name: name.into(),
            kind,
            items: Vec::new(),
            maintain_up_direction: false,
        }
    }

    /// Set the maintain-up-direction flag
    pub fn with_maintain_up_direction(mut self, value: bool) -> Self {
        self.maintain_up_direction = value;
        self
    }

    /// Add an item, keeping items ordered by start time
    pub fn add_item(&mut self, item: TrackItem) -> Result<ItemId, TimelineError> {
        if item.kind() != self.kind {
            return Err(TimelineError::KindMismatch {
                track: self.kind,
                item: item.kind(),
            });
        }
        if !(item.start.is_finite() && item.end.is_finite()) || item.end < item.start {
            return Err(TimelineError::InvalidInterval {
                start: item.start,
                end: item.end,
            });
        }
        let id = item.id;
        self.items.push(item);
        self.sort_items();
        Ok(id)
    }

    /// Add an item, builder style
    pub fn with_item(mut self, item: TrackItem) -> Result<Self, TimelineError> {
        self.add_item(item)?;
        Ok(self)
    }

    /// Remove an item
    pub fn remove_item(&mut self, item_id: ItemId) -> Option<TrackItem> {
        let idx = self.items.iter().position(|i| i.id == item_id)?;
        Some(self.items.remove(idx))
    }

    /// Sort items by start time
    fn sort_items(&mut self) {
        self.items.sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    /// Get item by ID
    pub fn item(&self, item_id: ItemId) -> Option<&TrackItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Get all items
    pub fn items(&self) -> &[TrackItem] {
        &self.items
    }

    /// Get the first item
    pub fn first_item(&self) -> Option<&TrackItem> {
        self.items.first()
    }

    /// Get item count
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// End of the last item
    pub fn duration(&self) -> f32 {
        self.items.iter().map(|i| i.end).fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_open_containment() {
        let item = TrackItem::spline(2.0, 4.0, 0, Vec3::ZERO);
        assert!(item.contains(2.0));
        assert!(item.contains(3.999));
        assert!(!item.contains(4.0));
        assert!(item.closes_at(4.0));
        assert!(!item.contains(1.0));
    }

    #[test]
    fn test_progress() {
        let item = TrackItem::spline(2.0, 6.0, 0, Vec3::ZERO);
        assert_eq!(item.progress(3.0), 0.25);
        assert_eq!(item.progress(6.0), 1.0);
        let instant = TrackItem::spline(1.0, 1.0, 0, Vec3::ZERO);
        assert_eq!(instant.progress(1.0), 0.0);
    }

    #[test]
    fn test_items_sorted_and_kind_checked() {
        let mut track = Track::new("Path", TrackKind::Spline);
        track.add_item(TrackItem::spline(5.0, 8.0, 1, Vec3::ZERO)).unwrap();
        track.add_item(TrackItem::spline(0.0, 5.0, 0, Vec3::ZERO)).unwrap();
        assert_eq!(track.items()[0].start, 0.0);
        assert_eq!(track.duration(), 8.0);

        let err = track.add_item(TrackItem::timepoint(0.0, 1.0, 3)).unwrap_err();
        assert!(matches!(err, TimelineError::KindMismatch { .. }));

        let err = track
            .add_item(TrackItem::spline(4.0, 2.0, 0, Vec3::ZERO))
            .unwrap_err();
        assert!(matches!(err, TimelineError::InvalidInterval { .. }));
    }

    #[test]
    fn test_stopped_flag_only_on_splines() {
        let item = TrackItem::spline(0.0, 1.0, 0, Vec3::ZERO).with_stopped(true);
        assert!(item.is_stopped());
        let tp = TrackItem::timepoint(0.0, 1.0, 2).with_stopped(true);
        assert!(!tp.is_stopped());
        assert_eq!(tp.timepoint_index(), Some(2));
    }

    #[test]
    fn test_remove_item() {
        let mut track = Track::new("Time", TrackKind::Timepoint);
        let id = track.add_item(TrackItem::timepoint(0.0, 1.0, 0)).unwrap();
        assert_eq!(track.item(id).and_then(TrackItem::timepoint_index), Some(0));
        assert!(track.remove_item(id).is_some());
        assert!(track.item(id).is_none());
        assert_eq!(track.item_count(), 0);
        assert!(track.remove_item(id).is_none());
    }
}
