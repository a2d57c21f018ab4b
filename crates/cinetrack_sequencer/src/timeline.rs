// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline containing multiple tracks.

use crate::keyframe::KeyframeInterpolator;
use crate::track::{Track, TrackId, TrackItem, TrackKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineId(pub Uuid);

impl TimelineId {
    /// Create a new random timeline ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors raised while building a timeline
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    /// Item payload does not belong on this kind of track
    #[error("Cannot add a {item:?} item to a {track:?} track")]
    KindMismatch {
        /// Kind of the receiving track
        track: TrackKind,
        /// Kind of the rejected item
        item: TrackKind,
    },

    /// Interval is empty-reversed or not finite
    #[error("Invalid item interval [{start}, {end}]")]
    InvalidInterval {
        /// Item start
        start: f32,
        /// Item end
        end: f32,
    },
}

/// Which match wins when several items contain the same time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchRule {
    First,
    Last,
}

/// Find the item covering `time`.
///
/// An item with `start <= time < end` wins over one whose closing boundary
/// equals `time`, so adjacent items hand over at their shared boundary while
/// the end of the final item is still covered.
fn locate<'a>(
    entries: impl Iterator<Item = (&'a Track, &'a TrackItem)>,
    time: f32,
    rule: MatchRule,
) -> Option<(&'a Track, &'a TrackItem)> {
    let mut open = None;
    let mut closing = None;
    for (track, item) in entries {
        let slot = if item.contains(time) {
            &mut open
        } else if item.closes_at(time) {
            &mut closing
        } else {
            continue;
        };
        if slot.is_none() || rule == MatchRule::Last {
            *slot = Some((track, item));
        }
    }
    open.or(closing)
}

/// A timeline of tracks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    /// Unique timeline ID
    pub id: TimelineId,
    /// Timeline name
    pub name: String,
    /// Tracks in insertion order
    tracks: IndexMap<TrackId, Track>,
}

impl Timeline {
    /// Create a new timeline
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: TimelineId::new(),
            name: name.into(),
            tracks: IndexMap::new(),
        }
    }

    /// Add a track
    pub fn add_track(&mut self, track: Track) -> TrackId {
        let id = track.id;
        self.tracks.insert(id, track);
        id
    }

    /// Remove a track
    pub fn remove_track(&mut self, track_id: TrackId) -> Option<Track> {
        self.tracks.shift_remove(&track_id)
    }

    /// Get a track
    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// Get a mutable track
    pub fn track_mut(&mut self, track_id: TrackId) -> Option<&mut Track> {
        self.tracks.get_mut(&track_id)
    }

    /// Get all tracks
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// Get track count
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Tracks of one kind, in timeline order
    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &Track> {
        self.tracks.values().filter(move |t| t.kind == kind)
    }

    fn items_of(&self, kind: TrackKind) -> impl Iterator<Item = (&Track, &TrackItem)> {
        self.tracks_of(kind)
            .flat_map(|track| track.items().iter().map(move |item| (track, item)))
    }

    /// The spline item covering `time` and its track. The first match wins.
    pub fn spline_item_at(&self, time: f32) -> Option<(&Track, &TrackItem)> {
        locate(self.items_of(TrackKind::Spline), time, MatchRule::First)
    }

    /// The chronologically first spline item across all spline tracks
    pub fn first_spline_item(&self) -> Option<(&Track, &TrackItem)> {
        self.tracks_of(TrackKind::Spline)
            .filter_map(|track| track.first_item().map(|item| (track, item)))
            .fold(None, |best: Option<(&Track, &TrackItem)>, candidate| match best {
                Some(b) if b.1.start <= candidate.1.start => Some(b),
                _ => Some(candidate),
            })
    }

    /// Dataset timepoint at `time`.
    ///
    /// The last matching timepoint item wins; `0` when none match.
    pub fn timepoint_at(&self, time: f32) -> usize {
        locate(self.items_of(TrackKind::Timepoint), time, MatchRule::Last)
            .and_then(|(_, item)| item.timepoint_index())
            .unwrap_or(0)
    }

    /// Build a keyframe interpolator from every keyframe item
    pub fn keyframe_interpolator(&self) -> KeyframeInterpolator {
        let mut interp = KeyframeInterpolator::new();
        for (_, item) in self.items_of(TrackKind::Keyframe) {
            if let Some(pose) = item.pose() {
                interp.register(item.time(), *pose);
            }
        }
        interp
    }

    /// Get the duration based on track content
    pub fn content_duration(&self) -> f32 {
        self.tracks.values().map(Track::duration).fold(0.0, f32::max)
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new("Untitled Timeline")
    }
}

/// Maps frame numbers to timeline time.
///
/// Frames run from `0` to `total_frames` inclusive, so a timeline rendered
/// with `N` frames produces `N + 1` images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    duration: f32,
    total_frames: u32,
    seconds_per_frame: f32,
}

impl FrameClock {
    /// Create a clock for `duration` seconds split into `total_frames` steps
    pub fn new(duration: f32, total_frames: u32) -> Self {
        let seconds_per_frame = if total_frames == 0 {
            0.0
        } else {
            duration / total_frames as f32
        };
        Self {
            duration,
            total_frames,
            seconds_per_frame,
        }
    }

    /// Animation duration in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Index of the last frame
    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Seconds per frame
    pub fn seconds_per_frame(&self) -> f32 {
        self.seconds_per_frame
    }

    /// Timeline time of `frame`
    pub fn time_at(&self, frame: u32) -> f32 {
        frame as f32 * self.seconds_per_frame
    }

    /// Frame showing `time`, clamped to the frame range
    pub fn frame_at(&self, time: f32) -> u32 {
        if self.seconds_per_frame <= 0.0 || time <= 0.0 {
            return 0;
        }
        ((time / self.seconds_per_frame).round() as u32).min(self.total_frames)
    }

    /// Progress fraction once `frame` has been rendered
    pub fn progress(&self, frame: u32) -> f32 {
        (frame + 1) as f32 / (self.total_frames + 1) as f32
    }
}
