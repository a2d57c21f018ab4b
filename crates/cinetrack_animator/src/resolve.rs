// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame camera resolution.
//!
//! Sources are tried in priority order:
//! 1. The spline item covering the time
//! 2. The last spline position, when the last spline item was stopped
//! 3. Keyframe interpolation, snapping to the earlier keyframe when two
//!    neighbours nearly coincide
//! 4. Pre-roll from the earliest authored data
//! 5. The previous frame's position

use crate::camera::Placement;
use crate::context::InterpolationContext;
use crate::error::{AnimatorError, Result};
use crate::stage::FocalPolicy;
use cinetrack_sequencer::{
    CameraPose, ItemId, KeyframeInterpolator, SplineResolver, Timeline, TrackId,
};
use glam::Vec3;

/// Which rule produced a pose
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseSource {
    /// Spline item covering the frame time
    Spline {
        /// Track owning the item
        track: TrackId,
        /// The item
        item: ItemId,
        /// Fraction of the item elapsed
        progress: f32,
    },
    /// Held at the end of a stopped spline item
    Stopped,
    /// Keyframe interpolation
    Keyframe {
        /// Whether the pose snapped to the earlier keyframe
        snapped: bool,
    },
    /// Reference pose of the first spline item, before it starts
    PreRoll,
    /// First keyframe, before keyframe coverage starts
    KeyframePreRoll,
    /// Previous frame's position
    Hold,
}

/// Camera pose chosen for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedPose {
    /// Camera position
    pub position: Vec3,
    /// Full keyframe pose when the source carries orientation
    pub orientation: Option<CameraPose>,
    /// Rule that produced the pose
    pub source: PoseSource,
    /// Set when this frame switched to a new spline track
    pub entered_track: Option<TrackId>,
}

impl ResolvedPose {
    fn positioned(position: Vec3, source: PoseSource) -> Self {
        Self {
            position,
            orientation: None,
            source,
            entered_track: None,
        }
    }

    fn oriented(pose: CameraPose, source: PoseSource) -> Self {
        Self {
            position: pose.position,
            orientation: Some(pose),
            source,
            entered_track: None,
        }
    }

    /// Camera placement, taking the focal point from the keyframe pose or
    /// else from `focus`
    pub fn placement(&self, focus: &dyn FocalPolicy) -> Placement {
        match self.orientation {
            Some(pose) => Placement {
                position: self.position,
                focal_point: pose.focal_point,
                view_up: Some(pose.view_up),
            },
            None => Placement {
                position: self.position,
                focal_point: focus.focal_center(),
                view_up: None,
            },
        }
    }
}

/// Resolves camera poses against one timeline
pub struct CameraResolver<'a> {
    timeline: &'a Timeline,
    keyframes: &'a KeyframeInterpolator,
    path: &'a dyn SplineResolver,
    snap_threshold: f32,
}

impl<'a> CameraResolver<'a> {
    /// Create a resolver. `keyframes` must be built from `timeline`.
    pub fn new(
        timeline: &'a Timeline,
        keyframes: &'a KeyframeInterpolator,
        path: &'a dyn SplineResolver,
        snap_threshold: f32,
    ) -> Self {
        Self {
            timeline,
            keyframes,
            path,
            snap_threshold,
        }
    }

    /// Resolve the camera pose at `time`, updating the spline history in `ctx`.
    ///
    /// `ctx.last_position` is read but not written; the caller commits the
    /// placed position once the frame is drawn.
    pub fn resolve(&self, time: f32, ctx: &mut InterpolationContext) -> Result<ResolvedPose> {
        if let Some(pose) = self.from_spline(time, ctx) {
            return Ok(pose);
        }

        if ctx.active_spline_item.is_some_and(|item| item.stopped) {
            if let Some(position) = ctx.last_spline_position {
                tracing::debug!("Camera is motionless at {time:.2}s, using last spline position");
                return Ok(ResolvedPose::positioned(position, PoseSource::Stopped));
            }
        }

        if let Some(pose) = self.from_keyframes(time) {
            return Ok(pose);
        }

        if let Some(pose) = self.pre_roll(time) {
            return Ok(pose);
        }

        ctx.last_position
            .map(|position| ResolvedPose::positioned(position, PoseSource::Hold))
            .ok_or(AnimatorError::MissingCameraData { time })
    }

    fn from_spline(&self, time: f32, ctx: &mut InterpolationContext) -> Option<ResolvedPose> {
        let (track, item) = self.timeline.spline_item_at(time)?;
        let index = item.spline_index()?;
        let progress = item.progress(time);
        let position = self.path.position_at(index, progress);

        ctx.last_spline_position = Some(position);
        ctx.active_spline_item = Some(item.into());

        let mut pose = ResolvedPose::positioned(
            position,
            PoseSource::Spline {
                track: track.id,
                item: item.id,
                progress,
            },
        );
        if ctx.active_track != Some(track.id) {
            tracing::info!("Camera switched to track '{}'", track.name);
            ctx.active_track = Some(track.id);
            pose.entered_track = Some(track.id);
        }
        Some(pose)
    }

    fn from_keyframes(&self, time: f32) -> Option<ResolvedPose> {
        let interpolated = self.keyframes.interpolate(time)?;
        match self.keyframes.bracket(time) {
            Some((a, b)) if a.pose.distance(&b.pose) < self.snap_threshold => {
                tracing::debug!("Keyframes at {}s and {}s nearly coincide, using the earlier pose", a.time, b.time);
                Some(ResolvedPose::oriented(a.pose, PoseSource::Keyframe { snapped: true }))
            }
            _ => Some(ResolvedPose::oriented(
                interpolated,
                PoseSource::Keyframe { snapped: false },
            )),
        }
    }

    fn pre_roll(&self, time: f32) -> Option<ResolvedPose> {
        let first_spline = self.timeline.first_spline_item().map(|(_, item)| item);
        let first_keyframe = self.keyframes.samples().first();

        let earliest = [
            first_spline.map(|item| item.start),
            first_keyframe.map(|sample| sample.time),
        ]
        .into_iter()
        .flatten()
        .reduce(f32::min)?;
        if time >= earliest {
            return None;
        }

        match (first_spline, first_keyframe) {
            (Some(item), key) if key.map_or(true, |k| k.time > item.start) => item
                .reference()
                .map(|position| ResolvedPose::positioned(position, PoseSource::PreRoll)),
            (_, Some(sample)) => Some(ResolvedPose::oriented(
                sample.pose,
                PoseSource::KeyframePreRoll,
            )),
            _ => None,
        }
    }
}
