// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in demo animation.

use cinetrack_sequencer::{
    CameraPose, CatmullRomPath, Timeline, TimelineError, Track, TrackItem, TrackKind,
};
use glam::Vec3;

/// Length of the demo animation in seconds
pub const DEMO_DURATION: f32 = 20.0;

/// Camera path: segment `i` is used by the spline item with index `i`
pub fn demo_path() -> CatmullRomPath {
    CatmullRomPath::new(vec![
        Vec3::new(80.0, 0.0, 20.0),
        Vec3::new(60.0, -30.0, 15.0),
        Vec3::new(40.0, -40.0, 10.0),
        Vec3::new(0.0, -50.0, 5.0),
        Vec3::new(-40.0, -40.0, 0.0),
        Vec3::new(-50.0, 0.0, -5.0),
    ])
}

/// Keyframed fly-in, a two-part spline approach, an upright orbit that
/// stops, and timepoints spread evenly over the whole animation.
pub fn demo_timeline(timepoint_count: usize) -> Result<Timeline, TimelineError> {
    let path = demo_path();
    let points = path.points();
    let mut timeline = Timeline::new("Demo");

    let flyby = Track::new("Fly-in", TrackKind::Keyframe)
        .with_item(TrackItem::keyframe(
            0.0,
            CameraPose::new(Vec3::new(0.0, -120.0, 40.0), Vec3::ZERO, Vec3::Z),
        ))?
        .with_item(TrackItem::keyframe(
            2.0,
            CameraPose::new(Vec3::new(60.0, -100.0, 30.0), Vec3::ZERO, Vec3::Z),
        ))?
        .with_item(TrackItem::keyframe(
            4.0,
            CameraPose::new(points[0], Vec3::ZERO, Vec3::Z),
        ))?;
    timeline.add_track(flyby);

    let approach = Track::new("Approach", TrackKind::Spline)
        .with_item(TrackItem::spline(4.0, 6.0, 0, points[0]))?
        .with_item(TrackItem::spline(6.0, 8.0, 1, points[1]))?;
    timeline.add_track(approach);

    let orbit = Track::new("Orbit", TrackKind::Spline)
        .with_maintain_up_direction(true)
        .with_item(TrackItem::spline(8.0, 11.0, 2, points[2]))?
        .with_item(TrackItem::spline(11.0, 14.0, 3, points[3]))?
        .with_item(TrackItem::spline(14.0, 16.0, 4, points[4]).with_stopped(true))?;
    timeline.add_track(orbit);

    let count = timepoint_count.max(1);
    let step = DEMO_DURATION / count as f32;
    let mut timepoints = Track::new("Timepoints", TrackKind::Timepoint);
    for tp in 0..count {
        let start = tp as f32 * step;
        timepoints.add_item(TrackItem::timepoint(start, start + step, tp))?;
    }
    timeline.add_track(timepoints);

    Ok(timeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinetrack_sequencer::SplineResolver;

    #[test]
    fn test_demo_layout() {
        let timeline = demo_timeline(6).unwrap();
        assert_eq!(timeline.track_count(), 4);
        assert!((timeline.content_duration() - DEMO_DURATION).abs() < 1e-4);
        assert_eq!(timeline.timepoint_at(0.0), 0);
        assert_eq!(timeline.timepoint_at(DEMO_DURATION), 5);
        assert_eq!(timeline.keyframe_interpolator().len(), 3);
    }

    #[test]
    fn test_path_segments_match_items() {
        let timeline = demo_timeline(1).unwrap();
        let path = demo_path();
        let max_index = timeline
            .tracks_of(TrackKind::Spline)
            .flat_map(|t| t.items())
            .filter_map(TrackItem::spline_index)
            .max()
            .unwrap();
        assert!(max_index < path.segment_count());

        // The fly-in ends where the approach begins
        let (_, first) = timeline.first_spline_item().unwrap();
        assert_eq!(path.position_at(0, 0.0), first.reference().unwrap());
    }
}
