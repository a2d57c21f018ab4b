// SPDX-License-Identifier: MIT OR Apache-2.0
//! Synthetic multi-timepoint dataset.
//!
//! Each timepoint is a cluster of points on a sphere whose radius and color
//! change over time, so swaps are visible in the rendered frames.

use crate::scene::{PointCloud, SharedScene};
use cinetrack_animator::DataProvider;
use cinetrack_sequencer::Timeline;
use glam::Vec3;
use parking_lot::RwLock;
use std::sync::Arc;

/// Points per timepoint
const POINTS_PER_TIMEPOINT: usize = 2000;

/// Generate the point cloud of one timepoint
pub fn growing_sphere(timepoint: usize, timepoint_count: usize) -> PointCloud {
    let phase = if timepoint_count > 1 {
        timepoint as f32 / (timepoint_count - 1) as f32
    } else {
        0.0
    };
    let radius = 10.0 + 15.0 * phase;
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());

    let mut cloud = PointCloud::default();
    for i in 0..POINTS_PER_TIMEPOINT {
        // Fibonacci sphere
        let z = 1.0 - 2.0 * (i as f32 + 0.5) / POINTS_PER_TIMEPOINT as f32;
        let ring = (1.0 - z * z).sqrt();
        let theta = golden_angle * i as f32;
        let wobble = 1.0 + 0.1 * (theta * 3.0 + phase * 6.0).sin();
        cloud
            .points
            .push(Vec3::new(ring * theta.cos(), ring * theta.sin(), z) * radius * wobble);

        let height = (z + 1.0) * 0.5;
        cloud.colors.push([
            (255.0 * phase) as u8,
            (80.0 + 175.0 * height) as u8,
            (255.0 * (1.0 - phase)) as u8,
            255,
        ]);
    }
    cloud
}

/// Dataset with precomputed timepoints feeding a shared scene
#[derive(Debug)]
pub struct DemoDataset {
    name: String,
    duration: f32,
    frames: u32,
    timeline: Timeline,
    timepoints: Vec<PointCloud>,
    scene: SharedScene,
    current: usize,
}

impl DemoDataset {
    /// Build `timepoint_count` timepoints and display the first one
    pub fn new(
        name: impl Into<String>,
        timeline: Timeline,
        duration: f32,
        frames: u32,
        timepoint_count: usize,
    ) -> Self {
        let timepoints: Vec<PointCloud> = (0..timepoint_count.max(1))
            .map(|tp| growing_sphere(tp, timepoint_count))
            .collect();
        let scene = Arc::new(RwLock::new(timepoints[0].clone()));
        Self {
            name: name.into(),
            duration,
            frames,
            timeline,
            timepoints,
            scene,
            current: 0,
        }
    }

    /// Handle to the displayed point cloud
    pub fn scene(&self) -> SharedScene {
        Arc::clone(&self.scene)
    }

    /// Timepoint on display
    pub fn current_timepoint(&self) -> usize {
        self.current
    }
}

impl DataProvider for DemoDataset {
    fn duration(&self) -> f32 {
        self.duration
    }

    fn frame_count(&self) -> u32 {
        self.frames
    }

    fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    fn swap_to_timepoint(&mut self, index: usize) {
        let Some(cloud) = self.timepoints.get(index) else {
            tracing::warn!(
                "Timepoint {index} out of range, dataset has {}",
                self.timepoints.len()
            );
            return;
        };
        *self.scene.write() = cloud.clone();
        self.current = index;
    }

    fn dataset_name(&self) -> &str {
        &self.name
    }

    fn timepoint_count(&self) -> usize {
        self.timepoints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timepoints_grow() {
        let first = growing_sphere(0, 5);
        let last = growing_sphere(4, 5);
        assert_eq!(first.points.len(), POINTS_PER_TIMEPOINT);
        assert_eq!(first.colors.len(), first.points.len());

        let extent = |cloud: &PointCloud| {
            let (min, max) = cloud.bounds().unwrap();
            (max - min).length()
        };
        assert!(extent(&last) > extent(&first));
    }

    #[test]
    fn test_swap_updates_shared_scene() {
        let mut dataset = DemoDataset::new("cells", Timeline::default(), 10.0, 10, 3);
        let scene = dataset.scene();
        assert_eq!(*scene.read(), growing_sphere(0, 3));

        dataset.swap_to_timepoint(2);
        assert_eq!(dataset.current_timepoint(), 2);
        assert_eq!(*scene.read(), growing_sphere(2, 3));

        dataset.swap_to_timepoint(7);
        assert_eq!(dataset.current_timepoint(), 2);
        assert_eq!(dataset.timepoint_count(), 3);
    }
}
