// SPDX-License-Identifier: MIT OR Apache-2.0
//! Point cloud shared between the dataset and the render surfaces.

use cinetrack_animator::FocalPolicy;
use glam::Vec3;
use parking_lot::RwLock;
use std::sync::Arc;

/// Colored points currently on display
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    /// Point positions
    pub points: Vec<Vec3>,
    /// RGBA color per point
    pub colors: Vec<[u8; 4]>,
}

impl PointCloud {
    /// Axis-aligned bounds, `None` when empty
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.points.first()?;
        Some(
            self.points
                .iter()
                .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p))),
        )
    }

    /// Whether there is nothing to draw
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Handle to the displayed point cloud
pub type SharedScene = Arc<RwLock<PointCloud>>;

/// Looks at the center of whatever is on display
#[derive(Debug, Clone)]
pub struct SceneCenter {
    scene: SharedScene,
}

impl SceneCenter {
    /// Focus on the bounds center of `scene`
    pub fn new(scene: SharedScene) -> Self {
        Self { scene }
    }
}

impl FocalPolicy for SceneCenter {
    fn focal_center(&self) -> Vec3 {
        self.scene
            .read()
            .bounds()
            .map_or(Vec3::ZERO, |(min, max)| (min + max) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_and_center() {
        let scene: SharedScene = Arc::new(RwLock::new(PointCloud {
            points: vec![Vec3::new(-2.0, 0.0, 1.0), Vec3::new(4.0, 2.0, 3.0)],
            colors: vec![[255; 4]; 2],
        }));
        assert_eq!(
            scene.read().bounds(),
            Some((Vec3::new(-2.0, 0.0, 1.0), Vec3::new(4.0, 2.0, 3.0)))
        );
        let center = SceneCenter::new(Arc::clone(&scene));
        assert_eq!(center.focal_center(), Vec3::new(1.0, 1.0, 2.0));

        scene.write().points.clear();
        assert_eq!(center.focal_center(), Vec3::ZERO);
    }
}
