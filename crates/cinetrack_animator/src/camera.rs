// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera state and per-frame camera placement.

use crate::stage::Viewport;
use glam::{Mat4, Vec3};

/// Canonical vertical direction
pub const CANONICAL_UP: Vec3 = Vec3::Z;

/// A 3D camera looking at a focal point.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space.
    pub position: Vec3,
    /// Point the camera is looking at.
    pub focal_point: Vec3,
    /// Up vector.
    pub view_up: Vec3,
    /// Vertical view angle in degrees.
    pub view_angle: f32,
    /// Near and far clipping distances.
    pub clipping_range: (f32, f32),
}

impl Camera {
    /// Creates a camera one unit above the origin on +Z, looking down.
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            focal_point: Vec3::ZERO,
            view_up: Vec3::Y,
            view_angle: 30.0,
            clipping_range: (0.01, 1000.01),
        }
    }

    /// Unit vector from the position towards the focal point.
    pub fn direction_of_projection(&self) -> Vec3 {
        (self.focal_point - self.position).normalize_or_zero()
    }

    /// Unit vector from the focal point back towards the position.
    pub fn view_plane_normal(&self) -> Vec3 {
        -self.direction_of_projection()
    }

    /// Distance between position and focal point.
    pub fn distance(&self) -> f32 {
        self.position.distance(self.focal_point)
    }

    /// Make the view-up vector perpendicular to the direction of projection.
    ///
    /// Leaves the camera unchanged when the view-up is parallel to the view
    /// direction or the camera sits on its focal point.
    pub fn orthogonalize_view_up(&mut self) {
        let dop = self.direction_of_projection();
        if dop == Vec3::ZERO {
            return;
        }
        let up = self.view_up - dop * self.view_up.dot(dop);
        if up.length_squared() > 1e-12 {
            self.view_up = up.normalize();
        }
    }

    /// Move the camera so a bounding box fills the view, keeping the
    /// current viewing direction.
    pub fn frame_bounds(&mut self, min: Vec3, max: Vec3) {
        let center = (min + max) * 0.5;
        let mut radius = (max - min).length() * 0.5;
        if radius <= 0.0 {
            radius = 0.5;
        }
        let mut normal = self.view_plane_normal();
        if normal == Vec3::ZERO {
            normal = Vec3::Z;
        }
        let half_angle = (self.view_angle.to_radians() * 0.5).max(1e-3);
        let distance = radius / half_angle.sin();

        self.focal_point = center;
        self.position = center + normal * distance;
        self.orthogonalize_view_up();
        self.reset_clipping_range_for_bounds(min, max);
    }

    /// Fit near and far planes around a bounding box.
    pub fn reset_clipping_range_for_bounds(&mut self, min: Vec3, max: Vec3) {
        let center = (min + max) * 0.5;
        let radius = ((max - min).length() * 0.5).max(1e-3);
        let depth = (center - self.position).dot(self.direction_of_projection());
        let far = (depth + radius).max(1e-2);
        let near = (depth - radius).max(far * 1e-3);
        self.clipping_range = (near, far);
    }

    /// Returns the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.focal_point, self.view_up)
    }

    /// Returns the perspective projection matrix.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        let (near, far) = self.clipping_range;
        Mat4::perspective_rh(self.view_angle.to_radians(), aspect_ratio, near, far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the camera goes this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Camera position
    pub position: Vec3,
    /// Focal point
    pub focal_point: Vec3,
    /// View-up to apply, if the pose source provides one
    pub view_up: Option<Vec3>,
}

/// What happened to the view-up vector during placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpCorrection {
    /// Forced to the canonical vertical and orthogonalized
    Upright,
    /// Orthogonalized because the height changed sharply
    Orthogonalized,
    /// Left alone
    Untouched,
}

/// Applies resolved poses to a viewport camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    /// Height change that triggers view-up orthogonalization
    pub roll_threshold: f32,
}

impl CameraRig {
    /// Create a rig
    pub fn new(roll_threshold: f32) -> Self {
        Self { roll_threshold }
    }

    /// Recenter the camera when a new track takes over
    pub fn reset_for_track<V: Viewport + ?Sized>(&self, viewport: &mut V) {
        let camera = viewport.camera_mut();
        camera.focal_point = Vec3::ZERO;
        camera.view_up = CANONICAL_UP;
        viewport.reset_camera();
    }

    /// Place the camera and fix up its orientation.
    ///
    /// `previous` is the position placed on the previous frame.
    pub fn place<V: Viewport + ?Sized>(
        &self,
        viewport: &mut V,
        placement: &Placement,
        previous: Option<Vec3>,
        maintain_up: bool,
    ) -> UpCorrection {
        let camera = viewport.camera_mut();
        camera.position = placement.position;
        camera.focal_point = placement.focal_point;
        if let Some(up) = placement.view_up {
            camera.view_up = up;
        }

        let correction = if maintain_up {
            camera.view_up = CANONICAL_UP;
            camera.orthogonalize_view_up();
            UpCorrection::Upright
        } else if previous.is_some_and(|p| (p.z - placement.position.z).abs() > self.roll_threshold) {
            camera.orthogonalize_view_up();
            UpCorrection::Orthogonalized
        } else {
            UpCorrection::Untouched
        };

        viewport.reset_clipping_range();
        correction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::testing::MockViewport;

    #[test]
    fn test_orthogonalize_view_up() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(10.0, 0.0, 0.0);
        camera.focal_point = Vec3::ZERO;
        camera.view_up = Vec3::new(1.0, 0.0, 1.0);
        camera.orthogonalize_view_up();
        assert!(camera.view_up.dot(camera.direction_of_projection()).abs() < 1e-6);
        assert!((camera.view_up - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_orthogonalize_parallel_up_is_noop() {
        let mut camera = Camera::new();
        camera.view_up = Vec3::Z;
        camera.orthogonalize_view_up();
        assert_eq!(camera.view_up, Vec3::Z);
    }

    #[test]
    fn test_frame_bounds_keeps_direction() {
        let mut camera = Camera::new();
        camera.position = Vec3::new(0.0, -5.0, 0.0);
        camera.view_up = Vec3::Z;
        camera.frame_bounds(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(camera.focal_point, Vec3::ZERO);
        assert!(camera.view_plane_normal().distance(Vec3::NEG_Y) < 1e-5);
        let (near, far) = camera.clipping_range;
        assert!(near > 0.0 && near < far);
    }

    #[test]
    fn test_maintain_up_forces_vertical() {
        let rig = CameraRig::new(2.0);
        let mut viewport = MockViewport::default();
        let placement = Placement {
            position: Vec3::new(10.0, 0.0, 0.0),
            focal_point: Vec3::ZERO,
            view_up: Some(Vec3::new(0.3, 0.0, 1.0)),
        };
        let correction = rig.place(&mut viewport, &placement, None, true);
        assert_eq!(correction, UpCorrection::Upright);
        assert_eq!(viewport.camera.view_up, Vec3::Z);
        assert_eq!(viewport.clipping_resets, 1);
    }

    #[test]
    fn test_roll_threshold() {
        let rig = CameraRig::new(2.0);
        let mut viewport = MockViewport::default();
        let placement = Placement {
            position: Vec3::new(10.0, 0.0, 3.0),
            focal_point: Vec3::ZERO,
            view_up: None,
        };
        let small = rig.place(&mut viewport, &placement, Some(Vec3::new(10.0, 0.0, 1.5)), false);
        assert_eq!(small, UpCorrection::Untouched);
        let large = rig.place(&mut viewport, &placement, Some(Vec3::new(10.0, 0.0, 0.5)), false);
        assert_eq!(large, UpCorrection::Orthogonalized);
        let first = rig.place(&mut viewport, &placement, None, false);
        assert_eq!(first, UpCorrection::Untouched);
        assert_eq!(viewport.clipping_resets, 3);
    }

    #[test]
    fn test_reset_for_track() {
        let rig = CameraRig::new(2.0);
        let mut viewport = MockViewport::default();
        viewport.camera.focal_point = Vec3::ONE;
        rig.reset_for_track(&mut viewport);
        assert_eq!(viewport.camera.focal_point, Vec3::ZERO);
        assert_eq!(viewport.camera.view_up, CANONICAL_UP);
        assert_eq!(viewport.camera_resets, 1);
    }
}
