// SPDX-License-Identifier: MIT OR Apache-2.0
//! Collaborators the render engine drives.
//!
//! The engine never owns the scene, the datasets or the windows it renders
//! into. It reaches them through these traits, bundled per call in a
//! [`Stage`].

use crate::camera::Camera;
use cinetrack_sequencer::{SplineResolver, Timeline};
use glam::Vec3;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A camera plus a renderer that can draw through it
pub trait Viewport {
    /// The active camera
    fn camera(&self) -> &Camera;

    /// The active camera, mutably
    fn camera_mut(&mut self) -> &mut Camera;

    /// Auto-frame the camera on the visible content
    fn reset_camera(&mut self);

    /// Fit the clipping planes to the visible content
    fn reset_clipping_range(&mut self);

    /// Draw the current scene
    fn render(&mut self);
}

/// The final visualization surface
pub trait RenderTarget: Viewport {
    /// Whether the visualization window exists and can render
    fn is_active(&self) -> bool;

    /// Whether at least one visualization module is loaded
    fn has_loaded_modules(&self) -> bool;

    /// Write the current image to `path`
    fn save_current_frame(&mut self, path: &Path) -> std::io::Result<()>;

    /// Resize the render window
    fn set_size(&mut self, _width: u32, _height: u32) {}

    /// Exclusive-use lease shared by every engine rendering to this target
    fn lease(&self) -> &TargetLease;
}

/// The lightweight camera/renderer pair used while editing
pub trait PreviewSurface: Viewport {}

/// Source of the animation and its datasets
pub trait DataProvider {
    /// Animation length in seconds
    fn duration(&self) -> f32;

    /// Number of frame steps; frames `0..=frame_count` are rendered
    fn frame_count(&self) -> u32;

    /// The authored timeline
    fn timeline(&self) -> &Timeline;

    /// Make `index` the displayed dataset timepoint
    fn swap_to_timepoint(&mut self, index: usize);

    /// Name used for output files
    fn dataset_name(&self) -> &str;

    /// Number of timepoints in the dataset
    fn timepoint_count(&self) -> usize;
}

/// Chooses the point the camera looks at
pub trait FocalPolicy {
    /// Focal point for the current frame
    fn focal_center(&self) -> Vec3;
}

/// Always look at the same point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedFocus(pub Vec3);

impl FocalPolicy for FixedFocus {
    fn focal_center(&self) -> Vec3 {
        self.0
    }
}

/// Everything a render call needs from the outside world
pub struct Stage<'a> {
    /// Animation and dataset source
    pub data: &'a mut dyn DataProvider,
    /// Final output surface
    pub target: &'a mut dyn RenderTarget,
    /// Preview surface
    pub preview: &'a mut dyn PreviewSurface,
    /// Camera path positions
    pub path: &'a dyn SplineResolver,
    /// Focal point policy
    pub focus: &'a dyn FocalPolicy,
}

/// Exclusive-use flag for a render target.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct TargetLease {
    claimed: Arc<AtomicBool>,
}

impl TargetLease {
    /// Create an unclaimed lease
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the target; `None` when someone else holds it
    pub fn try_claim(&self) -> Option<LeaseGuard> {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LeaseGuard {
                claimed: Arc::clone(&self.claimed),
            })
    }

    /// Whether the target is currently claimed
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

/// Releases the target when dropped
#[derive(Debug)]
pub struct LeaseGuard {
    claimed: Arc<AtomicBool>,
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        self.claimed.store(false, Ordering::Release);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory collaborators for engine tests.

    use super::*;
    use std::path::PathBuf;

    #[derive(Debug, Default)]
    pub struct MockViewport {
        pub camera: Camera,
        pub camera_resets: usize,
        pub clipping_resets: usize,
        pub renders: usize,
    }

    impl Viewport for MockViewport {
        fn camera(&self) -> &Camera {
            &self.camera
        }

        fn camera_mut(&mut self) -> &mut Camera {
            &mut self.camera
        }

        fn reset_camera(&mut self) {
            self.camera_resets += 1;
        }

        fn reset_clipping_range(&mut self) {
            self.clipping_resets += 1;
        }

        fn render(&mut self) {
            self.renders += 1;
        }
    }

    impl PreviewSurface for MockViewport {}

    /// Records every saved frame with the camera position at save time
    #[derive(Debug)]
    pub struct MockTarget {
        pub viewport: MockViewport,
        pub active: bool,
        pub modules: usize,
        pub saved: Vec<(PathBuf, Vec3)>,
        pub fail_at: Option<usize>,
        pub size: Option<(u32, u32)>,
        pub lease: TargetLease,
    }

    impl Default for MockTarget {
        fn default() -> Self {
            Self {
                viewport: MockViewport::default(),
                active: true,
                modules: 1,
                saved: Vec::new(),
                fail_at: None,
                size: None,
                lease: TargetLease::new(),
            }
        }
    }

    impl Viewport for MockTarget {
        fn camera(&self) -> &Camera {
            self.viewport.camera()
        }

        fn camera_mut(&mut self) -> &mut Camera {
            self.viewport.camera_mut()
        }

        fn reset_camera(&mut self) {
            self.viewport.reset_camera();
        }

        fn reset_clipping_range(&mut self) {
            self.viewport.reset_clipping_range();
        }

        fn render(&mut self) {
            self.viewport.render();
        }
    }

    impl RenderTarget for MockTarget {
        fn is_active(&self) -> bool {
            self.active
        }

        fn has_loaded_modules(&self) -> bool {
            self.modules > 0
        }

        fn save_current_frame(&mut self, path: &Path) -> std::io::Result<()> {
            if self.fail_at == Some(self.saved.len()) {
                return Err(std::io::Error::other("disk full"));
            }
            self.saved
                .push((path.to_path_buf(), self.viewport.camera.position));
            Ok(())
        }

        fn set_size(&mut self, width: u32, height: u32) {
            self.size = Some((width, height));
        }

        fn lease(&self) -> &TargetLease {
            &self.lease
        }
    }

    #[derive(Debug)]
    pub struct MockData {
        pub timeline: Timeline,
        pub duration: f32,
        pub frames: u32,
        pub swaps: Vec<usize>,
    }

    impl MockData {
        pub fn new(timeline: Timeline, duration: f32, frames: u32) -> Self {
            Self {
                timeline,
                duration,
                frames,
                swaps: Vec::new(),
            }
        }
    }

    impl DataProvider for MockData {
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
            self.swaps.push(index);
        }

        fn dataset_name(&self) -> &str {
            "cells"
        }

        fn timepoint_count(&self) -> usize {
            12
        }
    }

    /// Straight-line segments: segment `i` runs from `(10i, 0, 0)` to
    /// `(10(i+1), 0, 0)`
    #[derive(Debug, Default)]
    pub struct LinePath;

    impl SplineResolver for LinePath {
        fn position_at(&self, item_index: usize, progress: f32) -> Vec3 {
            Vec3::new(10.0 * (item_index as f32 + progress), 0.0, 0.0)
        }
    }
}
