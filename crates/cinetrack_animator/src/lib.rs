// SPDX-License-Identifier: MIT OR Apache-2.0
//! Camera animation renderer for Cinetrack.
//!
//! This crate turns an authored timeline into rendered frames:
//! - Per-frame camera resolution from spline paths and keyframes
//! - Camera placement with roll correction
//! - Dataset timepoint switching
//! - Final rendering to image files and lightweight preview playback
//!
//! ## Architecture
//!
//! The engine owns its render session and talks to the scene, datasets and
//! windows through the traits in [`stage`]. Progress goes through a shared
//! [`ProgressHub`]; state changes are published as [`RenderEvent`]s.

pub mod camera;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod events;
pub mod output;
pub mod resolve;
pub mod stage;

pub use camera::{Camera, CameraRig, Placement, UpCorrection, CANONICAL_UP};
pub use config::{AnimatorConfig, ConfigError, CONFIG_FILE_NAME, CONFIG_FORMAT_VERSION};
pub use context::{ActiveSplineItem, InterpolationContext};
pub use engine::{RenderControl, RenderEngine, RenderOutcome, RenderState};
pub use error::{AnimatorError, Result};
pub use events::{EngineId, ProgressHub, ProgressSink, RenderEvent, RenderMode};
pub use output::{FrameNamer, ImageCodec};
pub use resolve::{CameraResolver, PoseSource, ResolvedPose};
pub use stage::{
    DataProvider, FixedFocus, FocalPolicy, LeaseGuard, PreviewSurface, RenderTarget, Stage,
    TargetLease, Viewport,
};
