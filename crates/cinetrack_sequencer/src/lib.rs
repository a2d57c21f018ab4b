// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline model for Cinetrack.
//!
//! This crate provides the authored data the animator consumes:
//! - Camera path tracks made of spline segments
//! - Keyframe tracks holding captured camera poses
//! - Timepoint tracks binding time ranges to dataset timepoints
//!
//! ## Architecture
//!
//! The timeline is built on:
//! - Track system with typed items
//! - Cubic keyframe interpolation
//! - A spline resolver contract for camera paths
//! - Frame clock for time/frame conversion

pub mod track;
pub mod keyframe;
pub mod binding;
pub mod spline;
pub mod timeline;

pub use track::{ItemId, ItemPayload, Track, TrackId, TrackItem, TrackKind};
pub use keyframe::{CameraPose, Interpolation, KeyframeInterpolator, KeyframeSample};
pub use binding::TimepointBinding;
pub use spline::{CatmullRomPath, SplineResolver};
pub use timeline::{FrameClock, Timeline, TimelineError, TimelineId};
pub use glam::Vec3;
