// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cinetrack - camera animation renderer
//!
//! Renders the built-in demo animation over a synthetic point-cloud dataset:
//! - Final mode writes every frame to the configured output directory
//! - Preview mode plays the animation on an off-screen preview surface
//!
//! ## Usage
//!
//! `cinetrack [config.ron] [--preview]`
//!
//! Without a config path, `cinetrack.ron` in the working directory is used
//! when present, and built-in defaults otherwise.

mod dataset;
mod demo;
mod raster;
mod scene;

use cinetrack_animator::{
    AnimatorConfig, AnimatorError, ConfigError, ProgressHub, RenderEngine, RenderEvent,
    RenderMode, RenderOutcome, Stage, CONFIG_FILE_NAME,
};
use cinetrack_sequencer::TimelineError;
use dataset::DemoDataset;
use raster::{SoftwareTarget, SoftwareViewport};
use scene::SceneCenter;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Frame size used when the config does not set one
const DEFAULT_FRAME_SIZE: (u32, u32) = (640, 480);
/// Preview surface size
const PREVIEW_SIZE: (u32, u32) = (320, 240);
/// Frame steps in the demo animation
const DEMO_FRAMES: u32 = 100;
/// Timepoints in the demo dataset
const DEMO_TIMEPOINTS: usize = 12;

/// Errors that end the program
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid demo timeline: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Render error: {0}")]
    Render(#[from] AnimatorError),

    #[error("Usage: cinetrack [config.ron] [--preview]")]
    Usage,
}

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    preview: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, AppError> {
        let mut parsed = Args::default();
        for arg in args {
            match arg.as_str() {
                "--preview" => parsed.preview = true,
                flag if flag.starts_with('-') => return Err(AppError::Usage),
                path if parsed.config.is_none() => parsed.config = Some(PathBuf::from(path)),
                _ => return Err(AppError::Usage),
            }
        }
        Ok(parsed)
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AnimatorConfig, AppError> {
    if let Some(path) = path {
        return Ok(AnimatorConfig::load(path)?);
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(AnimatorConfig::load(&local)?);
    }
    tracing::info!("No {CONFIG_FILE_NAME} found, using defaults");
    Ok(AnimatorConfig::default())
}

fn run(args: Args) -> Result<(), AppError> {
    let config = load_config(args.config.as_ref())?;
    let mode = if args.preview {
        RenderMode::Preview
    } else {
        RenderMode::Final
    };

    let timeline = demo::demo_timeline(DEMO_TIMEPOINTS)?;
    let path = demo::demo_path();
    let mut data = DemoDataset::new(
        "cells",
        timeline,
        demo::DEMO_DURATION,
        DEMO_FRAMES,
        DEMO_TIMEPOINTS,
    );
    let focus = SceneCenter::new(data.scene());
    let (width, height) = config.frame_size.unwrap_or(DEFAULT_FRAME_SIZE);
    let mut target = SoftwareTarget::new(data.scene(), width, height);
    let mut preview = SoftwareViewport::new(data.scene(), PREVIEW_SIZE.0, PREVIEW_SIZE.1);

    let progress = ProgressHub::new();
    progress.add_sink(|fraction: f32, label: &str| {
        if !label.is_empty() {
            tracing::info!("[{:>3.0}%] {label}", fraction * 100.0);
        }
    });

    let mut engine = RenderEngine::new(config, progress);
    let events = engine.subscribe();

    let mut stage = Stage {
        data: &mut data,
        target: &mut target,
        preview: &mut preview,
        path: &path,
        focus: &focus,
    };
    let outcome = engine.render(&mut stage, mode)?;

    for event in events.try_iter() {
        match event {
            RenderEvent::TrackActivated(track) => tracing::debug!("Track activated: {track:?}"),
            RenderEvent::TimepointChanged(tp) => tracing::debug!("Timepoint changed: {tp}"),
            _ => {}
        }
    }

    match outcome {
        RenderOutcome::Completed {
            frames_rendered,
            written,
        } => {
            tracing::info!("Rendered {frames_rendered} frames, wrote {} files", written.len());
            let last = match mode {
                RenderMode::Final => target.viewport().raster(),
                RenderMode::Preview => preview.raster(),
            };
            tracing::debug!(
                "Last frame covers {} pixels, showing timepoint {}",
                last.covered_pixels(),
                data.current_timepoint()
            );
        }
        RenderOutcome::Paused { frame } | RenderOutcome::Aborted { frame } => {
            tracing::warn!("Render ended early at frame {frame}");
        }
    }
    Ok(())
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,cinetrack_animator=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cinetrack v{}", env!("CARGO_PKG_VERSION"));

    let result = Args::parse(std::env::args().skip(1)).and_then(run);
    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinetrack_animator::RenderTarget;

    fn args(list: &[&str]) -> Result<Args, AppError> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_args() {
        assert_eq!(args(&[]).unwrap(), Args::default());
        let parsed = args(&["--preview", "render.ron"]).unwrap();
        assert!(parsed.preview);
        assert_eq!(parsed.config, Some(PathBuf::from("render.ron")));
        assert!(matches!(args(&["--verbose"]), Err(AppError::Usage)));
        assert!(matches!(args(&["a.ron", "b.ron"]), Err(AppError::Usage)));
    }

    #[test]
    fn test_demo_final_render_writes_frames() {
        let dir = std::env::temp_dir().join(format!("cinetrack-demo-{}", std::process::id()));
        let config = AnimatorConfig {
            frame_size: Some((64, 48)),
            ..AnimatorConfig::default().with_output_dir(&dir)
        };

        let timepoints = 3;
        let timeline = demo::demo_timeline(timepoints).unwrap();
        let path = demo::demo_path();
        let mut data = DemoDataset::new("demo", timeline, demo::DEMO_DURATION, 8, timepoints);
        let focus = SceneCenter::new(data.scene());
        let mut target = SoftwareTarget::new(data.scene(), 16, 16);
        let mut preview = SoftwareViewport::new(data.scene(), 16, 16);
        let mut engine = RenderEngine::new(config, ProgressHub::new());

        let mut stage = Stage {
            data: &mut data,
            target: &mut target,
            preview: &mut preview,
            path: &path,
            focus: &focus,
        };
        let outcome = engine.render(&mut stage, RenderMode::Final).unwrap();

        let RenderOutcome::Completed { written, .. } = outcome else {
            panic!("demo render did not complete");
        };
        assert_eq!(written.len(), 9);
        assert_eq!(written[0], dir.join("demo_0.png"));
        assert!(written.iter().all(|p| p.exists()));
        assert_eq!(
            image::image_dimensions(&written[8]).unwrap(),
            (64, 48)
        );
        assert_eq!(data.current_timepoint(), 2);
        assert!(target.has_loaded_modules());
        assert_eq!(preview.frames_drawn(), 0);
    }
}
