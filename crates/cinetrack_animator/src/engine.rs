// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render engine: the frame loop and its state machine.
//!
//! A render walks frames `0..=total_frames`. For each frame the engine:
//! - Swaps the dataset timepoint (final renders only)
//! - Resolves and places the camera
//! - Draws, then saves the image (final renders only)
//! - Reports progress
//!
//! Stop and pause requests are polled before each frame starts, so a frame
//! that has begun always finishes.

use crate::camera::CameraRig;
use crate::config::AnimatorConfig;
use crate::context::InterpolationContext;
use crate::error::{AnimatorError, Result};
use crate::events::{EngineId, ProgressHub, RenderEvent, RenderMode};
use crate::output::FrameNamer;
use crate::resolve::{CameraResolver, ResolvedPose};
use crate::stage::{FocalPolicy, LeaseGuard, Stage, Viewport};
use cinetrack_sequencer::{FrameClock, KeyframeInterpolator, Timeline};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// Cloneable handle for stopping or pausing a running render
#[derive(Debug, Clone, Default)]
pub struct RenderControl {
    stop: Arc<AtomicBool>,
    pause: Arc<AtomicBool>,
}

impl RenderControl {
    /// Create a handle with no pending requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort before the next frame
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Pause before the next frame
    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::Relaxed);
    }

    /// Whether a stop is pending
    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Whether a pause is pending
    pub fn is_pause_requested(&self) -> bool {
        self.pause.load(Ordering::Relaxed)
    }

    fn take_stop(&self) -> bool {
        self.stop.swap(false, Ordering::Relaxed)
    }

    fn take_pause(&self) -> bool {
        self.pause.swap(false, Ordering::Relaxed)
    }

    fn clear(&self) {
        self.stop.store(false, Ordering::Relaxed);
        self.pause.store(false, Ordering::Relaxed);
    }
}

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    /// Nothing rendered yet, or the last render failed
    #[default]
    Idle,
    /// The frame loop is running
    Rendering,
    /// Waiting to resume
    Paused,
    /// Stopped before the last frame
    Aborted,
    /// Rendered every frame
    Completed,
}

/// How a call into the frame loop ended
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Every frame was rendered
    Completed {
        /// Number of frames drawn across the whole session
        frames_rendered: u32,
        /// Saved images, in frame order; empty for previews
        written: Vec<PathBuf>,
    },
    /// Paused before `frame`
    Paused {
        /// Next frame to render
        frame: u32,
    },
    /// Stopped before `frame`
    Aborted {
        /// First frame not rendered
        frame: u32,
    },
}

struct RenderSession {
    mode: RenderMode,
    clock: FrameClock,
    timeline: Timeline,
    keyframes: KeyframeInterpolator,
    context: InterpolationContext,
    cursor: u32,
    namer: Option<FrameNamer>,
    written: Vec<PathBuf>,
    _lease: Option<LeaseGuard>,
}

/// Drives camera animation renders
pub struct RenderEngine {
    id: EngineId,
    config: AnimatorConfig,
    rig: CameraRig,
    state: RenderState,
    session: Option<RenderSession>,
    control: RenderControl,
    progress: ProgressHub,
    subscribers: Vec<mpsc::Sender<RenderEvent>>,
    scrub_context: InterpolationContext,
}

impl RenderEngine {
    /// Create an idle engine reporting progress through `progress`
    pub fn new(config: AnimatorConfig, progress: ProgressHub) -> Self {
        Self {
            id: EngineId::new(),
            rig: CameraRig::new(config.roll_threshold),
            config,
            state: RenderState::Idle,
            session: None,
            control: RenderControl::new(),
            progress,
            subscribers: Vec::new(),
            scrub_context: InterpolationContext::new(),
        }
    }

    /// Engine ID
    pub fn id(&self) -> EngineId {
        self.id
    }

    /// Current state
    pub fn state(&self) -> RenderState {
        self.state
    }

    /// Settings in use
    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    /// Handle for stopping or pausing from inside callbacks
    pub fn control(&self) -> RenderControl {
        self.control.clone()
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&mut self) -> mpsc::Receiver<RenderEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Frame the next paused or running render continues from
    pub fn cursor(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.cursor)
    }

    /// Start a fresh render from frame 0.
    ///
    /// A final render requires an active target with at least one loaded
    /// module; a preview has no preconditions.
    pub fn render(&mut self, stage: &mut Stage<'_>, mode: RenderMode) -> Result<RenderOutcome> {
        if matches!(self.state, RenderState::Rendering | RenderState::Paused) {
            return Err(AnimatorError::Busy);
        }

        if mode == RenderMode::Final {
            if !stage.target.is_active() {
                return Err(AnimatorError::not_ready("the render window is not active"));
            }
            if !stage.target.has_loaded_modules() {
                return Err(AnimatorError::not_ready("no visualization modules are loaded"));
            }
        }

        if !self.progress.acquire(self.id) {
            return Err(AnimatorError::Busy);
        }
        let (lease, namer) = match mode {
            RenderMode::Final => match self.prepare_final(stage) {
                Ok((lease, namer)) => (Some(lease), Some(namer)),
                Err(err) => {
                    self.progress.release(self.id);
                    return Err(err);
                }
            },
            RenderMode::Preview => (None, None),
        };
        self.control.clear();

        let clock = FrameClock::new(stage.data.duration(), stage.data.frame_count());
        let timeline = stage.data.timeline().clone();
        let keyframes = timeline.keyframe_interpolator();
        self.session = Some(RenderSession {
            mode,
            clock,
            timeline,
            keyframes,
            context: InterpolationContext::new(),
            cursor: 0,
            namer,
            written: Vec::new(),
            _lease: lease,
        });

        tracing::info!(
            "Rendering {} frames over {:.1}s ({:?})",
            clock.total_frames() + 1,
            clock.duration(),
            mode
        );
        self.state = RenderState::Rendering;
        self.emit(RenderEvent::Started {
            engine: self.id,
            mode,
            total_frames: clock.total_frames(),
        });
        if mode == RenderMode::Preview {
            self.emit(RenderEvent::PreviewMode(true));
        }

        self.run(stage)
    }

    /// Continue a paused render with its camera history intact
    pub fn resume(&mut self, stage: &mut Stage<'_>) -> Result<RenderOutcome> {
        if self.state != RenderState::Paused {
            return Err(AnimatorError::NotPaused);
        }
        let frame = self.cursor().ok_or(AnimatorError::NotPaused)?;
        // A pending stop aborts at the cursor
        self.control.take_pause();

        tracing::info!("Resumed rendering at frame {frame}");
        self.state = RenderState::Rendering;
        self.emit(RenderEvent::Resumed { frame });
        self.run(stage)
    }

    /// Resume when paused, otherwise start a fresh preview
    pub fn play(&mut self, stage: &mut Stage<'_>) -> Result<RenderOutcome> {
        match self.state {
            RenderState::Paused => self.resume(stage),
            RenderState::Rendering => Err(AnimatorError::Busy),
            RenderState::Idle | RenderState::Aborted | RenderState::Completed => {
                self.render(stage, RenderMode::Preview)
            }
        }
    }

    /// Pause before the next frame
    pub fn pause(&self) {
        self.control.request_pause();
    }

    /// Stop the render. A paused render aborts immediately; a running one
    /// aborts before its next frame.
    pub fn stop(&mut self) {
        if self.state == RenderState::Paused {
            if let Some(session) = self.session.take() {
                let frame = session.cursor;
                self.abort(session, frame);
            }
        } else {
            self.control.request_stop();
        }
    }

    /// Show the camera at `time` on the preview surface.
    ///
    /// While paused, the resume cursor moves to the frame nearest `time`.
    pub fn scrub(&mut self, stage: &mut Stage<'_>, time: f32) -> Result<ResolvedPose> {
        let snap = self.config.snap_threshold;
        let resolved = match self.state {
            RenderState::Rendering => return Err(AnimatorError::Busy),
            RenderState::Paused => {
                let session = self.session.as_mut().ok_or(AnimatorError::NotPaused)?;
                session.cursor = session.clock.frame_at(time);
                let resolver =
                    CameraResolver::new(&session.timeline, &session.keyframes, stage.path, snap);
                place_frame(
                    &mut *stage.preview,
                    &resolver,
                    &self.rig,
                    &session.timeline,
                    stage.focus,
                    time,
                    &mut session.context,
                )
            }
            RenderState::Idle | RenderState::Aborted | RenderState::Completed => {
                let timeline = stage.data.timeline();
                let keyframes = timeline.keyframe_interpolator();
                let resolver = CameraResolver::new(timeline, &keyframes, stage.path, snap);
                place_frame(
                    &mut *stage.preview,
                    &resolver,
                    &self.rig,
                    timeline,
                    stage.focus,
                    time,
                    &mut self.scrub_context,
                )
            }
        };
        let pose = resolved?;

        stage.preview.render();
        if let Some(track) = pose.entered_track {
            self.emit(RenderEvent::TrackActivated(track));
        }
        Ok(pose)
    }

    /// Claim the target, create the output directory and size the window
    fn prepare_final(&self, stage: &mut Stage<'_>) -> Result<(LeaseGuard, FrameNamer)> {
        let lease = stage.target.lease().try_claim().ok_or(AnimatorError::Busy)?;

        let namer = FrameNamer::new(
            self.config.output_dir.clone(),
            stage.data.dataset_name(),
            stage.data.timepoint_count(),
            self.config.codec,
        );
        namer
            .prepare()
            .map_err(|source| AnimatorError::WriteFailure {
                path: namer.directory().to_path_buf(),
                source,
            })?;

        if let Some((width, height)) = self.config.frame_size {
            stage.target.set_size(width, height);
        }
        Ok((lease, namer))
    }

    fn run(&mut self, stage: &mut Stage<'_>) -> Result<RenderOutcome> {
        let mut session = self.session.take().ok_or(AnimatorError::NotPaused)?;
        let total = session.clock.total_frames();

        while session.cursor <= total {
            let frame = session.cursor;

            if self.control.take_stop() {
                return Ok(self.abort(session, frame));
            }
            if self.control.take_pause() {
                tracing::info!("Paused rendering at frame {frame}");
                self.session = Some(session);
                self.state = RenderState::Paused;
                self.emit(RenderEvent::Paused { frame });
                return Ok(RenderOutcome::Paused { frame });
            }

            let time = session.clock.time_at(frame);
            if let Err(err) = self.render_frame(&mut session, stage, frame, time) {
                tracing::error!("Rendering failed at frame {frame}: {err}");
                self.abort(session, frame);
                self.state = RenderState::Idle;
                return Err(err);
            }
            session.cursor += 1;

            let label = format!("Rendering frame {frame} / {total}. Time: {time:.1}s");
            self.progress
                .report(self.id, session.clock.progress(frame), &label);
        }

        Ok(self.complete(session))
    }

    fn render_frame(
        &self,
        session: &mut RenderSession,
        stage: &mut Stage<'_>,
        frame: u32,
        time: f32,
    ) -> Result<()> {
        tracing::debug!("Rendering frame {frame} at {time:.2}s");
        let resolver = CameraResolver::new(
            &session.timeline,
            &session.keyframes,
            stage.path,
            self.config.snap_threshold,
        );

        let pose = match session.mode {
            RenderMode::Final => {
                if let Some(timepoint) = session.context.timepoint.update(&session.timeline, time) {
                    tracing::debug!("Switching dataset to timepoint {timepoint}");
                    stage.data.swap_to_timepoint(timepoint);
                    self.emit(RenderEvent::TimepointChanged(timepoint));
                }
                let pose = place_frame(
                    &mut *stage.target,
                    &resolver,
                    &self.rig,
                    &session.timeline,
                    stage.focus,
                    time,
                    &mut session.context,
                );
                stage.target.render();

                if let Some(namer) = &session.namer {
                    let path = namer.path_for(frame);
                    stage
                        .target
                        .save_current_frame(&path)
                        .map_err(|source| AnimatorError::WriteFailure {
                            path: path.clone(),
                            source,
                        })?;
                    session.written.push(path);
                }
                pose
            }
            RenderMode::Preview => {
                let pose = place_frame(
                    &mut *stage.preview,
                    &resolver,
                    &self.rig,
                    &session.timeline,
                    stage.focus,
                    time,
                    &mut session.context,
                );
                stage.preview.render();

                let delay = self.config.preview_frame_delay();
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                pose
            }
        };

        if let Some(track) = pose.ok().and_then(|p| p.entered_track) {
            self.emit(RenderEvent::TrackActivated(track));
        }
        self.emit(RenderEvent::FrameRendered { frame, time });
        Ok(())
    }

    fn abort(&mut self, session: RenderSession, frame: u32) -> RenderOutcome {
        let total = session.clock.total_frames();
        let status = format!("Rendering aborted at frame {frame} / {total}.");
        tracing::info!("{status}");

        self.state = RenderState::Aborted;
        self.emit(RenderEvent::Aborted {
            frame,
            status: status.clone(),
        });
        // Fraction of frames actually drawn
        let fraction = frame as f32 / (total + 1) as f32;
        self.finish(&session, fraction, &status);
        RenderOutcome::Aborted { frame }
    }

    fn complete(&mut self, session: RenderSession) -> RenderOutcome {
        let status = "Rendering done.".to_string();
        tracing::info!("{status}");

        self.state = RenderState::Completed;
        self.emit(RenderEvent::Completed {
            status: status.clone(),
        });
        self.finish(&session, 1.0, &status);
        RenderOutcome::Completed {
            frames_rendered: session.clock.total_frames() + 1,
            written: session.written,
        }
    }

    fn finish(&self, session: &RenderSession, fraction: f32, status: &str) {
        match session.mode {
            RenderMode::Final => self.progress.report(self.id, fraction, status),
            RenderMode::Preview => {
                self.emit(RenderEvent::PreviewMode(false));
                self.progress.report(self.id, fraction, "")
            }
        };
        self.emit(RenderEvent::Finished);
        self.progress.release(self.id);
    }

    fn emit(&self, event: RenderEvent) {
        for tx in &self.subscribers {
            // Dropped receivers are not an error
            let _ = tx.send(event.clone());
        }
    }
}

impl Drop for RenderEngine {
    fn drop(&mut self) {
        // A paused session still owns the progress hub
        self.progress.release(self.id);
    }
}

impl std::fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEngine")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("cursor", &self.cursor())
            .finish_non_exhaustive()
    }
}

/// Resolve the pose at `time` and apply it to `viewport`.
///
/// On a track change the viewport is reset first. When no pose can be
/// resolved the camera is left where it is.
fn place_frame<V: Viewport + ?Sized>(
    viewport: &mut V,
    resolver: &CameraResolver<'_>,
    rig: &CameraRig,
    timeline: &Timeline,
    focus: &dyn FocalPolicy,
    time: f32,
    ctx: &mut InterpolationContext,
) -> Result<ResolvedPose> {
    let pose = match resolver.resolve(time, ctx) {
        Ok(pose) => pose,
        Err(err) => {
            tracing::warn!("{err}");
            return Err(err);
        }
    };

    if pose.entered_track.is_some() {
        rig.reset_for_track(viewport);
    }

    let maintain_up = ctx
        .active_track
        .and_then(|id| timeline.track(id))
        .is_some_and(|track| track.maintain_up_direction);
    rig.place(viewport, &pose.placement(focus), ctx.last_position, maintain_up);
    ctx.commit(pose.position);
    Ok(pose)
}
