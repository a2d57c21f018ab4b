// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render notifications and progress reporting.

use cinetrack_sequencer::TrackId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a render engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EngineId(pub Uuid);

impl EngineId {
    /// Create a new random engine ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EngineId {
    fn default() -> Self {
        Self::new()
    }
}

/// Where frames go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RenderMode {
    /// Render to the target window and save every frame
    Final,
    /// Play back on the preview surface without saving
    Preview,
}

/// Notification sent to engine subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// A fresh render began
    Started {
        /// Engine that started
        engine: EngineId,
        /// Render mode
        mode: RenderMode,
        /// Index of the last frame
        total_frames: u32,
    },
    /// A frame was drawn (and saved, in final mode)
    FrameRendered {
        /// Frame number
        frame: u32,
        /// Timeline time of the frame
        time: f32,
    },
    /// A spline track took over the camera
    TrackActivated(TrackId),
    /// The displayed dataset timepoint changed
    TimepointChanged(usize),
    /// Rendering paused before `frame`
    Paused {
        /// Next frame to render
        frame: u32,
    },
    /// Rendering continued from `frame`
    Resumed {
        /// First frame rendered after resuming
        frame: u32,
    },
    /// Rendering stopped early
    Aborted {
        /// Frame at which the loop stopped
        frame: u32,
        /// Status line
        status: String,
    },
    /// Every frame was rendered
    Completed {
        /// Status line
        status: String,
    },
    /// Preview playback started (`true`) or ended (`false`)
    PreviewMode(bool),
    /// The render session is over, whatever the outcome
    Finished,
}

/// Receives render progress
pub trait ProgressSink: Send {
    /// `fraction` is in `0.0..=1.0`
    fn on_progress(&mut self, fraction: f32, label: &str);
}

impl<F> ProgressSink for F
where
    F: FnMut(f32, &str) + Send,
{
    fn on_progress(&mut self, fraction: f32, label: &str) {
        self(fraction, label)
    }
}

#[derive(Default)]
struct ProgressInner {
    owner: Option<EngineId>,
    sinks: Vec<Box<dyn ProgressSink>>,
}

/// Progress fan-out shared between engines.
///
/// Only one engine may report at a time. An engine acquires the hub when a
/// render starts and releases it when the render finishes; reports from
/// anyone else are dropped.
#[derive(Clone, Default)]
pub struct ProgressHub {
    inner: Arc<Mutex<ProgressInner>>,
}

impl std::fmt::Debug for ProgressHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ProgressHub")
            .field("owner", &inner.owner)
            .field("sinks", &inner.sinks.len())
            .finish()
    }
}

impl ProgressHub {
    /// Create a hub with no sinks
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink
    pub fn add_sink(&self, sink: impl ProgressSink + 'static) {
        self.inner.lock().sinks.push(Box::new(sink));
    }

    /// Take exclusive ownership. Succeeds if the hub is free or already
    /// owned by `owner`.
    pub fn acquire(&self, owner: EngineId) -> bool {
        let mut inner = self.inner.lock();
        match inner.owner {
            Some(current) if current != owner => false,
            _ => {
                inner.owner = Some(owner);
                true
            }
        }
    }

    /// Give up ownership if held by `owner`
    pub fn release(&self, owner: EngineId) {
        let mut inner = self.inner.lock();
        if inner.owner == Some(owner) {
            inner.owner = None;
        }
    }

    /// Current owner
    pub fn owner(&self) -> Option<EngineId> {
        self.inner.lock().owner
    }

    /// Forward progress to every sink if `owner` holds the hub
    pub fn report(&self, owner: EngineId, fraction: f32, label: &str) -> bool {
        // Sinks run unlocked so they may call back into the hub
        let mut sinks = {
            let mut inner = self.inner.lock();
            if inner.owner != Some(owner) {
                return false;
            }
            std::mem::take(&mut inner.sinks)
        };
        for sink in sinks.iter_mut() {
            sink.on_progress(fraction, label);
        }
        let mut inner = self.inner.lock();
        sinks.append(&mut inner.sinks);
        inner.sinks = sinks;
        true
    }
}
