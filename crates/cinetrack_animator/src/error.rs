// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animator error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the render engine
#[derive(Debug, Error)]
pub enum AnimatorError {
    /// Final render requested while the render target cannot render
    #[error("Cannot render project: {reason}")]
    NotReady {
        /// Why the target is not ready
        reason: String,
    },

    /// A render is already running against this engine or target
    #[error("A render is already in progress")]
    Busy,

    /// Writing a frame to disk failed
    #[error("Failed to write frame to {}: {source}", path.display())]
    WriteFailure {
        /// Destination of the failed write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No rule could establish a camera pose
    #[error("No camera data available at {time:.2}s")]
    MissingCameraData {
        /// Timeline time of the frame
        time: f32,
    },

    /// Resume requested while no render is paused
    #[error("No paused render to resume")]
    NotPaused,
}

impl AnimatorError {
    /// Create a not-ready error
    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self::NotReady {
            reason: reason.into(),
        }
    }
}

/// Result type for animator operations
pub type Result<T> = std::result::Result<T, AnimatorError>;
