// SPDX-License-Identifier: MIT OR Apache-2.0
//! Binding of timeline time to dataset timepoints.

use crate::timeline::Timeline;

/// Tracks which dataset timepoint is active and reports changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimepointBinding {
    current: Option<usize>,
}

impl TimepointBinding {
    /// Create a binding with no active timepoint
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently active timepoint, if any has been bound yet
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Look up the timepoint at `time`.
    ///
    /// Returns `Some(index)` when it differs from the active one (always on
    /// the first call) and makes it active.
    pub fn update(&mut self, timeline: &Timeline, time: f32) -> Option<usize> {
        let timepoint = timeline.timepoint_at(time);
        if self.current == Some(timepoint) {
            return None;
        }
        self.current = Some(timepoint);
        Some(timepoint)
    }

    /// Forget the active timepoint
    pub fn reset(&mut self) {
        self.current = None;
    }
}
