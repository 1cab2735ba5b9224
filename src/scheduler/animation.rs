use std::time::Duration;

use crate::frames::frame_set::FrameSet;

/// Frame-stepping state of the animation loop.
///
/// Each [`tick`](AnimationScheduler::tick) picks the slot to show and advances the cursor; the
/// cursor only moves onto slots that are already written, so a partially generated set loops over
/// its written prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationScheduler {
    current: usize,
    visible: bool,
    frame_interval: Duration,
}

impl AnimationScheduler {
    /// Visible scheduler positioned at slot 0.
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            current: 0,
            visible: true,
            frame_interval,
        }
    }

    /// Slot the next tick will try first.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Whether ticks currently advance the animation.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns `true` when the flag changed.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        std::mem::replace(&mut self.visible, visible) != visible
    }

    /// Delay between ticks.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Change the delay between ticks.
    pub fn set_frame_interval(&mut self, interval: Duration) {
        self.frame_interval = interval;
    }

    /// Rewind to slot 0, used when the frame set is replaced.
    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Slot to render now, then advance.
    ///
    /// Renders the current slot, or slot 0 when the current one is pending. Returns `None` when
    /// hidden or when neither is written yet, in which case the previously presented frame stays
    /// on screen. Afterwards the cursor moves to `(current + 1) % len` if that slot is written
    /// and back to 0 otherwise.
    pub fn tick(&mut self, frames: &FrameSet) -> Option<usize> {
        if !self.visible || frames.is_empty() {
            return None;
        }
        let len = frames.len();
        if self.current >= len {
            self.current = 0;
        }

        let slot = if frames.is_ready(self.current) {
            Some(self.current)
        } else if frames.is_ready(0) {
            Some(0)
        } else {
            None
        };

        let next = (self.current + 1) % len;
        self.current = if frames.is_ready(next) { next } else { 0 };
        slot
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/animation.rs"]
mod tests;
