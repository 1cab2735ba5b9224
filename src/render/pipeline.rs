use std::sync::{Arc, OnceLock};

use crate::composite::blend::{BlendMode, composite};
use crate::composite::gradient::build_gradient;
use crate::config::settings::Configuration;
use crate::foundation::core::{Extent, PixelBuffer};
use crate::foundation::error::NoiseResult;
use crate::frames::frame_set::FrameSet;
use crate::render::sink::PresentedFrame;

/// Background layer for `config` at the surface extent.
pub fn build_background(config: &Configuration, surface: Extent) -> NoiseResult<PixelBuffer> {
    build_gradient(
        surface,
        config.primary_color,
        config.secondary_color,
        config.gradient_start(),
        config.gradient_end(),
    )
}

/// Composite slot `slot` of `frames` over `background`.
///
/// Returns `None` while the slot is still pending.
pub fn compose_slot(
    frames: &FrameSet,
    slot: usize,
    background: &Arc<PixelBuffer>,
    mode: BlendMode,
) -> Option<PresentedFrame> {
    let noise = frames.get(slot)?;
    Some(PresentedFrame {
        slot,
        frame: Arc::new(composite(&noise, background, mode)),
        background: Arc::clone(background),
    })
}

/// Composited frames of one frame set over one background with one blend mode.
///
/// Each slot is composited at most once, the first time it is asked for once its noise is ready,
/// and the result is kept for as long as this cache lives. The engine replaces the whole cache
/// whenever the frame set, background or blend mode changes, so noise never has to be
/// regenerated for a colour or blend change.
pub struct ComposedFrames {
    frames: Arc<FrameSet>,
    background: Arc<PixelBuffer>,
    mode: BlendMode,
    composed: Vec<OnceLock<Arc<PixelBuffer>>>,
}

impl std::fmt::Debug for ComposedFrames {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposedFrames")
            .field("slots", &self.composed.len())
            .field("composed", &self.composed_count())
            .field("mode", &self.mode)
            .finish()
    }
}

impl ComposedFrames {
    /// Empty cache over `frames`; nothing is composited yet.
    pub fn new(frames: Arc<FrameSet>, background: Arc<PixelBuffer>, mode: BlendMode) -> Self {
        let composed = (0..frames.len()).map(|_| OnceLock::new()).collect();
        Self {
            frames,
            background,
            mode,
            composed,
        }
    }

    /// Frame set the composites are drawn from.
    pub fn frames(&self) -> &Arc<FrameSet> {
        &self.frames
    }

    /// Background every frame is blended over.
    pub fn background(&self) -> &Arc<PixelBuffer> {
        &self.background
    }

    /// Blend operator used for every composite.
    pub fn mode(&self) -> BlendMode {
        self.mode
    }

    /// Whether `slot` has a cached composite.
    pub fn is_composed(&self, slot: usize) -> bool {
        self.composed.get(slot).is_some_and(|c| c.get().is_some())
    }

    /// Number of cached composites.
    pub fn composed_count(&self) -> usize {
        self.composed.iter().filter(|c| c.get().is_some()).count()
    }

    /// Cached composite of `slot`, compositing it now if its noise is ready.
    ///
    /// Returns `None` for pending or out-of-range slots.
    pub fn get_or_compose(&self, slot: usize) -> Option<PresentedFrame> {
        let cell = self.composed.get(slot)?;
        let frame = match cell.get() {
            Some(frame) => Arc::clone(frame),
            None => {
                let noise = self.frames.get(slot)?;
                Arc::clone(
                    cell.get_or_init(|| Arc::new(composite(&noise, &self.background, self.mode))),
                )
            }
        };
        Some(PresentedFrame {
            slot,
            frame,
            background: Arc::clone(&self.background),
        })
    }

    /// Composite every ready slot that is not cached yet, checking `keep_going` before each.
    ///
    /// Returns how many previously uncached slots are now cached.
    pub fn compose_ready(&self, keep_going: impl Fn() -> bool) -> usize {
        let mut done = 0;
        for (slot, cell) in self.composed.iter().enumerate() {
            if cell.get().is_some() || !self.frames.is_ready(slot) {
                continue;
            }
            if !keep_going() {
                break;
            }
            if self.get_or_compose(slot).is_some() {
                done += 1;
            }
        }
        done
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
