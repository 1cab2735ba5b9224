use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use crate::foundation::core::{Extent, PixelBuffer};
use crate::foundation::error::{NoiseError, NoiseResult};

/// State of one slot in a [`FrameSet`].
#[derive(Clone, Debug)]
pub enum Slot {
    /// Not written yet.
    Pending,
    /// Fully generated noise layer.
    Ready(Arc<PixelBuffer>),
}

impl Slot {
    /// Whether the slot holds a frame.
    pub fn is_ready(&self) -> bool {
        matches!(self, Slot::Ready(_))
    }

    /// The frame, if ready.
    pub fn frame(&self) -> Option<&Arc<PixelBuffer>> {
        match self {
            Slot::Ready(f) => Some(f),
            Slot::Pending => None,
        }
    }
}

/// Fixed-size, ordered collection of frames making up one animation loop.
///
/// Slots are write-once: a slot goes from pending to ready exactly once and is then immutable.
/// Publishing a slot is a single atomic store of an `Arc`, so readers on other threads observe
/// either nothing or the complete frame.
pub struct FrameSet {
    extent: Extent,
    slots: Vec<OnceLock<Arc<PixelBuffer>>>,
    ready: AtomicUsize,
}

impl std::fmt::Debug for FrameSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSet")
            .field("extent", &self.extent)
            .field("len", &self.slots.len())
            .field("ready", &self.ready_count())
            .finish()
    }
}

impl FrameSet {
    /// `len` pending slots whose frames will have `extent`.
    pub fn new(len: usize, extent: Extent) -> NoiseResult<Self> {
        if len == 0 {
            return Err(NoiseError::invalid_argument("frame set needs at least one slot"));
        }
        Ok(Self {
            extent,
            slots: (0..len).map(|_| OnceLock::new()).collect(),
            ready: AtomicUsize::new(0),
        })
    }

    /// Placeholder used before the first surface size is known.
    pub(crate) fn empty() -> Self {
        Self {
            extent: Extent {
                width: 1,
                height: 1,
            },
            slots: Vec::new(),
            ready: AtomicUsize::new(0),
        }
    }

    /// Number of slots (frames per loop).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True for the placeholder set used before any generation.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resolution every frame in this set has.
    pub fn frame_extent(&self) -> Extent {
        self.extent
    }

    /// State of slot `index`; out-of-range indices read as pending.
    pub fn slot(&self, index: usize) -> Slot {
        match self.slots.get(index).and_then(OnceLock::get) {
            Some(frame) => Slot::Ready(Arc::clone(frame)),
            None => Slot::Pending,
        }
    }

    /// Whether slot `index` has been written. Out-of-range indices are never ready.
    pub fn is_ready(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Frame in slot `index`, if written.
    pub fn get(&self, index: usize) -> Option<Arc<PixelBuffer>> {
        self.slot(index).frame().cloned()
    }

    /// Number of written slots.
    pub fn ready_count(&self) -> usize {
        self.ready.load(Ordering::Acquire)
    }

    /// Every slot written; false for an empty set.
    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.ready_count() == self.slots.len()
    }

    /// Publish `frame` into slot `index`.
    ///
    /// Fails when the index is out of range, the slot was already written, or the frame's
    /// extent differs from the set's.
    pub fn fill(&self, index: usize, frame: PixelBuffer) -> NoiseResult<()> {
        let slot = self.slots.get(index).ok_or_else(|| {
            NoiseError::invalid_argument(format!(
                "slot {index} out of range for frame set of {}",
                self.slots.len()
            ))
        })?;
        if frame.extent() != self.extent {
            return Err(NoiseError::invalid_argument(format!(
                "frame is {}x{}, frame set expects {}x{}",
                frame.width(),
                frame.height(),
                self.extent.width,
                self.extent.height
            )));
        }
        slot.set(Arc::new(frame))
            .map_err(|_| NoiseError::invalid_argument(format!("slot {index} already written")))?;
        self.ready.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frames/frame_set.rs"]
mod tests;
