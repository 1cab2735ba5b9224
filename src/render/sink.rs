use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::PixelBuffer;
use crate::foundation::error::{NoiseError, NoiseResult};

/// One render request: a composited frame plus the background it was composited over.
#[derive(Clone, Debug)]
pub struct PresentedFrame {
    /// Frame-set slot the noise layer came from.
    pub slot: usize,
    /// Noise layer blended over the background, at the background's extent.
    pub frame: Arc<PixelBuffer>,
    /// Background layer the frame was blended over.
    pub background: Arc<PixelBuffer>,
}

/// Consumer of presented frames, i.e. whatever puts pixels on a display.
///
/// Called from the scheduler context only, one frame at a time.
pub trait RenderSink: Send {
    /// Show `frame`. Errors are logged by the scheduler thread and returned from
    /// [`NoiseEngine::render_now`](crate::NoiseEngine::render_now).
    fn present(&mut self, frame: &PresentedFrame) -> NoiseResult<()>;
}

impl<S: RenderSink + ?Sized> RenderSink for Box<S> {
    fn present(&mut self, frame: &PresentedFrame) -> NoiseResult<()> {
        (**self).present(frame)
    }
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    /// Frames in presentation order.
    pub frames: Vec<PresentedFrame>,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot indices in presentation order.
    pub fn slots(&self) -> Vec<usize> {
        self.frames.iter().map(|f| f.slot).collect()
    }
}

impl RenderSink for InMemorySink {
    fn present(&mut self, frame: &PresentedFrame) -> NoiseResult<()> {
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// Sink that shares an [`InMemorySink`] with the caller, so frames presented from the scheduler
/// thread can be inspected while the engine owns the sink.
#[derive(Clone, Debug, Default)]
pub struct SharedSink {
    inner: Arc<std::sync::Mutex<InMemorySink>>,
}

impl SharedSink {
    /// Empty shared sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames presented so far.
    pub fn len(&self) -> usize {
        self.lock().frames.len()
    }

    /// Whether nothing was presented yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot indices in presentation order.
    pub fn slots(&self) -> Vec<usize> {
        self.lock().slots()
    }

    /// Every presented frame in presentation order.
    pub fn frames(&self) -> Vec<PresentedFrame> {
        self.lock().frames.clone()
    }

    /// Most recently presented frame.
    pub fn last(&self) -> Option<PresentedFrame> {
        self.lock().frames.last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemorySink> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl RenderSink for SharedSink {
    fn present(&mut self, frame: &PresentedFrame) -> NoiseResult<()> {
        self.lock().present(frame)
    }
}

/// Writes every presented frame as `frame_XXXX.png` into a directory.
///
/// Files are numbered by presentation order, not by slot.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    written: usize,
}

impl PngSequenceSink {
    /// Create `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> NoiseResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create output dir '{}'", dir.display()))?;
        Ok(Self { dir, written: 0 })
    }

    /// Directory frames are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of files written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    fn path_for(&self, n: usize) -> PathBuf {
        self.dir.join(format!("frame_{n:04}.png"))
    }
}

impl RenderSink for PngSequenceSink {
    fn present(&mut self, frame: &PresentedFrame) -> NoiseResult<()> {
        let path = self.path_for(self.written);
        write_png(&path, &frame.frame)?;
        self.written += 1;
        Ok(())
    }
}

/// Encode a premultiplied buffer as a straight-alpha RGBA PNG.
pub fn write_png(path: &Path, buffer: &PixelBuffer) -> NoiseResult<()> {
    let straight = unpremultiply(buffer.data());
    image::save_buffer_with_format(
        path,
        &straight,
        buffer.width(),
        buffer.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
    .map_err(NoiseError::from)
}

/// Premultiplied RGBA8 to straight RGBA8.
pub fn unpremultiply(premul: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(premul.len());
    for px in premul.chunks_exact(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            out.extend_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        for &c in &px[..3] {
            let v = (u16::from(c) * 255 + a / 2) / a;
            out.push(v.min(255) as u8);
        }
        out.push(px[3]);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/sink.rs"]
mod tests;
