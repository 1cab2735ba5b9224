use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tracing::{debug, info, trace, warn};

use crate::composite::blend::BlendMode;
use crate::config::settings::{ConfigEvent, Configuration};
use crate::foundation::core::{Extent, PixelBuffer};
use crate::foundation::error::{NoiseError, NoiseResult};
use crate::frames::frame_set::FrameSet;
use crate::job::generation::{FrameGenerator, JobState};
use crate::job::progress::{ProgressEvent, ProgressHub};
use crate::render::composer::ComposeWorker;
use crate::render::pipeline::{ComposedFrames, build_background};
use crate::render::sink::RenderSink;
use crate::scheduler::animation::AnimationScheduler;
use crate::scheduler::runner::TickLoop;

/// Construction options for [`NoiseEngine`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineOpts {
    /// Makes generated noise reproducible. `None` draws fresh entropy for every frame.
    pub seed: Option<u64>,
    /// Size of the synthesis thread pool. `None` uses one thread per core.
    pub worker_threads: Option<usize>,
    /// Do not spawn the scheduler or compositor threads; the host steps the animation with
    /// [`NoiseEngine::render_now`], which composites each slot on first use.
    pub manual_tick: bool,
}

struct RenderState {
    scheduler: AnimationScheduler,
    background: Option<Arc<PixelBuffer>>,
    blend_mode: BlendMode,
    /// Composites of the current frame set; `None` until a background exists.
    composed: Option<Arc<ComposedFrames>>,
}

impl RenderState {
    /// Start a fresh composite cache for `frames` over the current background and blend mode.
    fn rekey(&mut self, frames: Arc<FrameSet>) -> Option<Arc<ComposedFrames>> {
        self.composed = self
            .background
            .as_ref()
            .map(|bg| Arc::new(ComposedFrames::new(frames, Arc::clone(bg), self.blend_mode)));
        self.composed.clone()
    }
}

/// What the tick thread and the engine handle share.
struct EngineShared {
    frames: RwLock<Arc<FrameSet>>,
    render: Mutex<RenderState>,
    sink: Mutex<Box<dyn RenderSink>>,
}

impl EngineShared {
    fn frames(&self) -> Arc<FrameSet> {
        Arc::clone(&self.frames.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn swap_frames(&self, frames: Arc<FrameSet>) -> Option<Arc<ComposedFrames>> {
        *self.frames.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&frames);
        let mut render = self.render();
        render.scheduler.reset();
        render.rekey(frames)
    }

    fn render(&self) -> MutexGuard<'_, RenderState> {
        self.render.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One scheduler step: pick a slot, fetch its composite, present it.
    ///
    /// Slots the compositor has not reached yet are composited here once and cached.
    fn tick(&self) -> NoiseResult<Option<usize>> {
        let (slot, composed) = {
            let mut render = self.render();
            let Some(composed) = render.composed.clone() else {
                return Ok(None);
            };
            let Some(slot) = render.scheduler.tick(composed.frames()) else {
                return Ok(None);
            };
            (slot, composed)
        };

        let Some(presented) = composed.get_or_compose(slot) else {
            return Ok(None);
        };
        trace!(slot, "present");
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .present(&presented)?;
        Ok(Some(slot))
    }
}

/// Live animated-noise engine.
///
/// Owns the configuration snapshot, the frame generator, the background layer, the compositor
/// thread that caches composited frames and the scheduler thread that presents them to a
/// [`RenderSink`]. Host events (surface size, visibility, configuration changes) are forwarded
/// through the methods below; progress is observed through [`NoiseEngine::subscribe_progress`].
pub struct NoiseEngine {
    config: Configuration,
    surface: Option<Extent>,
    hub: Arc<ProgressHub>,
    generator: FrameGenerator,
    shared: Arc<EngineShared>,
    composer: Option<ComposeWorker>,
    ticker: Option<TickLoop>,
    shut_down: bool,
}

impl std::fmt::Debug for NoiseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseEngine")
            .field("surface", &self.surface)
            .field("generator", &self.generator)
            .field("composer", &self.composer)
            .field("ticker", &self.ticker)
            .field("shut_down", &self.shut_down)
            .finish()
    }
}

impl NoiseEngine {
    /// Create an engine and start its compositor and scheduler threads.
    ///
    /// Nothing is generated until the first [`surface_changed`](Self::surface_changed). The
    /// engine starts visible. With [`EngineOpts::manual_tick`] neither thread is spawned and
    /// frames are composited on first presentation.
    pub fn new<S>(config: Configuration, sink: S, opts: EngineOpts) -> NoiseResult<Self>
    where
        S: RenderSink + 'static,
    {
        let config = config.clamped();
        let hub = Arc::new(ProgressHub::new());
        let generator = FrameGenerator::new(Arc::clone(&hub), opts.worker_threads, opts.seed)?;

        let interval = config.frame_interval();
        let shared = Arc::new(EngineShared {
            frames: RwLock::new(Arc::new(FrameSet::empty())),
            render: Mutex::new(RenderState {
                scheduler: AnimationScheduler::new(interval),
                background: None,
                blend_mode: config.blend_mode,
                composed: None,
            }),
            sink: Mutex::new(Box::new(sink) as Box<dyn RenderSink>),
        });

        let composer = if opts.manual_tick {
            None
        } else {
            let worker = ComposeWorker::spawn()?;
            let waker = worker.waker();
            hub.add_listener(move |_| waker.wake());
            Some(worker)
        };

        let ticker = if opts.manual_tick {
            None
        } else {
            let tick_shared = Arc::clone(&shared);
            Some(TickLoop::spawn(interval, true, move || {
                if let Err(err) = tick_shared.tick() {
                    warn!(error = %err, "render sink failed to present frame");
                }
            })?)
        };

        info!(fps = config.fps, loop_seconds = config.loop_seconds, "engine created");
        Ok(Self {
            config,
            surface: None,
            hub,
            generator,
            shared,
            composer,
            ticker,
            shut_down: false,
        })
    }

    /// Current (clamped) configuration snapshot.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Last surface extent reported by the host.
    pub fn surface(&self) -> Option<Extent> {
        self.surface
    }

    /// Frame set the scheduler is currently reading.
    pub fn frame_set(&self) -> Arc<FrameSet> {
        self.shared.frames()
    }

    /// Background layer at the surface extent, once a surface is known.
    pub fn background(&self) -> Option<Arc<PixelBuffer>> {
        self.shared.render().background.clone()
    }

    /// State of the most recently started generation job.
    pub fn job_state(&self) -> JobState {
        self.generator.state()
    }

    /// New receiver of progress events for every job this engine starts from now on.
    pub fn subscribe_progress(&self) -> Receiver<ProgressEvent> {
        self.hub.subscribe()
    }

    /// Host surface was created or resized.
    ///
    /// Unchanged sizes are ignored. The background is rebuilt for the new size; generation
    /// restarts when the working extent changes (with rotation support a rotated surface keeps
    /// its frames).
    pub fn surface_changed(&mut self, width: u32, height: u32) -> NoiseResult<()> {
        self.ensure_running()?;
        let extent = Extent::new(width, height)?;
        if self.surface == Some(extent) {
            return Ok(());
        }
        let rotation = self.config.rotation_support;
        let previous = self.surface.replace(extent);
        debug!(width, height, "surface changed");

        self.rebuild_background(extent)?;
        if previous.map(|p| p.working(rotation)) != Some(extent.working(rotation)) {
            self.restart_generation(extent)?;
        }
        Ok(())
    }

    /// Apply a configuration change notification.
    ///
    /// The event's snapshot replaces the whole configuration. Only the layers whose inputs
    /// changed are rebuilt: the background for colour or gradient changes, the frame set for
    /// frame-rate, loop, scale, tiling, brightness or rotation changes, and the cached composites
    /// for any of those or a blend mode change. Noise is kept across colour and blend changes.
    /// The frame interval applies from the next tick.
    #[tracing::instrument(skip(self, event), fields(key = %event.key))]
    pub fn reconfigure(&mut self, event: ConfigEvent) -> NoiseResult<()> {
        self.ensure_running()?;
        let next = event.config.clamped();
        let previous = std::mem::replace(&mut self.config, next);

        if previous.fps != self.config.fps {
            let interval = self.config.frame_interval();
            if let Some(ticker) = &self.ticker {
                ticker.set_interval(interval);
            }
            self.shared.render().scheduler.set_frame_interval(interval);
        }
        if previous.blend_mode != self.config.blend_mode {
            debug!(mode = %self.config.blend_mode, "composites invalidated");
            let frames = self.shared.frames();
            let target = {
                let mut render = self.shared.render();
                render.blend_mode = self.config.blend_mode;
                render.rekey(frames)
            };
            self.retarget_composer(target);
        }

        let Some(surface) = self.surface else {
            return Ok(());
        };
        if previous.gradient_params() != self.config.gradient_params() {
            debug!("background invalidated");
            self.rebuild_background(surface)?;
        }
        if previous.noise_params() != self.config.noise_params() {
            debug!("frame set invalidated");
            self.restart_generation(surface)?;
        }
        Ok(())
    }

    /// Host visibility changed. Hidden engines stop ticking; showing renders immediately.
    pub fn visibility_changed(&mut self, visible: bool) {
        if self.shut_down {
            return;
        }
        self.shared.render().scheduler.set_visible(visible);
        if let Some(ticker) = &self.ticker {
            ticker.set_visible(visible);
        }
        debug!(visible, "visibility changed");
    }

    /// Run one scheduler step on the calling thread and return the presented slot, if any.
    pub fn render_now(&self) -> NoiseResult<Option<usize>> {
        self.ensure_running()?;
        self.shared.tick()
    }

    /// Block until the current generation job stops.
    pub fn wait_for_generation(&mut self) -> NoiseResult<JobState> {
        self.generator.wait()
    }

    /// Cancel generation, stop the scheduler thread and release frames. Idempotent.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        if let Some(mut ticker) = self.ticker.take() {
            ticker.shutdown();
        }
        if let Some(mut composer) = self.composer.take() {
            composer.shutdown();
        }
        self.generator.shutdown();
        self.shared.swap_frames(Arc::new(FrameSet::empty()));
        let mut render = self.shared.render();
        render.background = None;
        render.composed = None;
        drop(render);
        info!("engine shut down");
    }

    fn ensure_running(&self) -> NoiseResult<()> {
        if self.shut_down {
            return Err(NoiseError::invalid_argument("engine has been shut down"));
        }
        Ok(())
    }

    fn rebuild_background(&self, surface: Extent) -> NoiseResult<()> {
        let background = build_background(&self.config, surface)?;
        let frames = self.shared.frames();
        let target = {
            let mut render = self.shared.render();
            render.background = Some(Arc::new(background));
            render.rekey(frames)
        };
        self.retarget_composer(target);
        Ok(())
    }

    fn restart_generation(&mut self, surface: Extent) -> NoiseResult<()> {
        let frames = self.generator.start(&self.config, surface)?;
        let target = self.shared.swap_frames(frames);
        self.retarget_composer(target);
        Ok(())
    }

    fn retarget_composer(&self, target: Option<Arc<ComposedFrames>>) {
        if let Some(composer) = &self.composer {
            composer.set_target(target);
        }
    }
}

impl Drop for NoiseEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/noise_engine.rs"]
mod tests;
