use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::settings::Configuration;
use crate::foundation::core::{Extent, PixelBuffer};
use crate::foundation::error::{NoiseError, NoiseResult};
use crate::frames::frame_set::FrameSet;
use crate::job::cancel::CancellationToken;
use crate::job::plan::GenerationPlan;
use crate::job::progress::{JobId, ProgressEvent, ProgressHub};
use crate::noise::synth::NoiseSynthesizer;

/// Lifecycle of a generation job.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobState {
    /// No job has been started.
    #[default]
    Idle,
    /// The worker is still filling slots.
    Running,
    /// Every slot was written.
    Completed,
    /// Stopped early, either on request or because generating a slot failed.
    Cancelled,
}

#[derive(Debug)]
struct JobStatus {
    state: JobState,
    terminal_sent: bool,
}

/// State shared between a job handle and its worker thread.
///
/// Slot writes, progress increments and cancellation all happen under `status`, which is what
/// guarantees that nothing is written or reported once `cancel` has returned.
struct JobShared {
    id: JobId,
    token: CancellationToken,
    status: Mutex<JobStatus>,
    hub: Arc<ProgressHub>,
}

impl JobShared {
    fn lock(&self) -> MutexGuard<'_, JobStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_terminal(&self, status: &mut JobStatus) {
        if !status.terminal_sent {
            status.terminal_sent = true;
            self.hub.publish(ProgressEvent {
                job: self.id,
                fraction: None,
            });
        }
    }

    fn settle(&self, status: &mut JobStatus, state: JobState) {
        if status.state == JobState::Running {
            status.state = state;
        }
        self.publish_terminal(status);
    }
}

/// Handle to one background job filling a [`FrameSet`] slot by slot.
///
/// Dropping the handle cancels the job and joins its worker.
pub struct GenerationJob {
    shared: Arc<JobShared>,
    frames: Arc<FrameSet>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for GenerationJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationJob")
            .field("id", &self.shared.id)
            .field("state", &self.state())
            .field("frames", &self.frames)
            .finish()
    }
}

impl GenerationJob {
    /// Start filling `frames` according to `plan` on a dedicated worker thread.
    ///
    /// Noise synthesis inside each slot runs on `pool`.
    pub fn spawn(
        id: JobId,
        plan: GenerationPlan,
        frames: Arc<FrameSet>,
        synth: NoiseSynthesizer,
        pool: Arc<rayon::ThreadPool>,
        hub: Arc<ProgressHub>,
    ) -> NoiseResult<Self> {
        let shared = Arc::new(JobShared {
            id,
            token: CancellationToken::new(),
            status: Mutex::new(JobStatus {
                state: JobState::Running,
                terminal_sent: false,
            }),
            hub,
        });

        let worker_shared = Arc::clone(&shared);
        let worker_frames = Arc::clone(&frames);
        let handle = std::thread::Builder::new()
            .name(format!("noisewall-gen-{}", id.0))
            .spawn(move || run_job(&worker_shared, &plan, &worker_frames, &synth, &pool))
            .map_err(|e| NoiseError::generation(format!("spawn worker for {id}: {e}")))?;

        Ok(Self {
            shared,
            frames,
            handle: Some(handle),
        })
    }

    /// Identifier carried by this job's progress events.
    pub fn id(&self) -> JobId {
        self.shared.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        self.shared.lock().state
    }

    /// Frame set this job writes into.
    pub fn frames(&self) -> &Arc<FrameSet> {
        &self.frames
    }

    /// Request cooperative cancellation.
    ///
    /// The worker stops at its next slot boundary. Once this returns the job writes no further
    /// slots and reports no further progress; the terminal event is sent here if the job was
    /// still running.
    pub fn cancel(&self) {
        let mut status = self.shared.lock();
        if self.shared.token.cancel() && status.state == JobState::Running {
            debug!(job = %self.shared.id, "cancellation requested");
            self.shared.publish_terminal(&mut status);
        }
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Block until the worker exits and return the final state.
    pub fn wait(&mut self) -> NoiseResult<JobState> {
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| {
                NoiseError::generation(format!("{} worker thread panicked", self.shared.id))
            })?;
        }
        Ok(self.state())
    }
}

impl Drop for GenerationJob {
    fn drop(&mut self) {
        self.cancel();
        let _ = self.wait();
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(job = %shared.id, slots = frames.len()))]
fn run_job(
    shared: &JobShared,
    plan: &GenerationPlan,
    frames: &FrameSet,
    synth: &NoiseSynthesizer,
    pool: &rayon::ThreadPool,
) {
    let started = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        fill_slots(shared, plan, frames, synth, pool)
    }));

    let mut status = shared.lock();
    match outcome {
        Ok(Ok(JobState::Completed)) => {
            debug!(elapsed = ?started.elapsed(), "generation complete");
            shared.settle(&mut status, JobState::Completed);
        }
        Ok(Ok(state)) => {
            debug!(written = frames.ready_count(), "cancellation observed");
            shared.settle(&mut status, state);
        }
        Ok(Err(err)) => {
            warn!(error = %err, written = frames.ready_count(), "generation aborted");
            shared.settle(&mut status, JobState::Cancelled);
        }
        Err(_) => {
            warn!(written = frames.ready_count(), "generation panicked");
            shared.settle(&mut status, JobState::Cancelled);
        }
    }
}

fn fill_slots(
    shared: &JobShared,
    plan: &GenerationPlan,
    frames: &FrameSet,
    synth: &NoiseSynthesizer,
    pool: &rayon::ThreadPool,
) -> NoiseResult<JobState> {
    let total = frames.len();
    for slot in 0..total {
        if shared.token.is_cancelled() {
            return Ok(JobState::Cancelled);
        }
        let frame = pool.install(|| plan.render_slot(synth, slot))?;

        let _status = shared.lock();
        if shared.token.is_cancelled() {
            return Ok(JobState::Cancelled);
        }
        frames.fill(slot, frame)?;
        shared.hub.publish(ProgressEvent {
            job: shared.id,
            fraction: Some(slot as f32 / total as f32),
        });
    }
    Ok(JobState::Completed)
}

/// Build the rayon pool noise synthesis runs on. `None` uses rayon's default thread count.
pub fn build_thread_pool(threads: Option<usize>) -> NoiseResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(NoiseError::validation("worker_threads must be >= 1 when set"));
    }

    let mut builder = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("noisewall-synth-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| NoiseError::generation(format!("failed to build rayon thread pool: {e}")))
}

/// Owner of the single active generation job.
///
/// Starting a job cancels the previous one first. Superseded jobs are not joined on the calling
/// thread; they finish their current slot in the background and are reaped on a later start or on
/// shutdown.
pub struct FrameGenerator {
    synth: NoiseSynthesizer,
    pool: Arc<rayon::ThreadPool>,
    hub: Arc<ProgressHub>,
    seed: Option<u64>,
    next_id: u64,
    active: Option<GenerationJob>,
    retired: Vec<GenerationJob>,
}

impl std::fmt::Debug for FrameGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameGenerator")
            .field("active", &self.active)
            .field("retired", &self.retired.len())
            .field("seed", &self.seed)
            .finish()
    }
}

impl FrameGenerator {
    /// Generator publishing to `hub` with `worker_threads` synthesis threads, or one per core
    /// for `None`.
    ///
    /// Fails when `worker_threads` is `Some(0)` or the pool cannot be built.
    pub fn new(
        hub: Arc<ProgressHub>,
        worker_threads: Option<usize>,
        seed: Option<u64>,
    ) -> NoiseResult<Self> {
        let pool = build_thread_pool(worker_threads)?;
        let synth = match worker_threads {
            Some(n) => NoiseSynthesizer::with_partitions(n),
            None => NoiseSynthesizer::new(),
        };
        Ok(Self {
            synth,
            pool: Arc::new(pool),
            hub,
            seed,
            next_id: 0,
            active: None,
            retired: Vec::new(),
        })
    }

    /// Cancel any running job, allocate a fresh frame set for `config` at `surface`, and start
    /// filling it. Returns the new (still empty) frame set.
    #[tracing::instrument(level = "debug", skip(self, config), fields(fps = config.fps, loop_seconds = config.loop_seconds))]
    pub fn start(&mut self, config: &Configuration, surface: Extent) -> NoiseResult<Arc<FrameSet>> {
        let plan = GenerationPlan::new(config, surface, self.seed)?;
        if let Some(previous) = self.active.take() {
            previous.cancel();
            self.retired.push(previous);
        }
        self.retired.retain(|job| !job.is_finished());

        let frames = Arc::new(FrameSet::new(plan.total_frames, plan.frame_extent)?);
        self.next_id += 1;
        let id = JobId(self.next_id);
        let job = GenerationJob::spawn(
            id,
            plan,
            Arc::clone(&frames),
            self.synth.clone(),
            Arc::clone(&self.pool),
            Arc::clone(&self.hub),
        )?;
        debug!(job = %id, slots = plan.total_frames, extent = ?plan.frame_extent, "generation started");
        self.active = Some(job);
        Ok(frames)
    }

    /// Cancel the active job, if any. Its frame set keeps the slots already written.
    pub fn cancel(&self) {
        if let Some(job) = &self.active {
            job.cancel();
        }
    }

    /// State of the most recently started job; [`JobState::Idle`] before the first start.
    pub fn state(&self) -> JobState {
        self.active.as_ref().map_or(JobState::Idle, GenerationJob::state)
    }

    /// Identifier of the most recently started job.
    pub fn active_id(&self) -> Option<JobId> {
        self.active.as_ref().map(GenerationJob::id)
    }

    /// Block until the active job stops and return its final state.
    pub fn wait(&mut self) -> NoiseResult<JobState> {
        match self.active.as_mut() {
            Some(job) => job.wait(),
            None => Ok(JobState::Idle),
        }
    }

    /// Synthesize one slot synchronously on the generator's pool, bypassing any frame set.
    pub fn render_slot(
        &self,
        config: &Configuration,
        surface: Extent,
        slot: usize,
    ) -> NoiseResult<PixelBuffer> {
        let plan = GenerationPlan::new(config, surface, self.seed)?;
        if slot >= plan.total_frames {
            return Err(NoiseError::invalid_argument(format!(
                "slot {slot} out of range for {} frames",
                plan.total_frames
            )));
        }
        self.pool.install(|| plan.render_slot(&self.synth, slot))
    }

    /// Cancel everything and join every worker.
    pub fn shutdown(&mut self) {
        self.cancel();
        for job in self.active.iter_mut().chain(self.retired.iter_mut()) {
            if let Err(err) = job.wait() {
                warn!(error = %err, "generation worker did not exit cleanly");
            }
        }
        self.retired.clear();
    }
}

impl Drop for FrameGenerator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/generation.rs"]
mod tests;
