use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, trace, warn};

use crate::foundation::error::{NoiseError, NoiseResult};
use crate::render::pipeline::ComposedFrames;

#[derive(Debug, Default)]
struct ComposeState {
    target: Option<Arc<ComposedFrames>>,
    /// Set by every wake-up; cleared when the worker starts a pass.
    pending: bool,
    shutdown: bool,
    /// Bumped on every target change so a pass over a stale target stops early.
    epoch: u64,
}

#[derive(Debug, Default)]
struct ComposeShared {
    state: Mutex<ComposeState>,
    wake: Condvar,
}

impl ComposeShared {
    fn lock(&self) -> MutexGuard<'_, ComposeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wake(&self) {
        self.lock().pending = true;
        self.wake.notify_all();
    }
}

/// Handle that asks a [`ComposeWorker`] to look for newly ready slots.
#[derive(Clone, Debug)]
pub struct ComposeWaker(Arc<ComposeShared>);

impl ComposeWaker {
    /// Request a pass over the current target.
    pub fn wake(&self) {
        self.0.wake();
    }
}

/// Background thread that fills a [`ComposedFrames`] cache ahead of the scheduler.
///
/// Each wake-up runs one pass compositing every ready slot of the current target. Wake it
/// whenever a slot is written (see [`ComposeWorker::waker`]) so composites are ready before the
/// scheduler reaches them.
pub struct ComposeWorker {
    shared: Arc<ComposeShared>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ComposeWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposeWorker")
            .field("state", &*self.shared.lock())
            .field("running", &self.thread.is_some())
            .finish()
    }
}

impl ComposeWorker {
    /// Start an idle worker thread.
    pub fn spawn() -> NoiseResult<Self> {
        let shared = Arc::new(ComposeShared::default());
        let worker = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("noisewall-compose".to_string())
            .spawn(move || run_worker(&worker))
            .map_err(|e| NoiseError::render(format!("spawn compose thread: {e}")))?;
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Replace the cache being filled and start a pass over it. `None` idles the worker.
    pub fn set_target(&self, target: Option<Arc<ComposedFrames>>) {
        let mut state = self.shared.lock();
        state.target = target;
        state.pending = true;
        state.epoch = state.epoch.wrapping_add(1);
        self.shared.wake.notify_all();
    }

    /// Cloneable handle for waking the worker from other threads.
    pub fn waker(&self) -> ComposeWaker {
        ComposeWaker(Arc::clone(&self.shared))
    }

    /// Stop the thread and join it. Idempotent.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
            state.target = None;
            self.shared.wake.notify_all();
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("compose thread panicked");
        }
    }
}

impl Drop for ComposeWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(shared: &ComposeShared) {
    debug!("compositor started");
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            break;
        }
        if !state.pending {
            state = shared
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        }
        state.pending = false;
        let Some(target) = state.target.clone() else {
            continue;
        };
        let epoch = state.epoch;
        drop(state);

        let pass = catch_unwind(AssertUnwindSafe(|| {
            target.compose_ready(|| {
                let state = shared.lock();
                !state.shutdown && state.epoch == epoch
            })
        }));
        match pass {
            Ok(composed) => trace!(composed, "compose pass"),
            Err(_) => warn!("compose pass panicked"),
        }
        state = shared.lock();
    }
    debug!("compositor stopped");
}

#[cfg(test)]
#[path = "../../tests/unit/render/composer.rs"]
mod tests;
