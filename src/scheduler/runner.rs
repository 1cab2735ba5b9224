use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::foundation::error::{NoiseError, NoiseResult};

#[derive(Debug)]
struct LoopState {
    visible: bool,
    interval: Duration,
    shutdown: bool,
    /// Bumped on every visibility change so a pending wait is cut short.
    epoch: u64,
}

#[derive(Debug)]
struct LoopShared {
    state: Mutex<LoopState>,
    wake: Condvar,
}

impl LoopShared {
    fn lock(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Periodic tick thread driving the animation.
///
/// While visible it calls the tick callback, then sleeps for the current interval on a condition
/// variable. Hiding parks the thread until it is shown again; showing it wakes the thread and
/// ticks immediately. An interval change takes effect from the next wait.
pub struct TickLoop {
    shared: Arc<LoopShared>,
    thread: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickLoop")
            .field("state", &*self.shared.lock())
            .field("running", &self.thread.is_some())
            .finish()
    }
}

impl TickLoop {
    /// Start the tick thread, calling `on_tick` once per interval while visible.
    pub fn spawn<F>(interval: Duration, visible: bool, mut on_tick: F) -> NoiseResult<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::new(LoopShared {
            state: Mutex::new(LoopState {
                visible,
                interval,
                shutdown: false,
                epoch: 0,
            }),
            wake: Condvar::new(),
        });
        let worker = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("noisewall-scheduler".to_string())
            .spawn(move || run_loop(&worker, &mut on_tick))
            .map_err(|e| NoiseError::render(format!("spawn scheduler thread: {e}")))?;
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Show or hide the loop. Either change cuts the current wait short.
    pub fn set_visible(&self, visible: bool) {
        let mut state = self.shared.lock();
        state.visible = visible;
        state.epoch = state.epoch.wrapping_add(1);
        self.shared.wake.notify_all();
    }

    /// Whether the loop is ticking.
    pub fn is_visible(&self) -> bool {
        self.shared.lock().visible
    }

    /// Used for the wait after the next tick; an ongoing wait keeps its deadline.
    pub fn set_interval(&self, interval: Duration) {
        self.shared.lock().interval = interval;
    }

    /// Interval used for the next wait.
    pub fn interval(&self) -> Duration {
        self.shared.lock().interval
    }

    /// Stop the thread and join it. Idempotent.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
            self.shared.wake.notify_all();
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!("scheduler thread panicked");
        }
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop<F: FnMut()>(shared: &LoopShared, on_tick: &mut F) {
    debug!("scheduler started");
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            break;
        }
        if !state.visible {
            state = shared
                .wake
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
            continue;
        }

        let epoch = state.epoch;
        drop(state);
        if catch_unwind(AssertUnwindSafe(|| on_tick())).is_err() {
            warn!("render tick panicked");
        }

        state = shared.lock();
        let deadline = Instant::now() + state.interval;
        while !state.shutdown && state.epoch == epoch {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            state = shared
                .wake
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
    debug!("scheduler stopped");
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/runner.rs"]
mod tests;
