use std::sync::{Mutex, PoisonError, mpsc};

/// Identifier of one generation job; increases with every job an engine starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job#{}", self.0)
    }
}

/// One progress notification.
///
/// `fraction` is `Some(i / n)` after slot `i` of `n` was written (so always in `[0, 1)`), and
/// `None` exactly once per job when it completes, is cancelled, or fails.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressEvent {
    /// Job the event belongs to.
    pub job: JobId,
    /// Completed fraction, or `None` for the terminal event.
    pub fraction: Option<f32>,
}

impl ProgressEvent {
    /// Whether this is the job's final event.
    pub fn is_terminal(&self) -> bool {
        self.fraction.is_none()
    }
}

type Listener = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Fan-out of progress events to any number of subscribers.
///
/// Owned by an engine instance; there is no process-wide progress state. Subscribers that have
/// dropped their receiver are pruned on the next publish. Listeners are called synchronously on
/// the publishing thread and live as long as the hub.
#[derive(Default)]
pub struct ProgressHub {
    subscribers: Mutex<Vec<mpsc::Sender<ProgressEvent>>>,
    listeners: Mutex<Vec<Listener>>,
}

impl std::fmt::Debug for ProgressHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressHub")
            .field("subscribers", &self.subscriber_count())
            .field(
                "listeners",
                &self
                    .listeners
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len(),
            )
            .finish()
    }
}

impl ProgressHub {
    /// Hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Receiver of every event published from now on.
    pub fn subscribe(&self) -> mpsc::Receiver<ProgressEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Call `listener` with every event published from now on. Must not publish to this hub.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// Deliver `event` to every live subscriber and listener.
    pub fn publish(&self, event: ProgressEvent) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|tx| tx.send(event).is_ok());
        for listener in self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            listener(event);
        }
    }

    /// Number of subscribers not yet pruned.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/job/progress.rs"]
mod tests;
