use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Outcome of a synchronized wait on the render gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The renderer signalled completion before the deadline
    Completed,
    /// The deadline elapsed without a signal
    TimedOut,
}

/// One-shot gate between the playback loop and the render pipeline
///
/// The loop arms the gate before publishing a date and then waits on it;
/// the pipeline completes it once the visual update for that date is done.
/// A wait resolves on the signal or on its deadline, whichever comes
/// first, so a silent renderer can never stall playback.
pub struct RenderGate {
    completed: AtomicBool,
    notify: Notify,
}

impl RenderGate {
    pub fn new() -> Self {
        Self {
            completed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Reset the gate so only a signal for the upcoming step can open it
    pub fn arm(&self) {
        self.completed.store(false, Ordering::SeqCst);
    }

    /// Signal that the render for the current date is done
    pub fn complete(&self) {
        self.completed.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Suspend until the gate is completed or `limit` elapses
    pub async fn wait(&self, limit: Duration) -> WaitOutcome {
        let deadline = tokio::time::sleep(limit);
        tokio::pin!(deadline);

        loop {
            // Register the waiter before checking the flag so a signal
            // racing this wait is never lost
            let notified = self.notify.notified();
            if self.completed.load(Ordering::SeqCst) {
                return WaitOutcome::Completed;
            }
            tokio::select! {
                _ = &mut deadline => return WaitOutcome::TimedOut,
                _ = notified => {}
            }
        }
    }
}

impl Default for RenderGate {
    fn default() -> Self {
        Self::new()
    }
}
