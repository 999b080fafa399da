//! Timer slots - at most one live background task per timer role

use tokio::task::JoinHandle;

/// Holder for a single periodic or one-shot task.
///
/// Each timer role (lobby poll, round poll, countdown, reveal) owns exactly
/// one slot; replacing the task aborts the previous one first, and the slot
/// aborts its task on drop. This makes cancel-before-start at every view
/// transition structural rather than a convention.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Install a new task, aborting any previous one
    pub fn replace(&mut self, handle: JoinHandle<()>) {
        self.cancel();
        self.handle = Some(handle);
    }

    /// Abort the current task, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
