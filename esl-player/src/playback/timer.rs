//! Scoped timers
//!
//! Every controller wait is a spawned tokio task owned by a [`ScopedTimer`].
//! Dropping the timer aborts the task, so replacing or clearing a
//! [`TimerSlot`] cancels whatever it held.
//!
//! Abort only takes effect at the task's next await point. A task that has
//! already woken and is queued on the controller lock can still get in, so
//! each slot also hands out a generation number: the task re-checks
//! [`TimerSlot::is_current`] after locking and bails when superseded.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

/// A spawned timer task that is aborted on drop
#[derive(Debug)]
pub struct ScopedTimer {
    handle: Option<JoinHandle<()>>,
    label: &'static str,
}

impl ScopedTimer {
    /// Spawn `task` immediately
    pub fn spawn<F>(label: &'static str, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: Some(tokio::spawn(task)),
            label,
        }
    }

    /// Spawn `task` to run after `delay`
    pub fn after<F>(label: &'static str, delay: Duration, task: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self::spawn(label, async move {
            tokio::time::sleep(delay).await;
            task.await;
        })
    }

    /// Let the task run to completion without being aborted
    pub fn detach(mut self) {
        self.handle.take();
    }

    /// Whether the task has finished
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                trace!("Cancelling {} timer", self.label);
            }
            handle.abort();
        }
    }
}

/// Holder for at most one live timer of a given kind
#[derive(Debug, Default)]
pub struct TimerSlot {
    timer: Option<ScopedTimer>,
    generation: u64,
}

impl TimerSlot {
    /// Cancel the current timer and install a new one
    ///
    /// `make` receives the generation the new timer must present to
    /// [`is_current`](Self::is_current) / [`release`](Self::release).
    pub fn arm(&mut self, make: impl FnOnce(u64) -> ScopedTimer) {
        self.cancel();
        self.timer = Some(make(self.generation));
    }

    /// Cancel the current timer; true if one was armed
    pub fn cancel(&mut self) -> bool {
        self.generation = self.generation.wrapping_add(1);
        self.timer.take().is_some()
    }

    /// Whether a timer is installed
    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Whether `generation` is the installed timer
    pub fn is_current(&self, generation: u64) -> bool {
        self.timer.is_some() && self.generation == generation
    }

    /// Called by a firing timer: uninstall it without aborting its task
    ///
    /// Returns false when `generation` was superseded, in which case the
    /// caller must not act.
    pub fn release(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        if let Some(timer) = self.timer.take() {
            timer.detach();
        }
        true
    }
}
