//! Admission control for download tasks.
//!
//! Bounds how many tasks run at once. A submission either takes a free slot
//! and starts immediately or waits in the queue; each completion frees its
//! slot and promotes the next queued task according to the configured
//! [`Prioritization`].
//!
//! All bookkeeping happens under one mutex. Operations are started and
//! handlers are run after the lock is released, so a slow handler or a
//! transport that completes synchronously never holds up other callers.

mod promote;
mod queue;
mod schedule;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::FetchqConfig;
use crate::task::{Operation, Outcome, QueuedTask, Task, TaskError, TaskHandle, TaskId};

use schedule::{Admission, Schedule};

pub use queue::{ParsePrioritizationError, Prioritization};

/// Default concurrency ceiling.
pub const DEFAULT_MAX_ACTIVE_DOWNLOADS: usize = 4;

/// Point-in-time view of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionStats {
    /// Tasks started and not yet completed.
    pub active: usize,
    /// Tasks waiting for a slot.
    pub queued: usize,
    pub max_active: usize,
    pub prioritization: Prioritization,
    pub shut_down: bool,
}

/// State shared between the controller and every in-flight completion.
pub(crate) struct Shared {
    schedule: Mutex<Schedule<QueuedTask>>,
    next_id: AtomicU64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Schedule<QueuedTask>> {
        // Nothing panics while the lock is held, so a poisoned guard still
        // holds consistent counts.
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Called once per started task, after its handler ran (or unwound).
    pub(crate) fn on_completion(self: &Arc<Self>, id: TaskId, outcome: Outcome) {
        let (next, active, queued) = {
            let mut schedule = self.lock();
            let next = schedule.release();
            (next, schedule.active(), schedule.queued())
        };
        tracing::debug!(task = %id, ?outcome, active, queued, "task completed");
        if let Some(task) = next {
            promote::start(self, task);
        }
    }
}

/// Admission controller: owns the active count, the concurrency limit and the
/// queue of pending tasks.
///
/// Cloning is cheap and every clone refers to the same controller. In-flight
/// tasks hold a reference too, so the controller stays alive until the last
/// started task completes.
#[derive(Clone)]
pub struct AdmissionController {
    shared: Arc<Shared>,
}

impl AdmissionController {
    /// Create a controller. A `max_active_downloads` of 0 is treated as 1.
    pub fn new(max_active_downloads: usize, prioritization: Prioritization) -> Self {
        Self {
            shared: Arc::new(Shared {
                schedule: Mutex::new(Schedule::new(max_active_downloads, prioritization)),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn from_config(cfg: &FetchqConfig) -> Self {
        Self::new(cfg.max_active_downloads, cfg.prioritization)
    }

    /// Submit an operation. It starts now if a slot is free, otherwise it is
    /// queued. Exactly one of `on_success` / `on_failure` is called, once.
    ///
    /// Never fails; after [`shutdown`](Self::shutdown) the task completes
    /// immediately with [`TaskError::Shutdown`].
    pub fn submit<O, S, F>(&self, operation: O, on_success: S, on_failure: F) -> TaskHandle
    where
        O: Operation,
        S: FnOnce(O::Output) + Send + 'static,
        F: FnOnce(TaskError) + Send + 'static,
    {
        let id = TaskId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let (task, handle) = Task::new(id, operation, on_success, on_failure);

        let admission = self.shared.lock().admit(Box::new(task));
        match admission {
            Admission::Start(task) => {
                tracing::debug!(task = %id, "admitted");
                task.run(Arc::clone(&self.shared));
            }
            Admission::Queued { queued } => {
                tracing::debug!(task = %id, queued, "at capacity, queued");
            }
            Admission::Rejected(task) => {
                tracing::warn!(task = %id, "submitted after shutdown");
                task.reject(TaskError::Shutdown);
            }
        }
        handle
    }

    pub fn stats(&self) -> AdmissionStats {
        let schedule = self.shared.lock();
        AdmissionStats {
            active: schedule.active(),
            queued: schedule.queued(),
            max_active: schedule.max_active(),
            prioritization: schedule.prioritization(),
            shut_down: schedule.is_closed(),
        }
    }

    pub fn max_active_downloads(&self) -> usize {
        self.shared.lock().max_active()
    }

    pub fn prioritization(&self) -> Prioritization {
        self.shared.lock().prioritization()
    }

    /// Stop accepting work and fail every queued task with
    /// [`TaskError::Shutdown`]. Tasks already running finish normally.
    /// Returns how many queued tasks were drained; calling it again drains
    /// nothing.
    pub fn shutdown(&self) -> usize {
        let drained = self.shared.lock().close();
        let count = drained.len();
        for task in drained {
            task.reject(TaskError::Shutdown);
        }
        tracing::info!(drained = count, "admission controller shut down");
        count
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.lock().is_closed()
    }
}

impl Default for AdmissionController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ACTIVE_DOWNLOADS, Prioritization::default())
    }
}

impl fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionController")
            .field("stats", &self.stats())
            .finish()
    }
}
