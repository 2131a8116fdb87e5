//! One-shot completion token handed to a started operation.

use std::sync::Arc;

use tokio::sync::watch;

use crate::admission::Shared;

use super::{Handlers, Outcome, TaskError, TaskId, TaskResult, TaskState};

/// Reports the result of a started operation back to the controller.
///
/// Consumed by [`finish`](Completion::finish), so a task can complete at most
/// once. Dropping it unfinished completes the task with
/// [`TaskError::Abandoned`] and frees its slot.
pub struct Completion<T> {
    id: TaskId,
    pending: Option<Pending<T>>,
}

struct Pending<T> {
    handlers: Handlers<T>,
    state: watch::Sender<TaskState>,
    controller: Arc<Shared>,
}

impl<T> Completion<T> {
    pub(crate) fn new(
        id: TaskId,
        handlers: Handlers<T>,
        state: watch::Sender<TaskState>,
        controller: Arc<Shared>,
    ) -> Self {
        Self {
            id,
            pending: Some(Pending {
                handlers,
                state,
                controller,
            }),
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Deliver the result to the matching handler, then let the controller
    /// release the slot and start the next queued task.
    pub fn finish(mut self, result: TaskResult<T>) {
        if let Some(pending) = self.pending.take() {
            pending.finish(self.id, result);
        }
    }

    pub fn succeed(self, value: T) {
        self.finish(Ok(value));
    }

    pub fn fail(self, err: TaskError) {
        self.finish(Err(err));
    }
}

impl<T> Pending<T> {
    fn finish(self, id: TaskId, result: TaskResult<T>) {
        let Pending {
            handlers,
            state,
            controller,
        } = self;
        // Handlers run before the scheduling lock is taken; the slot is
        // released when the guard drops, even if a handler panics.
        let _release = SlotRelease {
            id,
            outcome: Outcome::of(&result),
            state,
            controller,
        };
        handlers.deliver(result);
    }
}

/// Marks the task completed and hands its slot back to the controller.
struct SlotRelease {
    id: TaskId,
    outcome: Outcome,
    state: watch::Sender<TaskState>,
    controller: Arc<Shared>,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        self.state.send_replace(TaskState::Completed(self.outcome));
        self.controller.on_completion(self.id, self.outcome);
    }
}

impl<T> Drop for Completion<T> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::warn!(task = %self.id, "completion dropped without a result");
            pending.finish(self.id, Err(TaskError::Abandoned));
        }
    }
}
