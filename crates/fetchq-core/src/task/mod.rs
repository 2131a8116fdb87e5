//! Task abstraction: one pending download and its one-shot completion.
//!
//! A task wraps an [`Operation`] (the capability the transport hands us) plus
//! the caller's success and failure handlers. It moves through
//! `Queued -> Active -> Completed` and is observable through a [`TaskHandle`].

mod completion;
mod error;

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::admission::Shared;

pub use completion::Completion;
pub use error::{BoxError, TaskError, TaskResult};

/// A startable unit of work supplied by a transport collaborator.
///
/// `start` must eventually finish `completion` (or drop it, which reports
/// [`TaskError::Abandoned`]). It may hand the completion to another thread.
pub trait Operation: Send + 'static {
    /// Payload handed to the success handler.
    type Output: Send + 'static;

    /// Begin the operation.
    fn start(self: Box<Self>, completion: Completion<Self::Output>);
}

/// Identifier assigned by the controller at submission, unique per controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which handler a finished task went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// Lifecycle of a task as seen through its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Active,
    Completed(Outcome),
}

impl Outcome {
    pub(crate) fn of<T>(result: &TaskResult<T>) -> Self {
        match result {
            Ok(_) => Outcome::Success,
            Err(_) => Outcome::Failure,
        }
    }
}

impl TaskState {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskState::Completed(_))
    }
}

/// Caller-side view of a submitted task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    state: watch::Receiver<TaskState>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Current state (snapshot).
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.state().is_completed()
    }

    /// Wait until the task has completed and return its outcome.
    ///
    /// If the task record is dropped unfinished (controller discarded while
    /// the task was still queued) this resolves to `Outcome::Failure`.
    pub async fn finished(&self) -> Outcome {
        let mut rx = self.state.clone();
        // Err only means the sender is gone; the last value is still readable.
        let _ = rx.wait_for(TaskState::is_completed).await;
        let state = *rx.borrow();
        match state {
            TaskState::Completed(outcome) => outcome,
            TaskState::Queued | TaskState::Active => Outcome::Failure,
        }
    }
}

/// Caller-supplied handlers; exactly one of them runs, once.
pub(crate) struct Handlers<T> {
    on_success: Box<dyn FnOnce(T) + Send>,
    on_failure: Box<dyn FnOnce(TaskError) + Send>,
}

impl<T> Handlers<T> {
    pub(crate) fn deliver(self, result: TaskResult<T>) {
        match result {
            Ok(value) => (self.on_success)(value),
            Err(err) => (self.on_failure)(err),
        }
    }
}

/// Type-erased task as held by the queue.
pub(crate) trait Runnable: Send {
    fn id(&self) -> TaskId;

    /// Mark active and hand the operation its completion. Called outside the
    /// scheduling lock, after the slot was reserved.
    fn run(self: Box<Self>, controller: Arc<Shared>);

    /// Complete without starting (shutdown drain or submission after shutdown).
    fn reject(self: Box<Self>, err: TaskError);
}

pub(crate) type QueuedTask = Box<dyn Runnable>;

pub(crate) struct Task<O: Operation> {
    id: TaskId,
    operation: Box<O>,
    handlers: Handlers<O::Output>,
    state: watch::Sender<TaskState>,
}

impl<O: Operation> Task<O> {
    pub(crate) fn new<S, F>(
        id: TaskId,
        operation: O,
        on_success: S,
        on_failure: F,
    ) -> (Self, TaskHandle)
    where
        S: FnOnce(O::Output) + Send + 'static,
        F: FnOnce(TaskError) + Send + 'static,
    {
        let (tx, rx) = watch::channel(TaskState::Queued);
        let task = Task {
            id,
            operation: Box::new(operation),
            handlers: Handlers {
                on_success: Box::new(on_success),
                on_failure: Box::new(on_failure),
            },
            state: tx,
        };
        (task, TaskHandle { id, state: rx })
    }
}

impl<O: Operation> Runnable for Task<O> {
    fn id(&self) -> TaskId {
        self.id
    }

    fn run(self: Box<Self>, controller: Arc<Shared>) {
        let Task {
            id,
            operation,
            handlers,
            state,
        } = *self;
        state.send_replace(TaskState::Active);
        tracing::debug!(task = %id, "task started");
        operation.start(Completion::new(id, handlers, state, controller));
    }

    fn reject(self: Box<Self>, err: TaskError) {
        let Task {
            id,
            handlers,
            state,
            ..
        } = *self;
        tracing::debug!(task = %id, error = %err, "task rejected before start");
        handlers.deliver(Err(err));
        state.send_replace(TaskState::Completed(Outcome::Failure));
    }
}
