//! Scheduling state guarded by the controller's lock.
//!
//! Every change to the active count and the queue goes through these methods
//! while the caller holds the mutex. Nothing here blocks or calls out; the
//! caller starts or rejects the returned tasks after releasing the lock.

use super::queue::{Prioritization, TaskQueue};

/// Decision for one submission.
#[derive(Debug)]
pub(crate) enum Admission<T> {
    /// A slot was reserved; start the task.
    Start(T),
    /// No slot free; the task is now in the queue.
    Queued { queued: usize },
    /// Controller is shut down; complete the task with a failure.
    Rejected(T),
}

#[derive(Debug)]
pub(crate) struct Schedule<T> {
    max_active: usize,
    active: usize,
    queue: TaskQueue<T>,
    closed: bool,
}

impl<T> Schedule<T> {
    pub(crate) fn new(max_active: usize, prioritization: Prioritization) -> Self {
        Self {
            max_active: max_active.max(1),
            active: 0,
            queue: TaskQueue::new(prioritization),
            closed: false,
        }
    }

    pub(crate) fn admit(&mut self, task: T) -> Admission<T> {
        if self.closed {
            return Admission::Rejected(task);
        }
        if self.active < self.max_active {
            self.active += 1;
            return Admission::Start(task);
        }
        self.queue.enqueue(task);
        Admission::Queued {
            queued: self.queue.len(),
        }
    }

    /// Free the slot of a finished task and, if there is room, reserve it for
    /// the next queued task.
    pub(crate) fn release(&mut self) -> Option<T> {
        self.active = self.active.saturating_sub(1);
        if self.closed || self.active >= self.max_active {
            return None;
        }
        let next = self.queue.dequeue()?;
        self.active += 1;
        Some(next)
    }

    /// Stop admitting work and hand back everything still queued.
    pub(crate) fn close(&mut self) -> Vec<T> {
        self.closed = true;
        self.queue.drain()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn active(&self) -> usize {
        self.active
    }

    pub(crate) fn queued(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn max_active(&self) -> usize {
        self.max_active
    }

    pub(crate) fn prioritization(&self) -> Prioritization {
        self.queue.prioritization()
    }
}
