//! Starting promoted tasks without growing the stack.
//!
//! A promoted task may finish inside its own `start`, and that completion
//! promotes the next one. Run naively, a queue of synchronous operations nests
//! one `start` per queued task. Instead the first promotion on a thread becomes
//! the drain loop, and promotions made while it runs are appended to a
//! thread-local list that the loop works through in order.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::task::QueuedTask;

use super::Shared;

struct Promotion {
    task: QueuedTask,
    controller: Arc<Shared>,
}

impl Promotion {
    fn run(self) {
        tracing::debug!(task = %self.task.id(), "promoting queued task");
        self.task.run(self.controller);
    }
}

thread_local! {
    /// `Some` while a drain loop is running on this thread.
    static PROMOTIONS: RefCell<Option<VecDeque<Promotion>>> = RefCell::new(None);
}

/// Start `task`, whose slot is already reserved on `controller`.
///
/// Returns once `task` and every task promoted in the meantime on this thread
/// have been started. When called from inside a running drain the task is
/// handed to that loop instead.
pub(super) fn start(controller: &Arc<Shared>, task: QueuedTask) {
    let promotion = Promotion {
        task,
        controller: Arc::clone(controller),
    };
    let first = PROMOTIONS.with(|cell| {
        let mut pending = cell.borrow_mut();
        match pending.as_mut() {
            Some(queue) => {
                queue.push_back(promotion);
                None
            }
            None => {
                *pending = Some(VecDeque::new());
                Some(promotion)
            }
        }
    });
    let Some(first) = first else {
        return;
    };

    let drain = Drain;
    first.run();
    while let Some(next) = Drain::pop() {
        next.run();
    }
    drop(drain);
}

/// Ends the drain on this thread. If a handler panicked mid-drain, tasks that
/// already hold a slot are still started before the list is cleared.
struct Drain;

impl Drain {
    fn pop() -> Option<Promotion> {
        PROMOTIONS.with(|cell| cell.borrow_mut().as_mut().and_then(VecDeque::pop_front))
    }
}

impl Drop for Drain {
    fn drop(&mut self) {
        while let Some(next) = Self::pop() {
            next.run();
        }
        PROMOTIONS.with(|cell| cell.borrow_mut().take());
    }
}
