//! Pending-task queue and its ordering policy.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order in which queued tasks are promoted, fixed when the controller is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prioritization {
    /// Queued tasks start in submission order.
    #[default]
    Fifo,
    /// The most recently queued task starts next.
    Lifo,
}

impl fmt::Display for Prioritization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prioritization::Fifo => write!(f, "fifo"),
            Prioritization::Lifo => write!(f, "lifo"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown prioritization {0:?} (expected \"fifo\" or \"lifo\")")]
pub struct ParsePrioritizationError(String);

impl FromStr for Prioritization {
    type Err = ParsePrioritizationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(Prioritization::Fifo),
            "lifo" => Ok(Prioritization::Lifo),
            _ => Err(ParsePrioritizationError(s.to_string())),
        }
    }
}

/// Ordered container of tasks waiting for a slot.
///
/// Both policies remove from the head; they differ only in where a new task
/// is inserted (tail for FIFO, head for LIFO).
#[derive(Debug)]
pub(crate) struct TaskQueue<T> {
    prioritization: Prioritization,
    items: VecDeque<T>,
}

impl<T> TaskQueue<T> {
    pub(crate) fn new(prioritization: Prioritization) -> Self {
        Self {
            prioritization,
            items: VecDeque::new(),
        }
    }

    pub(crate) fn prioritization(&self) -> Prioritization {
        self.prioritization
    }

    pub(crate) fn enqueue(&mut self, task: T) {
        match self.prioritization {
            Prioritization::Fifo => self.items.push_back(task),
            Prioritization::Lifo => self.items.push_front(task),
        }
    }

    pub(crate) fn dequeue(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Remove every queued task, head first.
    pub(crate) fn drain(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }
}
