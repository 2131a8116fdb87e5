//! fetchq core: an admission-controlled download queue.
//!
//! [`admission::AdmissionController`] bounds how many downloads run at once
//! and queues the rest (FIFO or LIFO). [`transport::CurlTransport`] provides
//! the HTTP operations it schedules; anything implementing
//! [`task::Operation`] can be scheduled the same way.

pub mod config;
pub mod logging;

pub mod admission;
pub mod task;
pub mod transport;

pub use admission::{AdmissionController, AdmissionStats, Prioritization};
pub use task::{Completion, Operation, Outcome, TaskError, TaskHandle, TaskId, TaskState};
