//! Failure payload delivered to a task's failure handler.

use thiserror::Error;

/// Boxed error from a transport collaborator, forwarded verbatim.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a task completed with `Outcome::Failure`.
///
/// The admission controller only ever produces `Abandoned` and `Shutdown`
/// itself; everything else comes from the transport or the decoder.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Network-level failure reported by the transport.
    #[error("transport failed: {0}")]
    Transport(#[source] BoxError),
    /// Response arrived but with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Response body could not be turned into the requested payload.
    #[error("decode failed: {0}")]
    Decode(String),
    /// The operation dropped its completion without finishing it.
    #[error("task dropped by transport without completing")]
    Abandoned,
    /// The controller was shut down before the task could start.
    #[error("admission controller shut down")]
    Shutdown,
}

impl TaskError {
    /// Wrap any error as a transport failure.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        TaskError::Transport(err.into())
    }
}

impl From<curl::Error> for TaskError {
    fn from(err: curl::Error) -> Self {
        TaskError::Transport(Box::new(err))
    }
}

/// Result type carried by a task's completion.
pub type TaskResult<T> = Result<T, TaskError>;
