//! Executor failures and the transport error that task promises reject with.

use super::panic_handler::PanicInfo;
use super::task::TaskInfo;
use crate::error::Error;
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure reported by an [`Executor`](super::Executor), optionally carrying
/// whatever partial result the executor got before failing.
pub struct Failure<O> {
    error: BoxError,
    partial: Option<O>,
}

impl<O> Failure<O> {
    pub fn new<E: Into<BoxError>>(error: E) -> Self {
        Self {
            error: error.into(),
            partial: None,
        }
    }

    pub fn with_partial(mut self, partial: O) -> Self {
        self.partial = Some(partial);
        self
    }

    pub fn error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.error
    }

    pub fn partial(&self) -> Option<&O> {
        self.partial.as_ref()
    }
}

impl<O, E> From<E> for Failure<O>
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Failure::new(err)
    }
}

impl<O> fmt::Debug for Failure<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("error", &self.error)
            .field("has_partial", &self.partial.is_some())
            .finish()
    }
}

impl<O> fmt::Display for Failure<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

/// Rejection reason of a task promise: the executor failed (or panicked)
/// while running the task.
pub struct TransportError<O> {
    task: TaskInfo,
    source: Arc<dyn StdError + Send + Sync + 'static>,
    partial: Option<O>,
}

impl<O> TransportError<O> {
    pub(crate) fn new(task: TaskInfo, failure: Failure<O>) -> Self {
        Self {
            task,
            source: Arc::from(failure.error),
            partial: failure.partial,
        }
    }

    pub(crate) fn from_panic(task: TaskInfo, panic: PanicInfo) -> Self {
        Self {
            task,
            source: Arc::new(Error::from(panic)),
            partial: None,
        }
    }

    /// The task that failed, as it stood when it completed.
    pub fn task(&self) -> &TaskInfo {
        &self.task
    }

    pub fn partial(&self) -> Option<&O> {
        self.partial.as_ref()
    }

    /// The executor's original error.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.source
    }

    /// True when the executor panicked instead of returning a failure.
    pub fn is_panic(&self) -> bool {
        matches!(
            self.source.downcast_ref::<Error>(),
            Some(Error::WorkerPanic(_))
        )
    }
}

impl<O: Clone> Clone for TransportError<O> {
    fn clone(&self) -> Self {
        Self {
            task: self.task.clone(),
            source: Arc::clone(&self.source),
            partial: self.partial.clone(),
        }
    }
}

impl<O> fmt::Debug for TransportError<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportError")
            .field("task", &self.task)
            .field("source", &self.source)
            .field("has_partial", &self.partial.is_some())
            .finish()
    }
}

impl<O> fmt::Display for TransportError<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.task.label(), self.source)
    }
}

impl<O> StdError for TransportError<O> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Task;
    use std::io;

    fn info() -> TaskInfo {
        let task: Task<(), String> = Task::new(()).with_name("PUT /items");
        task.info()
    }

    #[test]
    fn test_failure_from_std_error() {
        let failure: Failure<String> = io::Error::new(io::ErrorKind::TimedOut, "timed out").into();
        assert_eq!(failure.to_string(), "timed out");
        assert!(failure.partial().is_none());
    }

    #[test]
    fn test_transport_error_keeps_partial_and_cause() {
        let failure = Failure::new("status 503").with_partial("retry later".to_string());
        let err = TransportError::new(info(), failure);

        assert_eq!(err.partial().map(String::as_str), Some("retry later"));
        assert_eq!(err.cause().to_string(), "status 503");
        assert_eq!(err.to_string(), "PUT /items failed: status 503");
        assert!(err.source().is_some());
        assert!(!err.is_panic());

        let copy = err.clone();
        assert_eq!(copy.task(), err.task());
    }

    #[test]
    fn test_transport_error_from_panic() {
        let err: TransportError<()> = TransportError::from_panic(
            info(),
            PanicInfo {
                context: "executor for PUT /items".into(),
                message: "exploded".into(),
            },
        );
        assert!(err.is_panic());
        assert!(err.to_string().contains("exploded"));
    }
}
