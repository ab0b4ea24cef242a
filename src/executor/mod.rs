//! Task execution infrastructure.
//!
//! The reactor owns a single worker thread that hands each task to an
//! [`Executor`]. Executors are the transport: they turn a task's payload into
//! an output value or a [`Failure`]. Everything else (queueing, timestamps,
//! promise settlement, panic containment) is done by the reactor.

pub mod failure;
pub mod panic_handler;
pub mod task;
pub(crate) mod worker;

pub use failure::{BoxError, Failure, TransportError};
pub use panic_handler::{PanicHandler, PanicInfo, PanicStrategy};
pub use task::{Task, TaskId, TaskInfo, TaskPromise, TaskStatus, Timestamps};

use std::fmt;
use std::marker::PhantomData;

/// Performs the work a task describes.
///
/// `execute` runs on the reactor's worker thread, one task at a time, so
/// implementations may keep mutable connection state without locking. A
/// returned `Failure` (or a panic) rejects the task's promise with a
/// [`TransportError`]; the worker keeps going either way.
pub trait Executor: Send + 'static {
    type Payload: Send + Sync + 'static;
    type Output: Clone + Send + 'static;

    fn execute(
        &mut self,
        task: &Task<Self::Payload, Self::Output>,
    ) -> Result<Self::Output, Failure<Self::Output>>;
}

/// Adapts a closure into an [`Executor`].
pub struct FnExecutor<P, O, F> {
    f: F,
    _marker: PhantomData<fn(&P) -> O>,
}

/// Wraps `f` so it can serve as a reactor's executor.
///
/// ```
/// use iou::executor::{executor_fn, Failure, Task};
///
/// let echo = executor_fn(|task: &Task<String, String>| -> Result<String, Failure<String>> {
///     Ok(task.payload().to_uppercase())
/// });
/// # let _ = echo;
/// ```
pub fn executor_fn<P, O, F>(f: F) -> FnExecutor<P, O, F>
where
    F: FnMut(&Task<P, O>) -> Result<O, Failure<O>>,
{
    FnExecutor {
        f,
        _marker: PhantomData,
    }
}

impl<P, O, F> Executor for FnExecutor<P, O, F>
where
    P: Send + Sync + 'static,
    O: Clone + Send + 'static,
    F: FnMut(&Task<P, O>) -> Result<O, Failure<O>> + Send + 'static,
{
    type Payload = P;
    type Output = O;

    fn execute(&mut self, task: &Task<P, O>) -> Result<O, Failure<O>> {
        (self.f)(task)
    }
}

impl<P, O, F> fmt::Debug for FnExecutor<P, O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}
