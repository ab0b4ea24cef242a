//! The task reactor: one worker thread draining a priority queue of tasks
//! through an [`Executor`].
//!
//! Submission and handler registration may happen from any thread. The worker
//! runs one task at a time and settles its promise before picking the next,
//! so promise handlers for task results run on the worker thread. A handler
//! that blocks stalls the reactor for as long as it blocks.
//!
//! ```
//! use iou::executor::{executor_fn, Failure, Task};
//! use iou::reactor::Reactor;
//! use iou::scheduler::Priority;
//!
//! let reactor = Reactor::new(executor_fn(
//!     |task: &Task<u32, u32>| -> Result<u32, Failure<u32>> { Ok(task.payload() * 2) },
//! ));
//! reactor.start().unwrap();
//!
//! let promise = reactor.submit(Task::new(21).with_priority(Priority::High)).unwrap();
//! assert_eq!(promise.wait().unwrap(), 42);
//!
//! reactor.stop_and_wait(None).unwrap();
//! ```

use crate::config::ReactorConfig;
use crate::error::{Error, Result};
use crate::executor::worker::Core;
use crate::executor::{Executor, Task, TaskPromise};
use crate::telemetry::Metrics;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Where a reactor's worker is in its life.
///
/// `Stopped → Starting → Running → StopRequested → Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Stopped,
    Starting,
    Running,
    StopRequested,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Stopped => "stopped",
            Lifecycle::Starting => "starting",
            Lifecycle::Running => "running",
            Lifecycle::StopRequested => "stop requested",
        };
        f.write_str(name)
    }
}

pub struct Reactor<X: Executor> {
    core: Arc<Core<X>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<X: Executor> Reactor<X> {
    /// Reactor with the default configuration. The worker is not started.
    pub fn new(executor: X) -> Self {
        Self::build(executor, ReactorConfig::default())
    }

    pub fn with_config(executor: X, config: ReactorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(executor, config))
    }

    fn build(executor: X, config: ReactorConfig) -> Self {
        Self {
            core: Arc::new(Core::new(executor, config)),
            worker: Mutex::new(None),
        }
    }

    /// Starts the worker if it is not running. Idempotent.
    ///
    /// A stop that was requested but not yet acted on is cancelled and the
    /// current worker keeps going. Once the worker has begun exiting, it is
    /// joined and a fresh one is spawned.
    pub fn start(&self) -> Result<()> {
        // Held for the whole decision so concurrent starts serialize.
        let mut worker = self.worker.lock();
        {
            let mut control = self.core.control.lock();
            if !control.exiting && control.lifecycle != Lifecycle::Stopped {
                control.should_stop = false;
                if control.lifecycle == Lifecycle::StopRequested {
                    control.lifecycle = Lifecycle::Running;
                }
                return Ok(());
            }
        }

        if self.core.on_worker_thread() {
            return Err(Error::reactor(
                "cannot restart the reactor from its exiting worker thread",
            ));
        }

        // Only an exiting worker gets here, so the join is short.
        if let Some(handle) = worker.take() {
            self.join_worker(handle);
        }

        {
            let mut control = self.core.control.lock();
            control.should_stop = false;
            control.exiting = false;
            control.lifecycle = Lifecycle::Starting;
        }

        let mut builder = thread::Builder::new().name(self.core.config.thread_name.clone());
        if let Some(size) = self.core.config.stack_size {
            builder = builder.stack_size(size);
        }

        let core = Arc::clone(&self.core);
        match builder.spawn(move || core.run()) {
            Ok(handle) => {
                *worker = Some(handle);
                debug!("started {}", self.core.config.thread_name);
                Ok(())
            }
            Err(err) => {
                self.core.control.lock().lifecycle = Lifecycle::Stopped;
                Err(err.into())
            }
        }
    }

    fn join_worker(&self, handle: JoinHandle<()>) {
        if handle.join().is_err() {
            warn!("previous {} worker panicked", self.core.config.thread_name);
        }
    }

    /// Asks the worker to stop after the task it is running. Tasks still
    /// queued stay queued, their promises pending.
    pub fn stop(&self) {
        let mut control = self.core.control.lock();
        control.should_stop = true;
        if control.lifecycle == Lifecycle::Running {
            control.lifecycle = Lifecycle::StopRequested;
        }
        drop(control);
        self.core.wake();
    }

    /// [`stop`](Self::stop), then block until the worker has exited.
    ///
    /// With a timeout, returns [`Error::StopTimeout`] if the worker is still
    /// running when it elapses; the stop request stays in place. Calling this
    /// from the worker thread (from a promise handler) is an error.
    pub fn stop_and_wait(&self, timeout: Option<Duration>) -> Result<()> {
        if self.core.on_worker_thread() {
            return Err(Error::reactor(
                "stop_and_wait called from the reactor's own worker thread",
            ));
        }

        self.stop();
        let deadline = timeout.map(|t| Instant::now() + t);

        let mut control = self.core.control.lock();
        while control.lifecycle != Lifecycle::Stopped {
            match deadline {
                Some(deadline) => {
                    if self
                        .core
                        .stopped
                        .wait_until(&mut control, deadline)
                        .timed_out()
                        && control.lifecycle != Lifecycle::Stopped
                    {
                        return Err(Error::StopTimeout);
                    }
                }
                None => self.core.stopped.wait(&mut control),
            }
        }
        drop(control);

        let mut worker = self.worker.lock();
        if worker.as_ref().map_or(false, |h| h.is_finished()) {
            if let Some(handle) = worker.take() {
                self.join_worker(handle);
            }
        }
        Ok(())
    }

    /// Queues `task` at the tail of its priority level and returns its
    /// promise. Tasks submitted before [`start`](Self::start) wait for it.
    ///
    /// Fails with [`Error::AlreadyScheduled`] if the task was submitted
    /// before, to this or any other reactor.
    pub fn submit<T>(&self, task: T) -> Result<TaskPromise<X::Output>>
    where
        T: Into<Arc<Task<X::Payload, X::Output>>>,
    {
        let task = task.into();
        let promise = task.schedule()?;
        let priority = task.priority();
        trace!("submitted {} at {} priority", task.label(), priority);

        self.core.queue.push(task, priority);
        self.core.metrics.record_task_submitted();
        self.core.wake();
        Ok(promise)
    }

    pub fn state(&self) -> Lifecycle {
        self.core.control.lock().lifecycle
    }

    /// Number of tasks queued and not yet picked up by the worker.
    pub fn pending_tasks(&self) -> usize {
        self.core.queue.len()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.core.metrics
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.core.config
    }

    /// Panics contained so far, in executors and in handlers run during
    /// settlement.
    pub fn panic_count(&self) -> usize {
        self.core.panic_handler.panic_count()
    }
}

impl<X: Executor> fmt::Debug for Reactor<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactor")
            .field("thread_name", &self.core.config.thread_name)
            .field("state", &self.state())
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

impl<X: Executor> Drop for Reactor<X> {
    fn drop(&mut self) {
        if self.core.on_worker_thread() {
            self.stop();
            return;
        }
        if let Err(err) = self.stop_and_wait(None) {
            warn!("failed to stop {}: {}", self.core.config.thread_name, err);
        }
        if let Some(handle) = self.worker.get_mut().take() {
            self.join_worker(handle);
        }
    }
}
