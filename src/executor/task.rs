//! Task representation and lifecycle timestamps.

use super::failure::TransportError;
use crate::error::{Error, Result};
use crate::promise::Promise;
use crate::scheduler::Priority;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Global task ID counter
static TASK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(TASK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Promise handed out for a submitted task.
pub type TaskPromise<O> = Promise<O, TransportError<O>>;

/// Lifecycle points stamped by the reactor; `None` until reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamps {
    pub scheduled: Option<Instant>,
    pub run: Option<Instant>,
    pub completed: Option<Instant>,
}

impl Timestamps {
    /// Time spent queued before the worker picked the task up.
    pub fn queue_wait(&self) -> Option<Duration> {
        Some(self.run?.saturating_duration_since(self.scheduled?))
    }

    /// Time the executor spent on the task.
    pub fn run_time(&self) -> Option<Duration> {
        Some(self.completed?.saturating_duration_since(self.run?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Unscheduled,
    Scheduled,
    Running,
    Completed,
}

/// One unit of work for a reactor.
///
/// `payload` is whatever the executor needs and is never inspected by the
/// scheduler. A task is submitted at most once; its promise is created at
/// submission and never replaced.
pub struct Task<P, O> {
    id: TaskId,
    name: Option<String>,
    priority: Priority,
    payload: P,
    times: Mutex<Timestamps>,
    promise: OnceLock<TaskPromise<O>>,
}

impl<P, O> Task<P, O>
where
    O: Clone + Send + 'static,
{
    /// Create a new task with normal priority
    pub fn new(payload: P) -> Self {
        Task {
            id: TaskId::next(),
            name: None,
            priority: Priority::Normal,
            payload,
            times: Mutex::new(Timestamps::default()),
            promise: OnceLock::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Name used for the task's promise and in logs.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn timestamps(&self) -> Timestamps {
        *self.times.lock()
    }

    /// `None` until the task has been submitted.
    pub fn promise(&self) -> Option<&TaskPromise<O>> {
        self.promise.get()
    }

    pub fn status(&self) -> TaskStatus {
        let times = self.timestamps();
        if times.completed.is_some() {
            TaskStatus::Completed
        } else if times.run.is_some() {
            TaskStatus::Running
        } else if times.scheduled.is_some() {
            TaskStatus::Scheduled
        } else {
            TaskStatus::Unscheduled
        }
    }

    pub fn info(&self) -> TaskInfo {
        TaskInfo {
            id: self.id,
            name: self.name.clone(),
            priority: self.priority,
            timestamps: self.timestamps(),
        }
    }

    pub(crate) fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("task-{}", self.id))
    }

    /// Attaches the promise and stamps `scheduled`. Fails if the task was
    /// submitted before.
    pub(crate) fn schedule(&self) -> Result<TaskPromise<O>> {
        let promise = Promise::named(self.label());
        self.promise
            .set(promise.clone())
            .map_err(|_| Error::AlreadyScheduled(self.id))?;
        self.times.lock().scheduled = Some(Instant::now());
        Ok(promise)
    }

    pub(crate) fn mark_run(&self) {
        self.times.lock().run = Some(Instant::now());
    }

    pub(crate) fn mark_completed(&self) {
        self.times.lock().completed = Some(Instant::now());
    }
}

impl<P, O> fmt::Debug for Task<P, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("timestamps", &*self.times.lock())
            .finish()
    }
}

/// Snapshot of a task's identity and timestamps, detached from its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub id: TaskId,
    pub name: Option<String>,
    pub priority: Priority,
    pub timestamps: Timestamps,
}

impl TaskInfo {
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("task-{}", self.id))
    }
}
