use crate::error::Error;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::error;

/// What the worker does after catching a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanicStrategy {
    /// Log and abort the process.
    Abort,
    /// Report through the task's promise only.
    Isolate,
    /// Log, report, keep draining.
    #[default]
    LogAndContinue,
}

/// Contains panics raised on the worker so one bad executor call or promise
/// handler can't take the reactor down.
#[derive(Debug)]
pub struct PanicHandler {
    strategy: PanicStrategy,
    panic_count: AtomicUsize,
}

impl PanicHandler {
    pub fn new(strategy: PanicStrategy) -> Self {
        Self {
            strategy,
            panic_count: AtomicUsize::new(0),
        }
    }

    /// Runs `f`, catching any panic. `context` names what was running
    /// (e.g. "executor for task-3") and ends up in the log line.
    pub fn execute<F, R>(&self, context: &str, f: F) -> Result<R, PanicInfo>
    where
        F: FnOnce() -> R,
    {
        let payload = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => return Ok(result),
            Err(payload) => payload,
        };

        self.panic_count.fetch_add(1, Ordering::Relaxed);
        let info = PanicInfo::from_payload(context, payload);

        match self.strategy {
            PanicStrategy::Abort => {
                error!("{}, aborting", info);
                std::process::abort();
            }
            PanicStrategy::Isolate => {}
            PanicStrategy::LogAndContinue => error!("{}", info),
        }
        Err(info)
    }

    pub fn panic_count(&self) -> usize {
        self.panic_count.load(Ordering::Relaxed)
    }

    pub fn strategy(&self) -> PanicStrategy {
        self.strategy
    }
}

impl Default for PanicHandler {
    fn default() -> Self {
        Self::new(PanicStrategy::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanicInfo {
    pub context: String,
    pub message: String,
}

impl PanicInfo {
    fn from_payload(context: &str, payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(s) => *s,
            Err(payload) => payload
                .downcast_ref::<&str>()
                .map_or_else(|| "unknown panic payload".to_string(), |s| s.to_string()),
        };

        Self {
            context: context.to_string(),
            message,
        }
    }
}

impl std::fmt::Display for PanicInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} panicked: {}", self.context, self.message)
    }
}

impl From<PanicInfo> for Error {
    fn from(info: PanicInfo) -> Self {
        Error::WorkerPanic(info.to_string())
    }
}
