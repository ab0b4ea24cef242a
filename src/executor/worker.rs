// reactor worker thread
use super::{Executor, PanicHandler, Task, TransportError};
use crate::config::ReactorConfig;
use crate::reactor::Lifecycle;
use crate::scheduler::PriorityQueue;
use crate::telemetry::Metrics;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, Thread};
use tracing::{debug, trace, warn};

pub(crate) type QueuedTask<X> = Arc<Task<<X as Executor>::Payload, <X as Executor>::Output>>;

pub(crate) struct Control {
    pub lifecycle: Lifecycle,
    pub should_stop: bool,
    /// Set by the worker once it has seen `should_stop` and left its loop.
    pub exiting: bool,
}

/// State shared between a reactor handle and its worker thread.
pub(crate) struct Core<X: Executor> {
    pub queue: PriorityQueue<QueuedTask<X>>,
    pub control: Mutex<Control>,
    pub stopped: Condvar,
    pub config: ReactorConfig,
    pub panic_handler: PanicHandler,
    pub metrics: Arc<Metrics>,
    executor: Mutex<X>,
    thread: Mutex<Option<Thread>>,
}

impl<X: Executor> Core<X> {
    pub fn new(executor: X, config: ReactorConfig) -> Self {
        Self {
            queue: PriorityQueue::new(config.drain_order),
            control: Mutex::new(Control {
                lifecycle: Lifecycle::Stopped,
                should_stop: false,
                exiting: false,
            }),
            stopped: Condvar::new(),
            panic_handler: PanicHandler::new(config.panic_strategy),
            metrics: Arc::new(Metrics::new()),
            executor: Mutex::new(executor),
            thread: Mutex::new(None),
            config,
        }
    }

    /// Cuts the idle sleep short after new work or a stop request.
    pub fn wake(&self) {
        if let Some(thread) = self.thread.lock().as_ref() {
            thread.unpark();
        }
    }

    pub fn on_worker_thread(&self) -> bool {
        self.thread
            .lock()
            .as_ref()
            .map_or(false, |t| t.id() == thread::current().id())
    }

    pub fn run(self: Arc<Self>) {
        let _guard = StopGuard { core: &*self };
        *self.thread.lock() = Some(thread::current());

        {
            let mut control = self.control.lock();
            if control.should_stop {
                control.exiting = true;
                return;
            }
            control.lifecycle = Lifecycle::Running;
        }
        debug!("{} running", self.config.thread_name);

        loop {
            {
                let mut control = self.control.lock();
                if control.should_stop {
                    control.exiting = true;
                    break;
                }
            }

            // Priority is re-evaluated on every pop.
            match self.queue.pop() {
                Some(task) => self.run_task(&task),
                None => thread::park_timeout(self.config.idle_interval),
            }
        }

        debug!(
            "{} stopping with {} task(s) still queued",
            self.config.thread_name,
            self.queue.len()
        );
    }

    fn run_task(&self, task: &Task<X::Payload, X::Output>) {
        let Some(promise) = task.promise().cloned() else {
            warn!("{} was queued without a promise, skipping", task.label());
            return;
        };

        let label = task.label();
        trace!("running {} ({})", label, task.priority());
        task.mark_run();
        let result = self
            .panic_handler
            .execute(&format!("executor for {}", label), || {
                self.executor.lock().execute(task)
            });
        task.mark_completed();

        let info = task.info();
        self.metrics.record_task_execution(&info.timestamps);

        let outcome = match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(failure)) => {
                debug!("{} failed: {}", info.label(), failure);
                self.metrics.record_task_failure();
                Err(TransportError::new(info, failure))
            }
            Err(panic) => {
                self.metrics.record_task_panic();
                Err(TransportError::from_panic(info, panic))
            }
        };

        // Settlement finishes before a handler panic is re-raised here.
        let _ = self
            .panic_handler
            .execute(&format!("handlers for {}", label), || {
                promise.settle_or_log(outcome)
            });
    }
}

struct StopGuard<'a, X: Executor> {
    core: &'a Core<X>,
}

impl<X: Executor> Drop for StopGuard<'_, X> {
    fn drop(&mut self) {
        *self.core.thread.lock() = None;
        let mut control = self.core.control.lock();
        control.lifecycle = Lifecycle::Stopped;
        control.exiting = true;
        drop(control);
        self.core.stopped.notify_all();
        debug!("{} stopped", self.core.config.thread_name);
    }
}
