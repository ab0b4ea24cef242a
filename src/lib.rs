//! IOU - settle-once promises and a priority task reactor
//!
//! Two building blocks for hosts that push work through a single blocking
//! transport (a serial link, one HTTP connection, a device handle):
//!
//! - [`Promise`]: a value that is fulfilled or rejected exactly once, with
//!   handlers that run in registration order whether they were attached
//!   before or after settlement, and derived promises for chaining.
//! - [`Reactor`]: one worker thread that drains tasks by priority through an
//!   [`Executor`](executor::Executor) and settles each task's promise.
//!
//! # Quick Start
//!
//! ```
//! use iou::prelude::*;
//!
//! let reactor = Reactor::new(executor_fn(
//!     |task: &Task<String, usize>| -> std::result::Result<usize, Failure<usize>> {
//!         Ok(task.payload().len())
//!     },
//! ));
//! reactor.start().unwrap();
//!
//! let promise = reactor.submit(Task::new("hello".to_string())).unwrap();
//! let doubled = promise.on_fulfilled(Handler::map(|n| n * 2));
//! assert_eq!(doubled.wait().unwrap(), 10);
//! ```
//!
//! # Features
//!
//! - **telemetry** (default): task counters and latency histograms, JSON export
//! - **async**: `Promise::to_future()` and `.await` support

#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod promise;
pub mod reactor;
pub mod scheduler;
pub mod telemetry;

#[cfg(feature = "async")]
pub mod async_bridge;

pub use config::{ReactorConfig, ReactorConfigBuilder};
pub use error::{Error, Result};
pub use executor::{Executor, Failure, Task, TaskPromise, TransportError};
pub use promise::{Handler, Promise, State};
pub use reactor::{Lifecycle, Reactor};
pub use scheduler::Priority;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::executor_fn;
    use std::sync::Arc;
    use parking_lot::Mutex;

    #[test]
    fn test_promise_result_feeds_follow_up_task() {
        let reactor = Reactor::new(executor_fn(
            |task: &Task<u64, u64>| -> std::result::Result<u64, Failure<u64>> {
                Ok(task.payload() + 1)
            },
        ));
        reactor.start().unwrap();

        let reactor = Arc::new(reactor);
        let follow_up: Arc<Mutex<Option<TaskPromise<u64>>>> = Arc::new(Mutex::new(None));

        let first = reactor.submit(Task::new(1)).unwrap();
        let (r, slot) = (Arc::clone(&reactor), Arc::clone(&follow_up));
        let done = first.on_fulfilled(Handler::map(move |v: u64| {
            // Submitting from a handler on the worker thread is allowed.
            *slot.lock() = r.submit(Task::new(v * 10)).ok();
        }));

        done.wait().unwrap();
        let second = follow_up.lock().take().unwrap();
        assert_eq!(second.wait().unwrap(), 21);
        drop(reactor);
    }
}
