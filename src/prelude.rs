pub use crate::config::{ReactorConfig, ReactorConfigBuilder};
pub use crate::error::{Error, Result};
pub use crate::executor::{
    executor_fn, Executor, Failure, PanicStrategy, Task, TaskInfo, TaskPromise, TransportError,
};
pub use crate::promise::{Handler, Promise, Resolution, State};
pub use crate::reactor::{Lifecycle, Reactor};
pub use crate::scheduler::{DrainOrder, Priority};

pub use crate::telemetry::{Metrics, MetricsSnapshot};

#[cfg(feature = "async")]
pub use crate::async_bridge::PromiseFuture;
