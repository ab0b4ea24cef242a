use crate::error::{Error, Result};
use crate::executor::PanicStrategy;
use crate::scheduler::DrainOrder;
use std::time::Duration;

/// Default idle sleep between queue checks when the worker has nothing to do.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ReactorConfig {
    /// Upper bound on how long an idle worker sleeps before re-checking the
    /// queues; also bounds stop latency while idle.
    pub idle_interval: Duration,
    pub drain_order: DrainOrder,
    pub panic_strategy: PanicStrategy,
    pub stack_size: Option<usize>,
    pub thread_name: String,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            idle_interval: DEFAULT_IDLE_INTERVAL,
            drain_order: DrainOrder::default(),
            panic_strategy: PanicStrategy::default(),
            stack_size: None,
            thread_name: "iou-reactor".to_string(),
        }
    }
}

impl ReactorConfig {
    pub fn builder() -> ReactorConfigBuilder {
        ReactorConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if self.idle_interval.is_zero() {
            return Err(Error::config("idle_interval must be > 0"));
        }
        if self.idle_interval > Duration::from_secs(10) {
            return Err(Error::config("idle_interval too large (max 10s)"));
        }

        if let Some(size) = self.stack_size {
            if size < 64 * 1024 {
                return Err(Error::config("stack_size too small (min 64 KiB)"));
            }
        }

        if self.thread_name.is_empty() {
            return Err(Error::config("thread_name must not be empty"));
        }
        if self.thread_name.contains('\0') {
            return Err(Error::config("thread_name must not contain NUL"));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ReactorConfigBuilder {
    config: ReactorConfig,
}

impl ReactorConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ReactorConfig::default(),
        }
    }

    pub fn idle_interval(mut self, interval: Duration) -> Self {
        self.config.idle_interval = interval;
        self
    }

    pub fn drain_order(mut self, order: DrainOrder) -> Self {
        self.config.drain_order = order;
        self
    }

    pub fn panic_strategy(mut self, strategy: PanicStrategy) -> Self {
        self.config.panic_strategy = strategy;
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn thread_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.thread_name = name.into();
        self
    }

    pub fn build(self) -> Result<ReactorConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
