use crate::executor::TaskId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("promise {0} is already settled")]
    AlreadySettled(String),

    #[error("promise {0} cannot be chained to itself")]
    SelfReference(String),

    #[error("task {0} was already submitted")]
    AlreadyScheduled(TaskId),

    #[error("config error: {0}")]
    Config(String),

    #[error("reactor error: {0}")]
    Reactor(String),

    #[error("reactor did not stop within the timeout")]
    StopTimeout,

    #[error("worker panic: {0}")]
    WorkerPanic(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("telemetry error: {0}")]
    Telemetry(String),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn reactor<S: Into<String>>(msg: S) -> Self {
        Error::Reactor(msg.into())
    }

    pub fn telemetry<S: Into<String>>(msg: S) -> Self {
        Error::Telemetry(msg.into())
    }

    /// True for the caller mistakes `fulfill`/`reject`/`chain` report synchronously.
    pub fn is_state_error(&self) -> bool {
        matches!(self, Error::AlreadySettled(_) | Error::SelfReference(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
