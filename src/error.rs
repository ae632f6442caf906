use thiserror::Error;

/// Failures the caller can act on. Everything else travels as a plain
/// `anyhow::Error`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpError {
    #[error("task {0} not found")]
    TaskNotFound(i64),

    #[error("task '{0}' not found: ids are integers")]
    MalformedTaskId(String),

    #[error("task title must not be empty")]
    EmptyTitle,

    #[error("history window must be between 1 and {max} days, got {days}")]
    InvalidWindow { days: u32, max: u32 },
}

impl OpError {
    /// Extract the typed error from an `anyhow` chain, if there is one.
    pub fn find(err: &anyhow::Error) -> Option<&OpError> {
        err.chain().find_map(|cause| cause.downcast_ref::<OpError>())
    }
}
