use anyerror::AnyError;

use crate::entry::LogPosition;

/// Error returned by the local log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    /// The log can not accept more entries right now; the write should be retried on the next tick.
    #[error("log is applying backpressure")]
    Backpressure,

    /// The log reported a failure that covers `position`.
    #[error("log failed at position {position}")]
    Failed { position: LogPosition },

    /// The write was refused.
    #[error("log io error: {0}")]
    Io(AnyError),
}

impl LogError {
    /// Whether the operation should be retried later instead of failing.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LogError::Backpressure)
    }
}

/// Failure to persist node meta data, i.e. the term, the vote or the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to save {subject}: {source}")]
pub struct StorageError {
    subject: String,
    source: AnyError,
}

impl StorageError {
    pub fn new(subject: impl ToString, source: AnyError) -> Self {
        Self {
            subject: subject.to_string(),
            source,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}
