use crate::error::LogError;
use crate::error::StorageError;

/// Why a configuration change did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// The configuration entry could not be written to the local log.
    #[error("failed to append configuration entry: {0}")]
    Append(#[from] LogError),

    /// The new configuration could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The change was cancelled by closing the controller.
    #[error("configuration change was closed before completion")]
    Closed,
}

/// Why joining a cluster did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("no known member to send a join request to")]
    NoCandidates,

    /// Every candidate was tried `attempts` times in a row without an answer.
    #[error("no candidate answered after {attempts} attempts")]
    Unreachable { attempts: u64 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("join was closed before completion")]
    Closed,
}

/// Why leaving a cluster did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaveError {
    #[error("no known member to send a leave request to")]
    NoCandidates,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("leave was closed before completion")]
    Closed,
}
