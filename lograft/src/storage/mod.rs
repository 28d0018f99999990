//! The local collaborators a node persists its state to.

use std::fmt;

use tokio::sync::broadcast;

use crate::error::LogError;
use crate::error::StorageError;
use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::Entry;
use crate::EntryId;
use crate::EntryPayload;
use crate::LogPosition;
use crate::Term;

/// A change of the local log's health, published to the controllers that wait for it.
///
/// Events are delivered in order; a subscriber sees every event published after it subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogHealth {
    /// The log failed; entries at or after `position` may be lost.
    Failed { position: LogPosition },

    /// The log recovered from a failure; it is durable again up to `position`.
    Recovered { position: LogPosition },
}

impl fmt::Display for LogHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogHealth::Failed { position } => write!(f, "failed at {}", position),
            LogHealth::Recovered { position } => write!(f, "recovered at {}", position),
        }
    }
}

/// The append-only replicated log.
///
/// A write only hands the entry to the log; it becomes durable asynchronously and
/// [`appended_position`](Self::appended_position) reports how far durability has progressed.
pub trait RaftLog: 'static {
    /// Append an entry at the tail of the log, returning the position it was assigned.
    ///
    /// [`LogError::Backpressure`] means the log can not take the entry now and the write should
    /// be retried later.
    fn try_write(&mut self, term: Term, payload: EntryPayload) -> Result<LogPosition, LogError>;

    /// The position up to which entries are durably appended.
    fn appended_position(&self) -> Option<LogPosition>;

    /// Subscribe to failure and recovery events published from now on.
    fn subscribe(&self) -> broadcast::Receiver<LogHealth>;

    fn entry_at(&self, position: LogPosition) -> Option<Entry>;

    /// The first entry after `position`. `None` reads from the beginning of the log.
    fn entry_after(&self, position: Option<LogPosition>) -> Option<Entry>;

    fn last_entry_id(&self) -> Option<EntryId>;
}

/// Persistent meta data of a node: the term, its vote and the configuration.
pub trait RaftMetaStore: 'static {
    fn save_term(&mut self, term: Term, voted_for: Option<&Endpoint>) -> Result<(), StorageError>;

    fn save_configuration(&mut self, configuration: &Configuration) -> Result<(), StorageError>;
}
