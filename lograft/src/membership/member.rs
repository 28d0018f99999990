use std::fmt;

use tokio::time::Instant;

use crate::display_ext::DisplayOptionExt;
use crate::entry::EntryIdOptionExt;
use crate::membership::Endpoint;
use crate::storage::RaftLog;
use crate::EntryId;
use crate::LogPosition;
use crate::Term;

/// The bookkeeping a leader keeps about one member of the cluster.
///
/// A `Member` is created once per physical node and owned by [`Members`](crate::Members) in the
/// node state. Controllers never hold on to a `Member`: they keep the [`Endpoint`] and look the
/// member up again on every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    endpoint: Endpoint,

    /// The last entry shipped to this member. The next append request carries it as the previous
    /// entry and ships the entry after it.
    current_entry: Option<EntryId>,

    /// The last entry the member reported as appended to its own log.
    match_position: Option<LogPosition>,

    /// The last configuration entry the member acknowledged.
    config_entry: Option<EntryId>,

    /// Consecutive failures talking to this member. Reset by a successful append response.
    failures: u64,

    last_contact: Option<Instant>,
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{{current: {}, matched: {}, config: {}, failures: {}}}",
            self.endpoint,
            self.current_entry.display(),
            self.match_position.display(),
            self.config_entry.display(),
            self.failures
        )
    }
}

impl Member {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            current_entry: None,
            match_position: None,
            config_entry: None,
            failures: 0,
            last_contact: None,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn current_entry(&self) -> Option<EntryId> {
        self.current_entry
    }

    pub fn current_entry_position(&self) -> Option<LogPosition> {
        self.current_entry.position()
    }

    pub fn current_entry_term(&self) -> Option<Term> {
        self.current_entry.term()
    }

    pub fn set_current_entry(&mut self, entry: Option<EntryId>) {
        self.current_entry = entry;
    }

    pub fn match_position(&self) -> Option<LogPosition> {
        self.match_position
    }

    pub fn set_match_position(&mut self, position: Option<LogPosition>) {
        self.match_position = position;
    }

    pub fn config_entry(&self) -> Option<EntryId> {
        self.config_entry
    }

    pub fn config_entry_position(&self) -> Option<LogPosition> {
        self.config_entry.position()
    }

    pub fn config_entry_term(&self) -> Option<Term> {
        self.config_entry.term()
    }

    pub fn set_config_entry(&mut self, entry: Option<EntryId>) {
        self.config_entry = entry;
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }

    pub fn increment_failures(&mut self) {
        self.failures += 1;
    }

    pub fn reset_failures(&mut self) {
        self.failures = 0;
    }

    pub fn last_contact(&self) -> Option<Instant> {
        self.last_contact
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_contact = Some(now);
    }

    /// Whether the log holds an entry after the last one shipped to this member.
    pub fn has_next_entry<L: RaftLog>(&self, log: &L) -> bool {
        log.entry_after(self.current_entry_position()).is_some()
    }

    /// Move the replication cursor back so that the next entry shipped is the one after
    /// `position`. `None` rewinds to the beginning of the log.
    pub fn rewind_to<L: RaftLog>(&mut self, position: Option<LogPosition>, log: &L) {
        self.current_entry = position.and_then(|p| log.entry_at(p)).map(|e| e.id);
    }

    /// Move the replication cursor to the last entry of the log.
    ///
    /// Used when a leader starts replicating: it assumes the member is up to date until the
    /// member says otherwise.
    pub fn reset_to_last_entry<L: RaftLog>(&mut self, log: &L) {
        self.current_entry = log.last_entry_id();
    }
}
