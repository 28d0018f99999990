use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::display_ext::DisplayOptionExt;
use crate::membership::Endpoint;
use crate::Entry;
use crate::EntryId;
use crate::LogPosition;
use crate::Term;

/// Sent by a leader to replicate one entry, or as a heartbeat when there is no entry.
///
/// `prev_entry` is the last entry the leader believes the follower has; `entry`, if present,
/// immediately follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct AppendRequest {
    pub term: Term,
    pub leader: Endpoint,
    pub prev_entry: Option<EntryId>,
    pub commit_position: Option<LogPosition>,
    pub entry: Option<Entry>,
}

impl AppendRequest {
    pub fn is_heartbeat(&self) -> bool {
        self.entry.is_none()
    }
}

impl fmt::Display for AppendRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "term={}, leader={}, prev_entry={}, commit={}, entry={}",
            self.term,
            self.leader,
            self.prev_entry.display(),
            self.commit_position.display(),
            self.entry.display()
        )
    }
}

/// A follower's answer to an [`AppendRequest`].
///
/// Replication is fire-and-forget, so this arrives as a message of its own and is handed to the
/// leader by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct AppendResponse {
    pub term: Term,
    pub succeeded: bool,

    /// The last position in the follower's log. On rejection the leader resumes replication after
    /// this position.
    pub last_position: Option<LogPosition>,
}

impl fmt::Display for AppendResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, succeeded:{}, last_position:{}}}",
            self.term,
            self.succeeded,
            self.last_position.display()
        )
    }
}
