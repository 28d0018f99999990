use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::display_ext::DisplayOptionExt;
use crate::display_ext::DisplaySliceExt;
use crate::entry::EntryIdOptionExt;
use crate::membership::Endpoint;
use crate::quorum::majority_of;
use crate::EntryId;
use crate::LogPosition;
use crate::Term;

/// An immutable snapshot of the member list, versioned by the log entry it was appended in.
///
/// A configuration that has not been written to the log yet, e.g. the bootstrap configuration
/// of a node, has no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct Configuration {
    entry: Option<EntryId>,
    members: Vec<Endpoint>,
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entry.display(), self.members.display())
    }
}

impl Configuration {
    /// Build a configuration. Duplicated members are removed, the first occurrence wins.
    pub fn new(entry: Option<EntryId>, members: Vec<Endpoint>) -> Self {
        let mut uniq = Vec::with_capacity(members.len());
        for m in members {
            if !uniq.contains(&m) {
                uniq.push(m);
            }
        }

        Self { entry, members: uniq }
    }

    pub fn entry(&self) -> Option<EntryId> {
        self.entry
    }

    pub fn position(&self) -> Option<LogPosition> {
        self.entry.position()
    }

    pub fn term(&self) -> Option<Term> {
        self.entry.term()
    }

    pub fn members(&self) -> &[Endpoint] {
        &self.members
    }

    pub fn contains(&self, endpoint: &Endpoint) -> bool {
        self.members.contains(endpoint)
    }

    /// Number of members that form a majority of this configuration.
    pub fn quorum(&self) -> usize {
        majority_of(self.members.len())
    }

    /// The member list with `endpoint` appended, if it is not already a member.
    pub fn with_member(&self, endpoint: &Endpoint) -> Vec<Endpoint> {
        let mut members = self.members.clone();
        if !members.contains(endpoint) {
            members.push(endpoint.clone());
        }
        members
    }

    /// The member list without `endpoint`.
    pub fn without_member(&self, endpoint: &Endpoint) -> Vec<Endpoint> {
        self.members.iter().filter(|m| *m != endpoint).cloned().collect()
    }
}
