use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::entry::LogPosition;
use crate::entry::Term;

/// Identifies a written entry by the term it was appended in and its position in the log.
///
/// Ordering compares the term first, then the position, which is the order in which a leader
/// decides which of two logs is more up to date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
pub struct EntryId {
    pub term: Term,
    pub position: LogPosition,
}

impl EntryId {
    pub fn new(term: Term, position: LogPosition) -> Self {
        Self { term, position }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}-{}", self.term, self.position)
    }
}

/// Accessors for an optional [`EntryId`].
pub trait EntryIdOptionExt {
    /// The position of the entry, or `None` if there is no entry.
    fn position(&self) -> Option<LogPosition>;

    /// The term of the entry, or `None` if there is no entry.
    fn term(&self) -> Option<Term>;
}

impl EntryIdOptionExt for Option<EntryId> {
    fn position(&self) -> Option<LogPosition> {
        self.map(|x| x.position)
    }

    fn term(&self) -> Option<Term> {
        self.map(|x| x.term)
    }
}
