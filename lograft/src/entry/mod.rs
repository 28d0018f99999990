//! Log entries and the identifiers the consensus protocols compare.

mod entry_id;
mod payload;


use std::fmt;

use serde::Deserialize;
use serde::Serialize;

pub use self::entry_id::EntryId;
pub use self::entry_id::EntryIdOptionExt;
pub use self::payload::EntryPayload;

/// Logical election epoch.
///
/// A node never accepts state for a term lower than the highest it has observed.
pub type Term = u64;

/// Position of an entry in the replicated log.
///
/// Positions are opaque to the consensus core: they only ever grow, and a greater position is a
/// later entry. "No position yet" is expressed as `None`.
pub type LogPosition = u64;

/// An entry that has been written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub payload: EntryPayload,
}

impl Entry {
    pub fn new(id: EntryId, payload: EntryPayload) -> Self {
        Self { id, payload }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.payload)
    }
}
