use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::display_ext::DisplaySliceExt;
use crate::membership::Endpoint;

/// What an entry carries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub enum EntryPayload {
    /// An empty entry, written by a new leader to establish its term in the log.
    Blank,

    /// Opaque application data.
    Normal(Vec<u8>),

    /// The complete member list of a new configuration.
    Configuration(Vec<Endpoint>),
}

impl EntryPayload {
    pub fn is_configuration(&self) -> bool {
        matches!(self, EntryPayload::Configuration(_))
    }
}

impl fmt::Display for EntryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPayload::Blank => write!(f, "blank"),
            EntryPayload::Normal(data) => write!(f, "normal({} bytes)", data.len()),
            EntryPayload::Configuration(members) => write!(f, "configuration: {}", members.display()),
        }
    }
}
