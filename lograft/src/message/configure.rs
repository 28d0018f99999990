use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::display_ext::DisplayOptionExt;
use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::EntryId;
use crate::Term;

/// Pushes the leader's current configuration to a member that lags behind.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct ConfigureRequest {
    pub term: Term,
    pub leader: Endpoint,
    pub configuration: Configuration,
}

impl fmt::Display for ConfigureRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, leader:{}, configuration:{}}}",
            self.term, self.leader, self.configuration
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct ConfigureResponse {
    pub term: Term,
    pub succeeded: bool,

    /// The configuration entry the member has after handling the request.
    pub configuration_entry: Option<EntryId>,
}

impl fmt::Display for ConfigureResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, succeeded:{}, configuration_entry:{}}}",
            self.term,
            self.succeeded,
            self.configuration_entry.display()
        )
    }
}
