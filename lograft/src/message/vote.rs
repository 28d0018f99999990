use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::display_ext::DisplayOptionExt;
use crate::membership::Endpoint;
use crate::EntryId;
use crate::Term;

/// Sent by a candidate to gather votes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct VoteRequest {
    pub term: Term,
    pub candidate: Endpoint,

    /// The last entry in the candidate's log.
    pub last_entry: Option<EntryId>,
}

impl fmt::Display for VoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, candidate:{}, last_entry:{}}}",
            self.term,
            self.candidate,
            self.last_entry.display()
        )
    }
}

/// The response to a [`VoteRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct VoteResponse {
    /// The term of the voter after handling the request.
    pub term: Term,

    /// Will be true if the candidate received the vote.
    pub granted: bool,
}

impl fmt::Display for VoteResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{term:{}, granted:{}}}", self.term, self.granted)
    }
}

/// Sent by a follower before it becomes a candidate, to learn whether it could win an election.
///
/// A poll is advisory: a member answering it does not cast a vote and keeps its own term.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct PollRequest {
    /// The term the requester would campaign in.
    pub term: Term,
    pub candidate: Endpoint,
    pub last_entry: Option<EntryId>,
}

impl fmt::Display for PollRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, candidate:{}, last_entry:{}}}",
            self.term,
            self.candidate,
            self.last_entry.display()
        )
    }
}

/// The response to a [`PollRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct PollResponse {
    pub term: Term,

    /// Will be true if the responder would vote for the requester.
    pub accepted: bool,
}

impl fmt::Display for PollResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{term:{}, accepted:{}}}", self.term, self.accepted)
    }
}
