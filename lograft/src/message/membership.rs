use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::Term;

/// Sent by a node that wants to become a member of a running cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct JoinRequest {
    pub member: Endpoint,
}

impl fmt::Display for JoinRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{join:{}}}", self.member)
    }
}

/// The answer to a [`JoinRequest`].
///
/// On rejection `configuration` is the responder's view of the cluster, which the joining node
/// uses to pick its next candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct JoinResponse {
    pub term: Term,
    pub succeeded: bool,
    pub configuration: Configuration,
}

impl fmt::Display for JoinResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, succeeded:{}, configuration:{}}}",
            self.term, self.succeeded, self.configuration
        )
    }
}

/// Sent by a member that wants to leave the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct LeaveRequest {
    pub member: Endpoint,
}

impl fmt::Display for LeaveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{leave:{}}}", self.member)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct LeaveResponse {
    pub term: Term,
    pub succeeded: bool,
    pub configuration: Configuration,
}

impl fmt::Display for LeaveResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{term:{}, succeeded:{}, configuration:{}}}",
            self.term, self.succeeded, self.configuration
        )
    }
}
