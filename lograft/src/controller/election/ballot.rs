use std::fmt;

use crate::error::NetworkError;
use crate::membership::Endpoint;
use crate::message::PollRequest;
use crate::message::PollResponse;
use crate::message::VoteRequest;
use crate::message::VoteResponse;
use crate::network::PendingResponse;
use crate::EntryId;
use crate::RaftNetwork;
use crate::RaftState;
use crate::Term;

/// The kind of election request an [`ElectionController`](super::ElectionController) sends.
pub trait Ballot: 'static {
    const NAME: &'static str;

    /// Whether a response with a higher term makes the round step down.
    ///
    /// A poll only asks whether the peer would vote; it must not turn the requester into a
    /// follower before it ever became a candidate.
    const STEP_DOWN_ON_HIGHER_TERM: bool;

    type Request: fmt::Display;
    type Response: fmt::Display;

    fn build_request(state: &RaftState, last_entry: Option<EntryId>) -> Self::Request;

    fn send<N: RaftNetwork>(
        network: &mut N,
        target: &Endpoint,
        req: Self::Request,
    ) -> Result<PendingResponse<Self::Response>, NetworkError>;

    fn response_term(resp: &Self::Response) -> Term;

    fn is_granted(resp: &Self::Response) -> bool;
}

/// A real vote request, sent while campaigning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote;

/// An advisory poll, sent before campaigning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll;

impl Ballot for Vote {
    const NAME: &'static str = "VoteController";
    const STEP_DOWN_ON_HIGHER_TERM: bool = true;

    type Request = VoteRequest;
    type Response = VoteResponse;

    fn build_request(state: &RaftState, last_entry: Option<EntryId>) -> VoteRequest {
        VoteRequest {
            term: state.term(),
            candidate: state.me().clone(),
            last_entry,
        }
    }

    fn send<N: RaftNetwork>(
        network: &mut N,
        target: &Endpoint,
        req: VoteRequest,
    ) -> Result<PendingResponse<VoteResponse>, NetworkError> {
        network.send_vote(target, req)
    }

    fn response_term(resp: &VoteResponse) -> Term {
        resp.term
    }

    fn is_granted(resp: &VoteResponse) -> bool {
        resp.granted
    }
}

impl Ballot for Poll {
    const NAME: &'static str = "PollController";
    const STEP_DOWN_ON_HIGHER_TERM: bool = false;

    type Request = PollRequest;
    type Response = PollResponse;

    fn build_request(state: &RaftState, last_entry: Option<EntryId>) -> PollRequest {
        PollRequest {
            term: state.term(),
            candidate: state.me().clone(),
            last_entry,
        }
    }

    fn send<N: RaftNetwork>(
        network: &mut N,
        target: &Endpoint,
        req: PollRequest,
    ) -> Result<PendingResponse<PollResponse>, NetworkError> {
        network.send_poll(target, req)
    }

    fn response_term(resp: &PollResponse) -> Term {
        resp.term
    }

    fn is_granted(resp: &PollResponse) -> bool {
        resp.accepted
    }
}
