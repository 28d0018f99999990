//! The transport a node uses to talk to other members.

mod pending;


pub use self::pending::PendingResponse;
pub use self::pending::PendingSend;
use crate::error::NetworkError;
use crate::membership::Endpoint;
use crate::message::AppendRequest;
use crate::message::ConfigureRequest;
use crate::message::ConfigureResponse;
use crate::message::JoinRequest;
use crate::message::JoinResponse;
use crate::message::LeaveRequest;
use crate::message::LeaveResponse;
use crate::message::PollRequest;
use crate::message::PollResponse;
use crate::message::VoteRequest;
use crate::message::VoteResponse;

/// Request/response and fire-and-forget messaging keyed by member address.
///
/// None of the methods may block: a request is handed over to the transport and the caller gets a
/// [`PendingResponse`] it checks on every tick. An `Err` returned directly means the request never
/// left this node.
pub trait RaftNetwork: 'static {
    fn send_vote(
        &mut self,
        target: &Endpoint,
        req: VoteRequest,
    ) -> Result<PendingResponse<VoteResponse>, NetworkError>;

    fn send_poll(
        &mut self,
        target: &Endpoint,
        req: PollRequest,
    ) -> Result<PendingResponse<PollResponse>, NetworkError>;

    /// Send an append request without waiting for an answer.
    ///
    /// The returned handle resolves once the message left this node. The follower's answer, if
    /// any, arrives as a separate [`AppendResponse`](crate::message::AppendResponse).
    fn send_append(&mut self, target: &Endpoint, req: AppendRequest) -> Result<PendingSend, NetworkError>;

    fn send_configure(
        &mut self,
        target: &Endpoint,
        req: ConfigureRequest,
    ) -> Result<PendingResponse<ConfigureResponse>, NetworkError>;

    fn send_join(
        &mut self,
        target: &Endpoint,
        req: JoinRequest,
    ) -> Result<PendingResponse<JoinResponse>, NetworkError>;

    fn send_leave(
        &mut self,
        target: &Endpoint,
        req: LeaveRequest,
    ) -> Result<PendingResponse<LeaveResponse>, NetworkError>;
}
