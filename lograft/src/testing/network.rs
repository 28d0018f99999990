use std::collections::BTreeSet;
use std::collections::VecDeque;

use tokio::sync::oneshot;

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
use crate::network::PendingResponse;
use crate::network::PendingSend;
use crate::RaftNetwork;

/// Completes one pending request recorded by [`MockNetwork`].
#[derive(Debug)]
pub struct Responder<T> {
    tx: Option<oneshot::Sender<Result<T, NetworkError>>>,
}

impl<T> Responder<T> {
    fn new(tx: oneshot::Sender<Result<T, NetworkError>>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A responder whose request is already completed.
    fn done() -> Self {
        Self { tx: None }
    }

    pub fn respond(mut self, resp: T) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Ok(resp));
        }
    }

    pub fn fail(mut self, err: NetworkError) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Err(err));
        }
    }

    /// Whether the requester dropped the pending response, i.e. cancelled the request.
    pub fn is_closed(&self) -> bool {
        match &self.tx {
            Some(tx) => tx.is_closed(),
            None => true,
        }
    }
}

/// One request handed to the [`MockNetwork`].
#[derive(Debug)]
pub struct Sent<Req, Resp> {
    pub target: Endpoint,
    pub request: Req,
    pub responder: Responder<Resp>,
}

/// Records every outbound request so that a test can answer, fail or drop it.
#[derive(Debug, Default)]
pub struct MockNetwork {
    pub votes: VecDeque<Sent<VoteRequest, VoteResponse>>,
    pub polls: VecDeque<Sent<PollRequest, PollResponse>>,
    pub appends: VecDeque<Sent<AppendRequest, ()>>,
    pub configures: VecDeque<Sent<ConfigureRequest, ConfigureResponse>>,
    pub joins: VecDeque<Sent<JoinRequest, JoinResponse>>,
    pub leaves: VecDeque<Sent<LeaveRequest, LeaveResponse>>,

    /// Sending to these endpoints fails immediately.
    pub unreachable: BTreeSet<Endpoint>,

    /// Complete fire-and-forget sends as soon as they are made.
    pub auto_ack_appends: bool,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self {
            auto_ack_appends: true,
            ..Default::default()
        }
    }

    pub fn set_unreachable(&mut self, target: &Endpoint, unreachable: bool) {
        if unreachable {
            self.unreachable.insert(target.clone());
        } else {
            self.unreachable.remove(target);
        }
    }

    /// Remove and return all recorded append requests.
    pub fn take_appends(&mut self) -> Vec<Sent<AppendRequest, ()>> {
        self.appends.drain(..).collect()
    }

    fn record<Req, Resp>(
        &self,
        target: &Endpoint,
        req: Req,
    ) -> Result<(Sent<Req, Resp>, PendingResponse<Resp>), NetworkError> {
        if self.unreachable.contains(target) {
            return Err(NetworkError::unreachable(target));
        }

        let (tx, pending) = PendingResponse::channel();
        let sent = Sent {
            target: target.clone(),
            request: req,
            responder: Responder::new(tx),
        };

        Ok((sent, pending))
    }
}

impl RaftNetwork for MockNetwork {
    fn send_vote(
        &mut self,
        target: &Endpoint,
        req: VoteRequest,
    ) -> Result<PendingResponse<VoteResponse>, NetworkError> {
        let (sent, pending) = self.record(target, req)?;
        self.votes.push_back(sent);
        Ok(pending)
    }

    fn send_poll(
        &mut self,
        target: &Endpoint,
        req: PollRequest,
    ) -> Result<PendingResponse<PollResponse>, NetworkError> {
        let (sent, pending) = self.record(target, req)?;
        self.polls.push_back(sent);
        Ok(pending)
    }

    fn send_append(&mut self, target: &Endpoint, req: AppendRequest) -> Result<PendingSend, NetworkError> {
        let (mut sent, pending) = self.record(target, req)?;

        if self.auto_ack_appends {
            let responder = std::mem::replace(&mut sent.responder, Responder::done());
            responder.respond(());
        }

        self.appends.push_back(sent);
        Ok(pending)
    }

    fn send_configure(
        &mut self,
        target: &Endpoint,
        req: ConfigureRequest,
    ) -> Result<PendingResponse<ConfigureResponse>, NetworkError> {
        let (sent, pending) = self.record(target, req)?;
        self.configures.push_back(sent);
        Ok(pending)
    }

    fn send_join(
        &mut self,
        target: &Endpoint,
        req: JoinRequest,
    ) -> Result<PendingResponse<JoinResponse>, NetworkError> {
        let (sent, pending) = self.record(target, req)?;
        self.joins.push_back(sent);
        Ok(pending)
    }

    fn send_leave(
        &mut self,
        target: &Endpoint,
        req: LeaveRequest,
    ) -> Result<PendingResponse<LeaveResponse>, NetworkError> {
        let (sent, pending) = self.record(target, req)?;
        self.leaves.push_back(sent);
        Ok(pending)
    }
}
