//! The handshake a new node runs to become a member of a running cluster.

mod state;

#[cfg(test)] mod join_test;

use tokio::sync::oneshot;
use tokio::time::Instant;

pub use self::state::JoinState;
use crate::controller::RaftContext;
use crate::controller::StateMachine;
use crate::controller::Transition;
use crate::error::ControllerError;
use crate::error::JoinError;
use crate::error::NetworkError;
use crate::membership::Candidates;
use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::message::JoinRequest;
use crate::message::JoinResponse;
use crate::network::PendingResponse;
use crate::raft_state::ServerState;
use crate::RaftMetaStore;
use crate::RaftNetwork;
use crate::RaftTypeConfig;

/// Sends join requests to the known members in turn until one accepts this node.
///
/// A rejection carries the responder's view of the cluster, which replaces the candidate list.
/// The join gives up only when no candidate answers at all for
/// [`Config::max_join_rounds`](crate::Config::max_join_rounds) rounds over the candidates.
pub struct JoinController {
    sm: StateMachine<JoinState>,

    candidates: Candidates,
    target: Option<Endpoint>,
    pending: Option<PendingResponse<JoinResponse>>,

    /// Attempts in a row that got no answer.
    unanswered: u64,
    retry_at: Option<Instant>,

    configuration: Option<Configuration>,
    failure: Option<JoinError>,
    result_tx: Option<oneshot::Sender<Result<Configuration, JoinError>>>,
}

impl Default for JoinController {
    fn default() -> Self {
        Self::new()
    }
}

impl JoinController {
    pub fn new() -> Self {
        Self {
            sm: StateMachine::new("JoinController"),
            candidates: Candidates::default(),
            target: None,
            pending: None,
            unanswered: 0,
            retry_at: None,
            configuration: None,
            failure: None,
            result_tx: None,
        }
    }

    /// Start joining through the known `members`. `me` is never asked.
    pub fn open(&mut self, me: &Endpoint, members: &[Endpoint]) -> Result<(), ControllerError> {
        if !self.sm.is_closed() {
            return Err(ControllerError::not_closed(self.sm.name(), self.sm.current()));
        }

        self.reset();
        self.candidates = Candidates::new(members, me);
        self.sm.take(Transition::Open);
        Ok(())
    }

    pub fn open_async(
        &mut self,
        me: &Endpoint,
        members: &[Endpoint],
    ) -> Result<oneshot::Receiver<Result<Configuration, JoinError>>, ControllerError> {
        self.open(me, members)?;

        let (tx, rx) = oneshot::channel();
        self.result_tx = Some(tx);
        Ok(rx)
    }

    pub fn close(&mut self) {
        self.sm.take(Transition::Close);
    }

    pub fn close_forcibly<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) {
        self.close();
        while !self.is_closed() {
            if self.do_work(ctx) == 0 {
                break;
            }
        }
    }

    pub fn do_work<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> usize {
        let mut work = 0;

        loop {
            let transition = match self.sm.current() {
                JoinState::Closed => None,
                JoinState::OpenRequest => self.open_request(ctx),
                JoinState::AwaitResponse => self.await_response(ctx),
                JoinState::Joined | JoinState::Failed => None,
                JoinState::Closing => self.closing(),
            };

            match transition {
                Some(t) if self.sm.take(t) => work += 1,
                _ => return work,
            }
        }
    }

    pub fn state(&self) -> JoinState {
        self.sm.current()
    }

    pub fn is_closed(&self) -> bool {
        self.sm.is_closed()
    }

    pub fn is_joined(&self) -> bool {
        self.sm.current() == JoinState::Joined
    }

    pub fn is_failed(&self) -> bool {
        self.sm.current() == JoinState::Failed
    }

    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }

    /// The configuration this node joined with.
    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    pub fn failure(&self) -> Option<&JoinError> {
        self.failure.as_ref()
    }

    fn reset(&mut self) {
        self.candidates = Candidates::default();
        self.target = None;
        self.pending = None;
        self.unanswered = 0;
        self.retry_at = None;
        self.configuration = None;
        self.failure = None;
        self.result_tx = None;
    }

    fn open_request<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        if let Some(t) = self.retry_at {
            if ctx.now < t {
                return None;
            }
        }

        let Some(target) = self.candidates.next_candidate() else {
            return Some(self.fail(JoinError::NoCandidates));
        };

        if !ctx.state.server_state().is_joining() {
            ctx.state.set_server_state(ServerState::Joining);
        }

        let req = JoinRequest {
            member: ctx.state.me().clone(),
        };

        tracing::debug!(target_node = display(&target), request = display(&req), "send join");

        match ctx.network.send_join(&target, req) {
            Ok(pending) => {
                self.target = Some(target);
                self.pending = Some(pending);
                Some(Transition::Default)
            }
            // Unless the join gives up, stay here and try the next candidate on a later tick.
            Err(e) => self.on_unanswered(ctx, &target, e),
        }
    }

    fn await_response<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let res = self.pending.as_mut()?.try_take()?;
        self.pending = None;

        let target = self.target.take()?;

        let resp = match res {
            Ok(resp) => resp,
            Err(e) => {
                return Some(self.on_unanswered(ctx, &target, e).unwrap_or(Transition::Next));
            }
        };

        self.unanswered = 0;
        let me = ctx.state.me().clone();

        if resp.succeeded && resp.configuration.contains(&me) {
            return Some(self.joined(ctx, &target, resp));
        }

        tracing::info!(
            target_node = display(&target),
            response = display(&resp),
            "join rejected, retry with the responder's view of the cluster"
        );

        self.candidates = self.candidates.merge(&target, resp.configuration.members(), &me);
        self.schedule_retry(ctx);
        Some(Transition::Next)
    }

    fn joined<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
        target: &Endpoint,
        resp: JoinResponse,
    ) -> Transition {
        tracing::info!(target_node = display(target), response = display(&resp), "joined cluster");

        ctx.adopt_term(resp.term);
        if let Err(e) = ctx.meta.save_configuration(&resp.configuration) {
            return self.fail(JoinError::Storage(e));
        }

        ctx.state.apply_configuration(resp.configuration.clone());

        ctx.state.become_follower(None);

        self.configuration = Some(resp.configuration.clone());
        self.resolve(Ok(resp.configuration));
        Transition::Default
    }

    /// Count an attempt that got no answer. Returns `Fail` if every candidate stayed silent for
    /// too many rounds.
    fn on_unanswered<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
        target: &Endpoint,
        err: NetworkError,
    ) -> Option<Transition> {
        tracing::warn!(target_node = display(target), error = display(&err), "join attempt got no answer");

        self.unanswered += 1;

        let limit = (self.candidates.len() as u64).saturating_mul(ctx.config.max_join_rounds);
        if self.unanswered >= limit {
            return Some(self.fail(JoinError::Unreachable {
                attempts: self.unanswered,
            }));
        }

        self.schedule_retry(ctx);
        None
    }

    fn schedule_retry<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) {
        self.retry_at = Some(ctx.now + ctx.config.membership_retry_interval());
    }

    fn closing(&mut self) -> Option<Transition> {
        self.resolve(Err(JoinError::Closed));
        self.pending = None;
        self.target = None;
        Some(Transition::Default)
    }

    fn fail(&mut self, err: JoinError) -> Transition {
        tracing::warn!(error = display(&err), "join failed");

        self.resolve(Err(err.clone()));
        self.failure = Some(err);
        Transition::Fail
    }

    fn resolve(&mut self, res: Result<Configuration, JoinError>) {
        if let Some(tx) = self.result_tx.take() {
            let _ = tx.send(res);
        }
    }
}
