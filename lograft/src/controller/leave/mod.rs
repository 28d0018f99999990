//! The handshake a member runs to leave the cluster gracefully.

mod state;


use tokio::sync::oneshot;
use tokio::time::Instant;

pub use self::state::LeaveState;
use crate::controller::RaftContext;
use crate::controller::StateMachine;
use crate::controller::Transition;
use crate::error::ControllerError;
use crate::error::LeaveError;
use crate::membership::Candidates;
use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::message::LeaveRequest;
use crate::message::LeaveResponse;
use crate::network::PendingResponse;
use crate::raft_state::ServerState;
use crate::RaftMetaStore;
use crate::RaftNetwork;
use crate::RaftTypeConfig;

/// Sends leave requests to the other members in turn until one of them confirms.
///
/// Unlike joining, leaving never gives up on its own: a member that wants to leave keeps trying
/// until it succeeds or is closed.
pub struct LeaveController {
    sm: StateMachine<LeaveState>,

    candidates: Candidates,
    target: Option<Endpoint>,
    pending: Option<PendingResponse<LeaveResponse>>,

    retry_at: Option<Instant>,

    configuration: Option<Configuration>,
    failure: Option<LeaveError>,
    result_tx: Option<oneshot::Sender<Result<Configuration, LeaveError>>>,
}

impl Default for LeaveController {
    fn default() -> Self {
        Self::new()
    }
}

impl LeaveController {
    pub fn new() -> Self {
        Self {
            sm: StateMachine::new("LeaveController"),
            candidates: Candidates::default(),
            target: None,
            pending: None,
            retry_at: None,
            configuration: None,
            failure: None,
            result_tx: None,
        }
    }

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
    ) -> Result<oneshot::Receiver<Result<Configuration, LeaveError>>, ControllerError> {
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
                LeaveState::Closed => None,
                LeaveState::OpenRequest => self.open_request(ctx),
                LeaveState::AwaitResponse => self.await_response(ctx),
                LeaveState::Left | LeaveState::Failed => None,
                LeaveState::Closing => self.closing(),
            };

            match transition {
                Some(t) if self.sm.take(t) => work += 1,
                _ => return work,
            }
        }
    }

    pub fn state(&self) -> LeaveState {
        self.sm.current()
    }

    pub fn is_closed(&self) -> bool {
        self.sm.is_closed()
    }

    pub fn is_left(&self) -> bool {
        self.sm.current() == LeaveState::Left
    }

    pub fn is_failed(&self) -> bool {
        self.sm.current() == LeaveState::Failed
    }

    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    pub fn failure(&self) -> Option<&LeaveError> {
        self.failure.as_ref()
    }

    fn reset(&mut self) {
        self.candidates = Candidates::default();
        self.target = None;
        self.pending = None;
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
            return Some(self.fail(LeaveError::NoCandidates));
        };

        let req = LeaveRequest {
            member: ctx.state.me().clone(),
        };

        tracing::debug!(target_node = display(&target), request = display(&req), "send leave");

        match ctx.network.send_leave(&target, req) {
            Ok(pending) => {
                self.target = Some(target);
                self.pending = Some(pending);
                Some(Transition::Default)
            }
            Err(e) => {
                tracing::warn!(target_node = display(&target), error = display(&e), "failed to send leave");

                self.schedule_retry(ctx);
                None
            }
        }
    }

    fn await_response<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let res = self.pending.as_mut()?.try_take()?;
        self.pending = None;

        let target = self.target.take()?;

        match res {
            Ok(resp) if resp.succeeded => Some(self.left(ctx, &target, resp)),
            Ok(resp) => {
                tracing::info!(target_node = display(&target), response = display(&resp), "leave rejected");

                self.schedule_retry(ctx);
                Some(Transition::Next)
            }
            Err(e) => {
                tracing::warn!(target_node = display(&target), error = display(&e), "leave got no answer");

                self.schedule_retry(ctx);
                Some(Transition::Next)
            }
        }
    }

    fn left<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
        target: &Endpoint,
        resp: LeaveResponse,
    ) -> Transition {
        tracing::info!(target_node = display(target), response = display(&resp), "left cluster");

        ctx.adopt_term(resp.term);
        if let Err(e) = ctx.meta.save_configuration(&resp.configuration) {
            return self.fail(LeaveError::Storage(e));
        }

        ctx.state.apply_configuration(resp.configuration.clone());

        ctx.state.set_server_state(ServerState::Left);

        self.configuration = Some(resp.configuration.clone());
        self.resolve(Ok(resp.configuration));
        Transition::Default
    }

    fn schedule_retry<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) {
        self.retry_at = Some(ctx.now + ctx.config.membership_retry_interval());
    }

    fn closing(&mut self) -> Option<Transition> {
        self.resolve(Err(LeaveError::Closed));
        self.pending = None;
        self.target = None;
        Some(Transition::Default)
    }

    fn fail(&mut self, err: LeaveError) -> Transition {
        tracing::warn!(error = display(&err), "leave failed");

        self.resolve(Err(err.clone()));
        self.failure = Some(err);
        Transition::Fail
    }

    fn resolve(&mut self, res: Result<Configuration, LeaveError>) {
        if let Some(tx) = self.result_tx.take() {
            let _ = tx.send(res);
        }
    }
}
