//! Per-peer request-vote and request-poll exchanges.

mod ballot;
mod state;

#[cfg(test)] mod election_test;

use std::marker::PhantomData;

pub use self::ballot::Ballot;
pub use self::ballot::Poll;
pub use self::ballot::Vote;
pub use self::state::ElectionState;
use crate::controller::RaftContext;
use crate::controller::StateMachine;
use crate::controller::Transition;
use crate::error::ControllerError;
use crate::membership::Endpoint;
use crate::network::PendingResponse;
use crate::quorum::Quorum;
use crate::RaftLog;
use crate::RaftTypeConfig;

/// Asks one peer for its vote and reports the answer to the round's [`Quorum`].
pub type VoteController = ElectionController<Vote>;

/// Asks one peer whether it would vote, before campaigning, and reports the answer to the
/// round's [`Quorum`].
pub type PollController = ElectionController<Poll>;

/// Drives a single election request to one peer.
///
/// The vote and the poll exchange share everything except the message types and the reaction to
/// a higher term; see [`Ballot`].
pub struct ElectionController<B: Ballot> {
    sm: StateMachine<ElectionState>,

    target: Endpoint,

    request: Option<B::Request>,
    pending: Option<PendingResponse<B::Response>>,
    response: Option<B::Response>,

    _p: PhantomData<B>,
}

impl<B: Ballot> ElectionController<B> {
    pub fn new(target: Endpoint) -> Self {
        Self {
            sm: StateMachine::new(B::NAME),
            target,
            request: None,
            pending: None,
            response: None,
            _p: PhantomData,
        }
    }

    pub fn target(&self) -> &Endpoint {
        &self.target
    }

    pub fn open(&mut self) -> Result<(), ControllerError> {
        if !self.sm.is_closed() {
            return Err(ControllerError::not_closed(self.sm.name(), self.sm.current()));
        }

        self.reset();
        self.sm.take(Transition::Open);
        Ok(())
    }

    /// Close the exchange, dropping the in-flight request if any.
    pub fn close(&mut self) {
        self.sm.take(Transition::Close);
    }

    pub fn close_forcibly<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>, quorum: &mut Quorum) {
        self.close();
        while !self.is_closed() {
            if self.do_work(ctx, quorum) == 0 {
                break;
            }
        }
    }

    pub fn do_work<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>, quorum: &mut Quorum) -> usize {
        let mut work = 0;

        loop {
            let transition = match self.sm.current() {
                ElectionState::Closed => None,
                ElectionState::PrepareRequest => self.prepare_request(ctx),
                ElectionState::OpenRequest => self.open_request(ctx, quorum),
                ElectionState::AwaitResponse => self.await_response(quorum),
                ElectionState::ProcessResponse => self.process_response(ctx, quorum),
                ElectionState::ResponseAvailable | ElectionState::Failed => None,
                ElectionState::Closing => self.closing(),
            };

            match transition {
                Some(t) if self.sm.take(t) => work += 1,
                _ => return work,
            }
        }
    }

    pub fn state(&self) -> ElectionState {
        self.sm.current()
    }

    pub fn is_closed(&self) -> bool {
        self.sm.is_closed()
    }

    pub fn is_failed(&self) -> bool {
        self.sm.current() == ElectionState::Failed
    }

    pub fn is_response_available(&self) -> bool {
        self.sm.current() == ElectionState::ResponseAvailable
    }

    pub fn response(&self) -> Option<&B::Response> {
        self.response.as_ref()
    }

    fn reset(&mut self) {
        self.request = None;
        self.pending = None;
        self.response = None;
    }

    fn prepare_request<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let last_entry = ctx.log.last_entry_id();
        self.request = Some(B::build_request(ctx.state, last_entry));
        Some(Transition::Default)
    }

    fn open_request<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
        quorum: &mut Quorum,
    ) -> Option<Transition> {
        let request = self.request.take()?;

        tracing::debug!(target_node = display(&self.target), request = display(&request), "send {}", B::NAME);

        match B::send(ctx.network, &self.target, request) {
            Ok(pending) => {
                self.pending = Some(pending);
                Some(Transition::Default)
            }
            Err(e) => {
                tracing::warn!(target_node = display(&self.target), error = display(&e), "{} failed", B::NAME);

                quorum.fail();
                Some(Transition::Fail)
            }
        }
    }

    fn await_response(&mut self, quorum: &mut Quorum) -> Option<Transition> {
        let res = self.pending.as_mut()?.try_take()?;
        self.pending = None;

        match res {
            Ok(resp) => {
                self.response = Some(resp);
                Some(Transition::Default)
            }
            Err(e) => {
                tracing::warn!(target_node = display(&self.target), error = display(&e), "{} failed", B::NAME);

                quorum.fail();
                Some(Transition::Fail)
            }
        }
    }

    fn process_response<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
        quorum: &mut Quorum,
    ) -> Option<Transition> {
        let resp = self.response.as_ref()?;
        let term = B::response_term(resp);

        tracing::debug!(target_node = display(&self.target), response = display(resp), "{} response", B::NAME);

        if term > ctx.state.term() {
            ctx.adopt_term(term);

            if B::STEP_DOWN_ON_HIGHER_TERM {
                quorum.stepdown();
            } else {
                quorum.fail();
            }
        } else if !B::is_granted(resp) || term != ctx.state.term() {
            quorum.fail();
        } else {
            quorum.succeed();
        }

        Some(Transition::Default)
    }

    fn closing(&mut self) -> Option<Transition> {
        self.reset();
        Some(Transition::Default)
    }
}
