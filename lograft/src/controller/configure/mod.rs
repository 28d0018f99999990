//! Pushes the current configuration to one member whose acknowledged configuration lags behind.

mod state;


use tokio::time::Instant;

pub use self::state::ConfigureState;
use crate::controller::RaftContext;
use crate::controller::StateMachine;
use crate::controller::Transition;
use crate::error::ControllerError;
use crate::membership::Endpoint;
use crate::message::ConfigureRequest;
use crate::message::ConfigureResponse;
use crate::network::PendingResponse;
use crate::RaftNetwork;
use crate::RaftTypeConfig;

pub struct ConfigureController {
    sm: StateMachine<ConfigureState>,

    target: Endpoint,

    request: Option<ConfigureRequest>,
    pending: Option<PendingResponse<ConfigureResponse>>,

    last_attempt: Option<Instant>,
}

impl ConfigureController {
    pub fn new(target: Endpoint) -> Self {
        Self {
            sm: StateMachine::new("ConfigureController"),
            target,
            request: None,
            pending: None,
            last_attempt: None,
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
                ConfigureState::Closed => None,
                ConfigureState::Schedule => self.schedule(ctx),
                ConfigureState::PrepareRequest => self.prepare_request(ctx),
                ConfigureState::OpenRequest => self.open_request(ctx),
                ConfigureState::AwaitResponse => self.await_response(ctx),
                ConfigureState::Closing => self.closing(),
            };

            match transition {
                Some(t) if self.sm.take(t) => work += 1,
                _ => return work,
            }
        }
    }

    pub fn state(&self) -> ConfigureState {
        self.sm.current()
    }

    pub fn is_closed(&self) -> bool {
        self.sm.is_closed()
    }

    fn reset(&mut self) {
        self.request = None;
        self.pending = None;
        self.last_attempt = None;
    }

    fn schedule<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let member = ctx.state.member(&self.target)?;

        let lagging = member.config_entry() < ctx.state.configuration().entry();
        if !lagging || member.has_failures() {
            return None;
        }

        if let Some(t) = self.last_attempt {
            if ctx.now < t + ctx.config.configure_timeout() {
                return None;
            }
        }

        Some(Transition::Default)
    }

    fn prepare_request<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        self.request = Some(ConfigureRequest {
            term: ctx.state.term(),
            leader: ctx.state.me().clone(),
            configuration: ctx.state.configuration().as_ref().clone(),
        });

        Some(Transition::Default)
    }

    fn open_request<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let request = self.request.take()?;
        self.last_attempt = Some(ctx.now);

        tracing::debug!(target_node = display(&self.target), request = display(&request), "send configure");

        match ctx.network.send_configure(&self.target, request) {
            Ok(pending) => {
                self.pending = Some(pending);
                Some(Transition::Default)
            }
            Err(e) => {
                tracing::warn!(target_node = display(&self.target), error = display(&e), "failed to send configure");

                self.on_failure(ctx);
                Some(Transition::Next)
            }
        }
    }

    fn await_response<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let res = self.pending.as_mut()?.try_take()?;
        self.pending = None;

        match res {
            Ok(resp) => {
                tracing::debug!(target_node = display(&self.target), response = display(&resp), "configure response");

                ctx.adopt_term(resp.term);

                if let Some(member) = ctx.state.member_mut(&self.target) {
                    member.set_config_entry(resp.configuration_entry);
                }
            }
            Err(e) => {
                tracing::warn!(target_node = display(&self.target), error = display(&e), "configure failed");

                self.on_failure(ctx);
            }
        }

        Some(Transition::Default)
    }

    fn closing(&mut self) -> Option<Transition> {
        self.reset();
        Some(Transition::Default)
    }

    fn on_failure<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) {
        if let Some(member) = ctx.state.member_mut(&self.target) {
            member.increment_failures();
        }
    }
}
