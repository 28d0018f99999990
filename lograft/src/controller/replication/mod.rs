//! The continuous loop that keeps one follower's log caught up.

mod state;


use tokio::time::Instant;

pub use self::state::ReplicationState;
use crate::controller::RaftContext;
use crate::controller::StateMachine;
use crate::controller::Transition;
use crate::error::ControllerError;
use crate::membership::Endpoint;
use crate::message::AppendRequest;
use crate::network::PendingSend;
use crate::EntryId;
use crate::RaftLog;
use crate::RaftNetwork;
use crate::RaftTypeConfig;

/// Ships log entries to one follower, one entry per message.
///
/// The loop has no terminal state while open. A failed send only counts a failure on the member
/// and the loop tries again after the replication timeout. While the member has failures, the
/// messages carry no entry and act as heartbeats until the follower answers again.
pub struct ReplicationController {
    sm: StateMachine<ReplicationState>,

    target: Endpoint,

    request: Option<AppendRequest>,
    pending: Option<PendingSend>,

    /// The entry carried by the message in flight.
    sending: Option<EntryId>,

    last_sent: Option<Instant>,
}

impl ReplicationController {
    pub fn new(target: Endpoint) -> Self {
        Self {
            sm: StateMachine::new("ReplicationController"),
            target,
            request: None,
            pending: None,
            sending: None,
            last_sent: None,
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

    /// Close and drive the loop until it is closed.
    pub fn close_forcibly<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) {
        self.close();
        while !self.is_closed() {
            if self.do_work(ctx) == 0 {
                break;
            }
        }
    }

    #[tracing::instrument(level = "debug", skip_all, fields(target_node = %self.target))]
    pub fn do_work<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> usize {
        let mut work = 0;

        loop {
            let transition = match self.sm.current() {
                ReplicationState::Closed => None,
                ReplicationState::PrepareMessage => self.prepare_message(ctx),
                ReplicationState::OpenRequest => self.open_request(ctx),
                ReplicationState::Open => self.open_state(ctx),
                ReplicationState::Schedule => self.schedule(ctx),
                ReplicationState::Closing => self.closing(),
            };

            match transition {
                Some(t) if self.sm.take(t) => work += 1,
                _ => return work,
            }
        }
    }

    pub fn state(&self) -> ReplicationState {
        self.sm.current()
    }

    pub fn is_closed(&self) -> bool {
        self.sm.is_closed()
    }

    pub fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }

    fn reset(&mut self) {
        self.request = None;
        self.pending = None;
        self.sending = None;
        self.last_sent = None;
    }

    fn prepare_message<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let Some(member) = ctx.state.member(&self.target) else {
            tracing::warn!("member is no longer part of the configuration, close replication");
            return Some(Transition::Close);
        };

        let entry = if member.has_failures() {
            None
        } else {
            ctx.log.entry_after(member.current_entry_position())
        };

        self.sending = entry.as_ref().map(|e| e.id);
        self.request = Some(AppendRequest {
            term: ctx.state.term(),
            leader: ctx.state.me().clone(),
            prev_entry: member.current_entry(),
            commit_position: ctx.state.commit_position(),
            entry,
        });

        Some(Transition::Default)
    }

    fn open_request<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let request = self.request.take()?;
        self.last_sent = Some(ctx.now);

        tracing::debug!(request = display(&request), "send append");

        match ctx.network.send_append(&self.target, request) {
            Ok(pending) => {
                self.pending = Some(pending);
                Some(Transition::Default)
            }
            Err(e) => {
                tracing::warn!(error = display(&e), "failed to send append");

                self.on_send_failure(ctx);
                Some(Transition::Next)
            }
        }
    }

    fn open_state<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let res = self.pending.as_mut()?.try_take()?;
        self.pending = None;

        match res {
            Ok(()) => {
                if let Some(sent) = self.sending.take() {
                    if let Some(member) = ctx.state.member_mut(&self.target) {
                        member.set_current_entry(Some(sent));
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = display(&e), "append was not delivered");
                self.on_send_failure(ctx);
            }
        }

        Some(Transition::Default)
    }

    fn schedule<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let member = ctx.state.member(&self.target)?;

        let has_work = !member.has_failures() && member.has_next_entry(&*ctx.log);
        let timed_out = match self.last_sent {
            Some(t) => ctx.now >= t + ctx.config.replication_timeout(),
            None => true,
        };

        if has_work || timed_out {
            Some(Transition::Default)
        } else {
            None
        }
    }

    fn closing(&mut self) -> Option<Transition> {
        self.reset();
        Some(Transition::Default)
    }

    fn on_send_failure<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) {
        self.sending = None;
        if let Some(member) = ctx.state.member_mut(&self.target) {
            member.increment_failures();
        }
    }
}
