//! What a node runs while it leads a term.

mod state;


use std::collections::BTreeMap;
use std::fmt;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

pub use self::state::LeaderPhase;
use crate::controller::AppendController;
use crate::controller::ConfigurationController;
use crate::controller::ConfigureController;
use crate::controller::RaftContext;
use crate::controller::ReplicationController;
use crate::controller::StateMachine;
use crate::controller::Transition;
use crate::display_ext::DisplayOptionExt;
use crate::error::ConfigurationError;
use crate::error::ControllerError;
use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::message::AppendResponse;
use crate::message::JoinRequest;
use crate::message::JoinResponse;
use crate::message::LeaveRequest;
use crate::message::LeaveResponse;
use crate::EntryId;
use crate::EntryPayload;
use crate::LogPosition;
use crate::RaftLog;
use crate::RaftTypeConfig;
use crate::Term;

/// Where to deliver the answer to a membership request.
enum Reply {
    Join(oneshot::Sender<JoinResponse>),
    Leave(oneshot::Sender<LeaveResponse>),
}

impl Reply {
    fn send(self, term: Term, succeeded: bool, configuration: Configuration) {
        match self {
            Reply::Join(tx) => {
                let _ = tx.send(JoinResponse {
                    term,
                    succeeded,
                    configuration,
                });
            }
            Reply::Leave(tx) => {
                let _ = tx.send(LeaveResponse {
                    term,
                    succeeded,
                    configuration,
                });
            }
        }
    }
}

/// A join or leave that waits for its configuration change.
struct MembershipRequest {
    member: Endpoint,
    result: oneshot::Receiver<Result<Configuration, ConfigurationError>>,
    reply: Reply,
}

/// The leader of one term.
///
/// On open the leader writes a blank entry, the first entry of its term, and then re-appends the
/// current member list as a configuration entry. Once that entry is in the local log the leader
/// is initialized and accepts membership changes.
///
/// While open it keeps one [`ReplicationController`] and one [`ConfigureController`] running for
/// every other member of the current configuration, and recomputes the commit position on every
/// tick and on every append response.
pub struct LeaderState {
    sm: StateMachine<LeaderPhase>,

    /// The term this leader was opened in.
    term: Term,

    append: AppendController,
    configuration: ConfigurationController,

    replications: BTreeMap<Endpoint, ReplicationController>,
    configures: BTreeMap<Endpoint, ConfigureController>,

    /// The blank entry written on open. Nothing before it is committed by this leader.
    initial_entry: Option<EntryId>,

    /// A member answered with a higher term.
    stepdown: bool,

    membership_requests: Vec<MembershipRequest>,

    failure: Option<ConfigurationError>,
}

impl Default for LeaderState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Leader{{term: {}, {}, initial_entry: {}, replications: {}}}",
            self.term,
            self.sm.current(),
            self.initial_entry.display(),
            self.replications.len()
        )
    }
}

impl LeaderState {
    pub fn new() -> Self {
        Self {
            sm: StateMachine::new("LeaderState"),
            term: 0,
            append: AppendController::new(),
            configuration: ConfigurationController::new(),
            replications: BTreeMap::new(),
            configures: BTreeMap::new(),
            initial_entry: None,
            stepdown: false,
            membership_requests: vec![],
            failure: None,
        }
    }

    /// Start leading. The node is expected to have become leader of the current term.
    pub fn open(&mut self) -> Result<(), ControllerError> {
        if !self.sm.is_closed() {
            return Err(ControllerError::not_closed(self.sm.name(), self.sm.current()));
        }

        self.term = 0;
        self.initial_entry = None;
        self.stepdown = false;
        self.failure = None;
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

    #[tracing::instrument(level = "debug", skip_all, fields(me = %ctx.state.me()))]
    pub fn do_work<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> usize {
        let mut work = 0;

        loop {
            let transition = match self.sm.current() {
                LeaderPhase::Closed => None,
                LeaderPhase::OpenAppendController => self.open_append_controller(ctx),
                LeaderPhase::AppendInitialEntry => self.append_initial_entry(ctx),
                LeaderPhase::OpenConfigurationController => self.open_configuration_controller(ctx),
                LeaderPhase::AppendConfigurationEntry => self.append_configuration_entry(ctx),
                LeaderPhase::Initialized | LeaderPhase::Failed => None,
                LeaderPhase::CloseControllers => self.close_controllers(ctx),
                LeaderPhase::Closing => self.closing(),
            };

            match transition {
                Some(t) if self.sm.take(t) => work += 1,
                _ => break,
            }
        }

        if self.is_running() {
            if self.is_initialized() {
                work += self.run_configuration(ctx);
            }

            work += self.run_peers(ctx);

            if self.update_commit_position(ctx) && self.is_initialized() {
                work += self.run_configuration(ctx);
            }

            work += self.poll_membership_requests(ctx);

            if ctx.state.term() > self.term {
                self.stepdown = true;
            }
        }

        work
    }

    pub fn phase(&self) -> LeaderPhase {
        self.sm.current()
    }

    pub fn is_closed(&self) -> bool {
        self.sm.is_closed()
    }

    pub fn is_initialized(&self) -> bool {
        self.sm.current() == LeaderPhase::Initialized
    }

    pub fn is_failed(&self) -> bool {
        self.sm.current() == LeaderPhase::Failed
    }

    pub fn failure(&self) -> Option<&ConfigurationError> {
        self.failure.as_ref()
    }

    /// Whether a higher term was seen; the driver should close the leader and become a follower.
    pub fn should_step_down(&self) -> bool {
        self.stepdown
    }

    pub fn initial_entry(&self) -> Option<EntryId> {
        self.initial_entry
    }

    pub fn replication(&self, target: &Endpoint) -> Option<&ReplicationController> {
        self.replications.get(target)
    }

    pub fn configure(&self, target: &Endpoint) -> Option<&ConfigureController> {
        self.configures.get(target)
    }

    /// Endpoints that currently have a replication loop.
    pub fn replication_targets(&self) -> Vec<Endpoint> {
        self.replications.keys().cloned().collect()
    }

    /// Whether a configuration change is in flight.
    pub fn is_reconfiguring(&self) -> bool {
        !self.configuration.is_closed()
    }

    /// Account for the answer of a follower to an append request.
    pub fn handle_append_response<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
        from: &Endpoint,
        resp: AppendResponse,
    ) {
        tracing::debug!(from = display(from), response = display(&resp), "{}", func_name!());

        if resp.term > ctx.state.term() {
            tracing::info!(from = display(from), term = display(resp.term), "higher term seen, step down");

            ctx.adopt_term(resp.term);
            self.stepdown = true;
            return;
        }

        let Some(member) = ctx.state.member_mut(from) else {
            tracing::debug!(from = display(from), "append response from a non-member, ignore");
            return;
        };

        member.touch(ctx.now);

        if resp.succeeded {
            member.reset_failures();
            if resp.last_position > member.match_position() {
                member.set_match_position(resp.last_position);
            }
        } else {
            member.increment_failures();
            member.rewind_to(resp.last_position, &*ctx.log);
        }

        self.update_commit_position(ctx);
    }

    /// Add `req.member` to the cluster. The receiver resolves once the change is committed, or at
    /// once if the request is rejected or already satisfied.
    pub fn handle_join<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
        req: JoinRequest,
    ) -> oneshot::Receiver<JoinResponse> {
        let (tx, rx) = oneshot::channel();
        let reply = Reply::Join(tx);

        let current = ctx.state.configuration().as_ref().clone();
        let term = ctx.state.term();

        if current.contains(&req.member) {
            tracing::info!(member = display(&req.member), "already a member");
            reply.send(term, true, current);
            return rx;
        }

        let members = current.with_member(&req.member);
        self.open_membership_change(ctx, req.member, members, reply);
        rx
    }

    /// Remove `req.member` from the cluster. The receiver resolves like in
    /// [`handle_join`](Self::handle_join).
    pub fn handle_leave<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
        req: LeaveRequest,
    ) -> oneshot::Receiver<LeaveResponse> {
        let (tx, rx) = oneshot::channel();
        let reply = Reply::Leave(tx);

        let current = ctx.state.configuration().as_ref().clone();
        let term = ctx.state.term();

        if !current.contains(&req.member) {
            tracing::info!(member = display(&req.member), "not a member");
            reply.send(term, true, current);
            return rx;
        }

        let members = current.without_member(&req.member);
        self.open_membership_change(ctx, req.member, members, reply);
        rx
    }

    /// Answer the membership requests whose configuration change completed.
    pub fn poll_membership_requests<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> usize {
        let term = ctx.state.term();
        let mut answered = 0;

        for mut req in std::mem::take(&mut self.membership_requests) {
            match req.result.try_recv() {
                Ok(Ok(configuration)) => {
                    tracing::info!(member = display(&req.member), configuration = display(&configuration), "membership changed");
                    req.reply.send(term, true, configuration);
                }
                Ok(Err(e)) => {
                    tracing::warn!(member = display(&req.member), error = display(&e), "membership change failed");
                    req.reply.send(term, false, ctx.state.configuration().as_ref().clone());
                }
                Err(TryRecvError::Closed) => {
                    req.reply.send(term, false, ctx.state.configuration().as_ref().clone());
                }
                Err(TryRecvError::Empty) => {
                    self.membership_requests.push(req);
                    continue;
                }
            }

            answered += 1;
        }

        answered
    }

    fn is_running(&self) -> bool {
        matches!(
            self.sm.current(),
            LeaderPhase::OpenAppendController
                | LeaderPhase::AppendInitialEntry
                | LeaderPhase::OpenConfigurationController
                | LeaderPhase::AppendConfigurationEntry
                | LeaderPhase::Initialized
        )
    }

    fn open_membership_change<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
        member: Endpoint,
        members: Vec<Endpoint>,
        reply: Reply,
    ) {
        let term = ctx.state.term();

        if !self.is_initialized() || self.is_reconfiguring() {
            tracing::info!(
                member = display(&member),
                phase = display(self.sm.current()),
                "reject membership change while initializing or reconfiguring"
            );
            reply.send(term, false, ctx.state.configuration().as_ref().clone());
            return;
        }

        match self.configuration.open_async(members) {
            Ok(result) => {
                self.membership_requests.push(MembershipRequest { member, result, reply });
            }
            Err(e) => {
                tracing::warn!(error = display(&e), "failed to open configuration change");
                reply.send(term, false, ctx.state.configuration().as_ref().clone());
            }
        }
    }

    fn open_append_controller<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        self.term = ctx.state.term();

        match self.append.open(EntryPayload::Blank, false) {
            Ok(()) => Some(Transition::Default),
            Err(e) => {
                tracing::warn!(error = display(&e), "append controller busy, retry on next tick");
                None
            }
        }
    }

    fn append_initial_entry<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        self.append.do_work(ctx);

        if self.append.is_failed() {
            let err = match self.append.failure() {
                Some(e) => ConfigurationError::Append(e.clone()),
                None => ConfigurationError::Closed,
            };
            tracing::warn!(error = display(&err), "failed to append initial entry");

            self.failure = Some(err);
            self.append.close_forcibly(ctx);
            return Some(Transition::Fail);
        }

        if !self.append.is_appended() {
            return None;
        }

        self.initial_entry = self.append.entry();
        tracing::info!(leader = display(&*self), "initial entry appended");

        self.append.close_forcibly(ctx);
        Some(Transition::Default)
    }

    fn open_configuration_controller<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
    ) -> Option<Transition> {
        let members = ctx.state.configuration().members().to_vec();

        match self.configuration.open(members) {
            Ok(()) => Some(Transition::Default),
            Err(e) => {
                tracing::warn!(error = display(&e), "configuration controller busy, retry on next tick");
                None
            }
        }
    }

    fn append_configuration_entry<C: RaftTypeConfig>(
        &mut self,
        ctx: &mut RaftContext<'_, C>,
    ) -> Option<Transition> {
        self.configuration.do_work(ctx);

        if self.configuration.is_failed() {
            self.failure = self.configuration.failure().cloned();
            self.configuration.close_forcibly(ctx);
            return Some(Transition::Fail);
        }

        if self.configuration.is_appended() || self.configuration.is_configured() {
            tracing::info!(leader = display(&*self), "leader initialized");
            return Some(Transition::Default);
        }

        None
    }

    /// Drive the configuration change in flight and close it once it is done.
    fn run_configuration<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> usize {
        let mut work = self.configuration.do_work(ctx);

        if self.configuration.is_configured() || self.configuration.is_failed() {
            // Answer the waiting requests before the handle is dropped.
            work += self.poll_membership_requests(ctx);
            self.configuration.close_forcibly(ctx);
            work += 1;
        }

        work
    }

    /// Keep one replication loop and one configure-peer loop per follower of the current
    /// configuration, and drive them.
    fn run_peers<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> usize {
        let followers = ctx.state.followers();
        let mut work = 0;

        let removed = self.replications.keys().filter(|ep| !followers.contains(ep)).cloned().collect::<Vec<_>>();
        for target in removed {
            tracing::info!(target_node = display(&target), "stop replicating to removed member");

            if let Some(mut c) = self.replications.remove(&target) {
                c.close_forcibly(ctx);
            }
            if let Some(mut c) = self.configures.remove(&target) {
                c.close_forcibly(ctx);
            }
            work += 1;
        }

        for target in followers.iter() {
            if self.replications.contains_key(target) {
                continue;
            }

            tracing::info!(target_node = display(target), "start replicating");

            if let Some(member) = ctx.state.member_mut(target) {
                member.reset_to_last_entry(&*ctx.log);
                member.reset_failures();
            }

            let mut replication = ReplicationController::new(target.clone());
            let mut configure = ConfigureController::new(target.clone());

            if let Err(e) = replication.open().and_then(|_| configure.open()) {
                tracing::warn!(target_node = display(target), error = display(&e), "failed to open peer controllers");
                continue;
            }

            self.replications.insert(target.clone(), replication);
            self.configures.insert(target.clone(), configure);
            work += 1;
        }

        for c in self.replications.values_mut() {
            work += c.do_work(ctx);
        }
        for c in self.configures.values_mut() {
            work += c.do_work(ctx);
        }

        work
    }

    /// Move the commit position to the highest position held by a majority of the current
    /// configuration. Returns whether it moved.
    ///
    /// The local node counts with its appended position, if it is a member. Nothing before the
    /// initial entry of this leader is committed by counting replicas.
    pub fn update_commit_position<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> bool {
        let Some(initial) = self.initial_entry else {
            return false;
        };

        let configuration = ctx.state.configuration().clone();
        let me = ctx.state.me();

        let mut positions = configuration
            .members()
            .iter()
            .map(|m| {
                if m == me {
                    ctx.log.appended_position()
                } else {
                    ctx.state.member(m).and_then(|m| m.match_position())
                }
            })
            .collect::<Vec<Option<LogPosition>>>();

        positions.sort_unstable_by(|a, b| b.cmp(a));

        let Some(position) = positions.get(configuration.quorum() - 1).copied().flatten() else {
            return false;
        };

        if position < initial.position {
            return false;
        }

        if !ctx.state.set_commit_position(position) {
            return false;
        }

        tracing::debug!(commit_position = display(position), "commit position advanced");
        true
    }

    fn close_controllers<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        self.append.close_forcibly(ctx);
        self.configuration.close_forcibly(ctx);

        for (_, mut c) in std::mem::take(&mut self.replications) {
            c.close_forcibly(ctx);
        }
        for (_, mut c) in std::mem::take(&mut self.configures) {
            c.close_forcibly(ctx);
        }

        // The configuration handles are resolved by now.
        self.poll_membership_requests(ctx);
        let term = ctx.state.term();
        for req in std::mem::take(&mut self.membership_requests) {
            req.reply.send(term, false, ctx.state.configuration().as_ref().clone());
        }

        Some(Transition::Default)
    }

    fn closing(&mut self) -> Option<Transition> {
        tracing::info!(leader = display(&*self), "leader closed");
        Some(Transition::Default)
    }
}
