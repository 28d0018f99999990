//! One round of vote or poll requests against the current configuration.


use std::fmt;

use crate::controller::Ballot;
use crate::controller::ElectionController;
use crate::controller::RaftContext;
use crate::error::ControllerError;
use crate::quorum::Quorum;
use crate::quorum::QuorumDecision;
use crate::RaftTypeConfig;

/// An election round: a [`Quorum`] over the current configuration plus one
/// [`ElectionController`] per other member.
///
/// The local node counts as one success if it is a member of the configuration, so a
/// single-member cluster decides the round as soon as it starts.
pub struct Election<B: Ballot> {
    quorum: Quorum,
    controllers: Vec<ElectionController<B>>,

    /// The decision has been handed to the caller.
    reported: bool,
}

impl<B: Ballot> fmt::Display for Election<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{{}}}", B::NAME, self.quorum)
    }
}

impl<B: Ballot> Election<B> {
    /// Start a round against the current configuration, in the current term.
    pub fn start<C: RaftTypeConfig>(ctx: &mut RaftContext<'_, C>) -> Result<Self, ControllerError> {
        let configuration = ctx.state.configuration().clone();
        let me = ctx.state.me().clone();

        let mut quorum = Quorum::new(configuration.members().len());
        if configuration.contains(&me) {
            quorum.succeed();
        }

        let mut controllers = Vec::with_capacity(configuration.members().len());
        for target in configuration.members().iter().filter(|m| **m != me) {
            let mut c = ElectionController::<B>::new(target.clone());
            c.open()?;
            controllers.push(c);
        }

        let election = Self {
            quorum,
            controllers,
            reported: false,
        };

        tracing::info!(
            me = display(&me),
            term = display(ctx.state.term()),
            election = display(&election),
            "{}",
            func_name!()
        );

        Ok(election)
    }

    /// Advance every peer exchange. Returns the round's decision exactly once.
    pub fn do_work<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<QuorumDecision> {
        for c in self.controllers.iter_mut() {
            c.do_work(ctx, &mut self.quorum);
        }

        if self.reported {
            return None;
        }

        let decision = self.quorum.decision()?;
        self.reported = true;

        tracing::info!(election = display(&*self), decision = display(decision), "election decided");
        Some(decision)
    }

    pub fn quorum(&self) -> &Quorum {
        &self.quorum
    }

    pub fn decision(&self) -> Option<QuorumDecision> {
        self.quorum.decision()
    }

    pub fn controllers(&self) -> &[ElectionController<B>] {
        &self.controllers
    }

    pub fn close(&mut self) {
        for c in self.controllers.iter_mut() {
            c.close();
        }
    }

    pub fn close_forcibly<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) {
        for c in self.controllers.iter_mut() {
            c.close_forcibly(ctx, &mut self.quorum);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.controllers.iter().all(|c| c.is_closed())
    }
}
