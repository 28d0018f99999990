use std::fmt;

use crate::quorum::majority_of;

/// The outcome of a quorum round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum QuorumDecision {
    /// A majority of the peers succeeded.
    Succeeded,

    /// So many peers failed that a majority can no longer succeed.
    Failed,

    /// A peer reported a higher term; the round is abandoned.
    SteppedDown,
}

/// Tally of successes and failures over a fixed number of peers.
///
/// Each of [`Quorum::succeed`], [`Quorum::fail`] and [`Quorum::stepdown`] returns
/// `Some(decision)` from exactly the call that decides the round. Once decided, a quorum ignores
/// all further calls and keeps its counters unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quorum {
    peers: usize,
    required: usize,
    too_many_failures: usize,

    succeeded: usize,
    failed: usize,

    decision: Option<QuorumDecision>,
}

impl fmt::Display for Quorum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Quorum{{peers: {}, succeeded: {}/{}, failed: {}/{}",
            self.peers, self.succeeded, self.required, self.failed, self.too_many_failures
        )?;

        if let Some(d) = self.decision {
            write!(f, ", decision: {}", d)?;
        }

        write!(f, "}}")
    }
}

impl Quorum {
    pub fn new(peers: usize) -> Self {
        let required = majority_of(peers);

        Self {
            peers,
            required,
            too_many_failures: peers + 1 - required,
            succeeded: 0,
            failed: 0,
            decision: None,
        }
    }

    /// Record one successful peer.
    pub fn succeed(&mut self) -> Option<QuorumDecision> {
        if self.decision.is_some() || self.succeeded + self.failed >= self.peers {
            return None;
        }

        self.succeeded += 1;
        if self.succeeded >= self.required {
            return self.decide(QuorumDecision::Succeeded);
        }

        None
    }

    /// Record one failed peer.
    pub fn fail(&mut self) -> Option<QuorumDecision> {
        if self.decision.is_some() || self.succeeded + self.failed >= self.peers {
            return None;
        }

        self.failed += 1;
        if self.failed >= self.too_many_failures {
            return self.decide(QuorumDecision::Failed);
        }

        None
    }

    /// Abandon the round because a peer knows a higher term.
    pub fn stepdown(&mut self) -> Option<QuorumDecision> {
        if self.decision.is_some() {
            return None;
        }

        self.decide(QuorumDecision::SteppedDown)
    }

    fn decide(&mut self, decision: QuorumDecision) -> Option<QuorumDecision> {
        tracing::debug!(quorum = display(&*self), decision = display(decision), "quorum decided");

        self.decision = Some(decision);
        Some(decision)
    }

    pub fn decision(&self) -> Option<QuorumDecision> {
        self.decision
    }

    pub fn is_decided(&self) -> bool {
        self.decision.is_some()
    }

    pub fn peers(&self) -> usize {
        self.peers
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn too_many_failures(&self) -> usize {
        self.too_many_failures
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}
