//! The state of a node that the consensus controllers read and update.

mod server_state;


use std::fmt;
use std::sync::Arc;

pub use self::server_state::ServerState;
use crate::display_ext::DisplayOptionExt;
use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::membership::Member;
use crate::membership::Members;
use crate::LogPosition;
use crate::Term;

/// Everything a node knows about itself and the cluster.
///
/// `RaftState` is the single owner of the per-member bookkeeping; controllers only keep the
/// [`Endpoint`] of the member they work on and look it up here on every tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaftState {
    me: Endpoint,

    term: Term,

    /// The member this node voted for in `term`.
    voted_for: Option<Endpoint>,

    server_state: ServerState,

    leader: Option<Endpoint>,

    /// The highest position known to be replicated to a majority.
    commit_position: Option<LogPosition>,

    configuration: Arc<Configuration>,

    members: Members,
}

impl fmt::Display for RaftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{{term: {}, {}, leader: {}, commit: {}, configuration: {}}}",
            self.me,
            self.term,
            self.server_state,
            self.leader.display(),
            self.commit_position.display(),
            self.configuration
        )
    }
}

impl RaftState {
    pub fn new(me: Endpoint, configuration: Configuration) -> Self {
        let members = Members::new(configuration.members());

        Self {
            me,
            term: 0,
            voted_for: None,
            server_state: ServerState::default(),
            leader: None,
            commit_position: None,
            configuration: Arc::new(configuration),
            members,
        }
    }

    pub fn me(&self) -> &Endpoint {
        &self.me
    }

    pub fn term(&self) -> Term {
        self.term
    }

    pub fn voted_for(&self) -> Option<&Endpoint> {
        self.voted_for.as_ref()
    }

    pub fn server_state(&self) -> ServerState {
        self.server_state
    }

    pub fn set_server_state(&mut self, server_state: ServerState) {
        tracing::debug!(from = display(self.server_state), to = display(server_state), "set server state");
        self.server_state = server_state;
    }

    pub fn leader(&self) -> Option<&Endpoint> {
        self.leader.as_ref()
    }

    pub fn commit_position(&self) -> Option<LogPosition> {
        self.commit_position
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn members(&self) -> &Members {
        &self.members
    }

    pub fn member(&self, endpoint: &Endpoint) -> Option<&Member> {
        self.members.get(endpoint)
    }

    pub fn member_mut(&mut self, endpoint: &Endpoint) -> Option<&mut Member> {
        self.members.get_mut(endpoint)
    }

    /// Adopt `term` if it is higher than the current one. Returns whether the term changed.
    ///
    /// The vote cast in the previous term does not carry over.
    pub fn update_term(&mut self, term: Term) -> bool {
        if term <= self.term {
            return false;
        }

        tracing::debug!(from = display(self.term), to = display(term), "update term");

        self.term = term;
        self.voted_for = None;
        true
    }

    pub fn vote_for(&mut self, candidate: Endpoint) {
        self.voted_for = Some(candidate);
    }

    /// Move the commit position forward. A position at or before the current one is ignored.
    pub fn set_commit_position(&mut self, position: LogPosition) -> bool {
        if Some(position) <= self.commit_position {
            return false;
        }

        self.commit_position = Some(position);
        true
    }

    /// Make `configuration` the current one.
    ///
    /// Members that are still part of the cluster keep their bookkeeping.
    pub fn apply_configuration(&mut self, configuration: Configuration) {
        tracing::info!(
            me = display(&self.me),
            from = display(&self.configuration),
            to = display(&configuration),
            "apply configuration"
        );

        self.members.sync(configuration.members());
        self.configuration = Arc::new(configuration);
    }

    pub fn become_follower(&mut self, leader: Option<Endpoint>) {
        self.set_server_state(ServerState::Follower);
        self.leader = leader;
    }

    /// Start campaigning in the next term, voting for itself.
    pub fn become_candidate(&mut self) -> Term {
        self.term += 1;
        self.voted_for = Some(self.me.clone());
        self.leader = None;
        self.set_server_state(ServerState::Candidate);
        self.term
    }

    pub fn become_leader(&mut self) {
        self.leader = Some(self.me.clone());
        self.set_server_state(ServerState::Leader);
    }

    /// Number of members that form a majority of the current configuration.
    pub fn quorum_size(&self) -> usize {
        self.configuration.quorum()
    }

    /// Whether this node is a member of the current configuration.
    pub fn is_member(&self) -> bool {
        self.configuration.contains(&self.me)
    }

    /// All members of the current configuration except this node.
    pub fn followers(&self) -> Vec<Endpoint> {
        self.configuration.members().iter().filter(|m| **m != self.me).cloned().collect()
    }
}
