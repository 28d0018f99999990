/// The role a node currently plays in the cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum ServerState {
    /// The node is replicating logs from the leader.
    #[default]
    Follower,
    /// The node is campaigning to become the cluster leader.
    Candidate,
    /// The node is the cluster leader.
    Leader,
    /// The node is asking a running cluster to accept it as a member.
    Joining,
    /// The node has left the cluster.
    Left,
}

impl ServerState {
    pub fn is_follower(&self) -> bool {
        matches!(self, Self::Follower)
    }

    pub fn is_candidate(&self) -> bool {
        matches!(self, Self::Candidate)
    }

    pub fn is_leader(&self) -> bool {
        matches!(self, Self::Leader)
    }

    pub fn is_joining(&self) -> bool {
        matches!(self, Self::Joining)
    }

    pub fn is_left(&self) -> bool {
        matches!(self, Self::Left)
    }
}
