use crate::network::RaftNetwork;
use crate::storage::RaftLog;
use crate::storage::RaftMetaStore;

/// Bundles the collaborator types a node is built from.
///
/// Controllers are generic over a `RaftTypeConfig` so that a single type parameter carries the log,
/// transport and meta store implementations through every tick.
pub trait RaftTypeConfig: Sized + 'static {
    /// The local replicated log.
    type Log: RaftLog;

    /// Request/response and fire-and-forget transport to other members.
    type Network: RaftNetwork;

    /// Persistent storage for term and configuration.
    type Meta: RaftMetaStore;
}
