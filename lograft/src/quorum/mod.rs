//! A quorum counts the answers of a fixed set of peers against a required majority.
//!
//! The most common quorum is **majority**: `n/2+1` of `n` peers. One [`Quorum`] lives for exactly
//! one round of requests, e.g. an election or a pre-vote poll.

#[allow(clippy::module_inception)]
mod quorum;
mod util;


pub use self::quorum::Quorum;
pub use self::quorum::QuorumDecision;
pub(crate) use self::util::majority_of;
