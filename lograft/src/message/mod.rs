//! Requests and responses exchanged between members.
//!
//! The wire format is up to the transport; every message derives serde so that a transport can
//! pick any format it likes.

mod append;
mod configure;
mod membership;
mod vote;

pub use self::append::AppendRequest;
pub use self::append::AppendResponse;
pub use self::configure::ConfigureRequest;
pub use self::configure::ConfigureResponse;
pub use self::membership::JoinRequest;
pub use self::membership::JoinResponse;
pub use self::membership::LeaveRequest;
pub use self::membership::LeaveResponse;
pub use self::vote::PollRequest;
pub use self::vote::PollResponse;
pub use self::vote::VoteRequest;
pub use self::vote::VoteResponse;
