//! Cooperative state machines, one per protocol role.
//!
//! Every controller is an explicit state enum with a transition table, driven by repeated calls
//! to `do_work` from a single driver. `do_work` never blocks: it runs the current state's action
//! and follows the resulting transitions until an action has to wait, and returns the number of
//! transitions taken.
//!
//! All controllers share the same lifecycle: `open` is only legal on a closed controller, `close`
//! is legal at any time and idempotent, and `close_forcibly` additionally drives the controller
//! until it is closed.

mod append;
mod configuration;
mod configure;
mod context;
mod election;
mod join;
mod leave;
mod replication;
mod state_machine;


pub use self::append::AppendController;
pub use self::append::AppendState;
pub use self::configuration::ConfigurationController;
pub use self::configuration::ConfigurationState;
pub use self::configure::ConfigureController;
pub use self::configure::ConfigureState;
pub use self::context::RaftContext;
pub use self::election::Ballot;
pub use self::election::ElectionController;
pub use self::election::ElectionState;
pub use self::election::Poll;
pub use self::election::PollController;
pub use self::election::Vote;
pub use self::election::VoteController;
pub use self::join::JoinController;
pub use self::join::JoinState;
pub use self::leave::LeaveController;
pub use self::leave::LeaveState;
pub use self::replication::ReplicationController;
pub use self::replication::ReplicationState;
pub use self::state_machine::StateMachine;
pub use self::state_machine::Transition;
pub use self::state_machine::TransitionTable;
