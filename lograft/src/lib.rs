#![doc = include_str!("../README.md")]
#![allow(clippy::bool_assert_comparison, clippy::type_complexity)]

macro_rules! func_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let n = &name[..name.len() - 3];
        let nn = n.replace("::{{closure}}", "");
        nn
    }};
}

mod display_ext;
mod type_config;

pub mod candidate;
pub mod config;
pub mod controller;
pub mod entry;
pub mod error;
pub mod leader;
pub mod membership;
pub mod message;
pub mod network;
pub mod quorum;
pub mod raft_state;
pub mod storage;
pub mod testing;

pub use anyerror;
pub use anyerror::AnyError;

pub use crate::candidate::Election;
pub use crate::config::Config;
pub use crate::config::ConfigError;
pub use crate::controller::AppendController;
pub use crate::controller::ConfigurationController;
pub use crate::controller::ConfigureController;
pub use crate::controller::JoinController;
pub use crate::controller::LeaveController;
pub use crate::controller::PollController;
pub use crate::controller::RaftContext;
pub use crate::controller::ReplicationController;
pub use crate::controller::VoteController;
pub use crate::entry::Entry;
pub use crate::entry::EntryId;
pub use crate::entry::EntryPayload;
pub use crate::entry::LogPosition;
pub use crate::entry::Term;
pub use crate::leader::LeaderState;
pub use crate::membership::Configuration;
pub use crate::membership::Endpoint;
pub use crate::membership::Member;
pub use crate::membership::Members;
pub use crate::network::PendingResponse;
pub use crate::network::PendingSend;
pub use crate::network::RaftNetwork;
pub use crate::quorum::Quorum;
pub use crate::quorum::QuorumDecision;
pub use crate::raft_state::RaftState;
pub use crate::raft_state::ServerState;
pub use crate::storage::LogHealth;
pub use crate::storage::RaftLog;
pub use crate::storage::RaftMetaStore;
pub use crate::type_config::RaftTypeConfig;
