//! Runtime configuration of the consensus controllers.

use std::time::Duration;

use anyerror::AnyError;
use clap::Parser;
use rand::thread_rng;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;

use crate::config::error::ConfigError;

/// The runtime configuration for a node.
///
/// All timeouts are in milliseconds. The default values are chosen for a cluster within one
/// data center.
///
/// Every field can be set from the command line, e.g. `--replication-timeout=200`, or from the
/// matching `LOGRAFT_*` environment variable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Parser)]
pub struct Config {
    /// The application specific name of this cluster.
    #[clap(long, env = "LOGRAFT_CLUSTER_NAME", default_value = "foo")]
    pub cluster_name: String,

    /// The minimum election timeout in milliseconds.
    #[clap(long, env = "LOGRAFT_ELECTION_TIMEOUT_MIN", default_value = "150")]
    pub election_timeout_min: u64,

    /// The maximum election timeout in milliseconds.
    #[clap(long, env = "LOGRAFT_ELECTION_TIMEOUT_MAX", default_value = "300")]
    pub election_timeout_max: u64,

    /// The interval at which a leader sends heartbeats to followers.
    #[clap(long, env = "LOGRAFT_HEARTBEAT_INTERVAL", default_value = "50")]
    pub heartbeat_interval: u64,

    /// The time a replication loop waits after a send before it sends again, even if the follower
    /// has nothing new to receive.
    #[clap(long, env = "LOGRAFT_REPLICATION_TIMEOUT", default_value = "100")]
    pub replication_timeout: u64,

    /// The minimal interval between two configuration pushes to the same member.
    #[clap(long, env = "LOGRAFT_CONFIGURE_TIMEOUT", default_value = "100")]
    pub configure_timeout: u64,

    /// The pause between two join or leave attempts.
    #[clap(long, env = "LOGRAFT_MEMBERSHIP_RETRY_INTERVAL", default_value = "0")]
    pub membership_retry_interval: u64,

    /// How many times a join request may run through the whole candidate list without getting an
    /// answer before the join gives up.
    #[clap(long, env = "LOGRAFT_MAX_JOIN_ROUNDS", default_value = "1")]
    pub max_join_rounds: u64,
}

impl Default for Config {
    fn default() -> Self {
        <Self as Parser>::parse_from(Vec::<&'static str>::new())
    }
}

impl Config {
    /// Generate a new random election timeout within the configured min & max.
    pub fn new_rand_election_timeout(&self) -> u64 {
        thread_rng().gen_range(self.election_timeout_min..self.election_timeout_max)
    }

    pub fn replication_timeout(&self) -> Duration {
        Duration::from_millis(self.replication_timeout)
    }

    pub fn configure_timeout(&self) -> Duration {
        Duration::from_millis(self.configure_timeout)
    }

    pub fn membership_retry_interval(&self) -> Duration {
        Duration::from_millis(self.membership_retry_interval)
    }

    /// Build a `Config` instance from a series of command line arguments.
    ///
    /// The first element in `args` must be the application name.
    pub fn build(args: &[&str]) -> Result<Config, ConfigError> {
        let config = <Self as Parser>::try_parse_from(args).map_err(|e| ConfigError::ParseError {
            source: AnyError::new(&e),
            args: args.iter().map(|x| x.to_string()).collect(),
        })?;
        config.validate()
    }

    /// Validate the state of this config.
    pub fn validate(self) -> Result<Config, ConfigError> {
        if self.election_timeout_min >= self.election_timeout_max {
            return Err(ConfigError::ElectionTimeout {
                min: self.election_timeout_min,
                max: self.election_timeout_max,
            });
        }

        if self.election_timeout_min <= self.heartbeat_interval {
            return Err(ConfigError::ElectionTimeoutLTHeartBeat {
                election_timeout_min: self.election_timeout_min,
                heartbeat_interval: self.heartbeat_interval,
            });
        }

        if self.replication_timeout == 0 {
            return Err(ConfigError::ReplicationTimeoutIs0);
        }

        if self.configure_timeout == 0 {
            return Err(ConfigError::ConfigureTimeoutIs0);
        }

        if self.max_join_rounds == 0 {
            return Err(ConfigError::MaxJoinRoundsIs0);
        }

        Ok(self)
    }
}
