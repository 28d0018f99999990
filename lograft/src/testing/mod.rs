//! In-memory collaborators and a single-node harness for testing controllers.

mod log;
mod meta;
mod network;

use std::sync::Once;
use std::time::Duration;

use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

pub use self::log::MemLog;
pub use self::meta::MemMetaStore;
pub use self::network::MockNetwork;
pub use self::network::Responder;
pub use self::network::Sent;
use crate::controller::RaftContext;
use crate::membership::Configuration;
use crate::membership::Endpoint;
use crate::Config;
use crate::RaftState;
use crate::RaftTypeConfig;

/// Type config with in-memory collaborators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UTConfig;

impl RaftTypeConfig for UTConfig {
    type Log = MemLog;
    type Network = MockNetwork;
    type Meta = MemMetaStore;
}

/// Build a local endpoint on `port`.
pub fn ep(port: u16) -> Endpoint {
    Endpoint::new("127.0.0.1", port)
}

/// Install a tracing subscriber that writes to the test output, once per process.
///
/// The level is taken from `RUST_LOG`, defaulting to `debug`.
pub fn init_ut_tracing() {
    static START: Once = Once::new();

    START.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(false)
            .try_init();
    });
}

/// A node with in-memory collaborators and a manually advanced clock.
pub struct TestNode {
    pub config: Config,
    pub state: RaftState,
    pub log: MemLog,
    pub network: MockNetwork,
    pub meta: MemMetaStore,
    pub now: Instant,
}

impl TestNode {
    /// A node `me` whose current configuration is `members`, not yet written to the log.
    pub fn new(me: Endpoint, members: Vec<Endpoint>) -> Self {
        Self::with_configuration(me, Configuration::new(None, members))
    }

    pub fn with_configuration(me: Endpoint, configuration: Configuration) -> Self {
        Self {
            config: Config::default(),
            state: RaftState::new(me, configuration),
            log: MemLog::new(),
            network: MockNetwork::new(),
            meta: MemMetaStore::default(),
            now: Instant::now(),
        }
    }

    pub fn ctx(&mut self) -> RaftContext<'_, UTConfig> {
        RaftContext {
            config: &self.config,
            state: &mut self.state,
            log: &mut self.log,
            network: &mut self.network,
            meta: &mut self.meta,
            now: self.now,
        }
    }

    pub fn advance(&mut self, d: Duration) {
        self.now += d;
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}
