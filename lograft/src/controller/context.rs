use tokio::time::Instant;

use crate::Config;
use crate::RaftMetaStore;
use crate::RaftState;
use crate::RaftTypeConfig;
use crate::Term;

/// Everything a controller may read or update during one tick.
///
/// A context is built by the driver for a single `do_work` call and borrowed by the controller
/// for the duration of that call only.
pub struct RaftContext<'a, C>
where C: RaftTypeConfig
{
    pub config: &'a Config,
    pub state: &'a mut RaftState,
    pub log: &'a mut C::Log,
    pub network: &'a mut C::Network,
    pub meta: &'a mut C::Meta,

    /// The time of this tick. Controllers never read the clock themselves.
    pub now: Instant,
}

impl<'a, C> RaftContext<'a, C>
where C: RaftTypeConfig
{
    /// Adopt a term learned from another member, if it is higher than the local one.
    ///
    /// The new term is persisted; a failure to persist is logged and the in-memory term is kept,
    /// the next term change persists again.
    pub fn adopt_term(&mut self, term: Term) -> bool {
        if !self.state.update_term(term) {
            return false;
        }

        tracing::info!(me = display(self.state.me()), term = display(term), "adopt higher term");

        if let Err(e) = self.meta.save_term(term, None) {
            tracing::warn!(error = display(&e), term = display(term), "failed to persist term");
        }

        true
    }
}
