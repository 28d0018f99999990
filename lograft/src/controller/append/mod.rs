//! Writes one entry to the local log and waits until it is durable, and optionally committed.

mod state;


use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

pub use self::state::AppendState;
use crate::controller::RaftContext;
use crate::controller::StateMachine;
use crate::controller::Transition;
use crate::entry::EntryIdOptionExt;
use crate::error::ControllerError;
use crate::error::LogError;
use crate::storage::LogHealth;
use crate::EntryId;
use crate::EntryPayload;
use crate::LogPosition;
use crate::RaftLog;
use crate::RaftTypeConfig;

/// Single-writer protocol for one log entry.
///
/// After [`open`](Self::open) the controller hands the entry to the log, then waits until the
/// log's durable cursor passes the entry. If the caller asked to wait for commit it further waits
/// until the cluster commit position passes the entry.
///
/// A failure the log reports at or before the entry's position, while the entry is not yet
/// durable, fails the append. A later recovery does not undo it. Failures reported before the
/// log accepted the entry do not concern it.
pub struct AppendController {
    sm: StateMachine<AppendState>,

    payload: Option<EntryPayload>,
    wait_for_commit: bool,

    /// Set once the log accepted the write. Never changes until the next `open`.
    entry: Option<EntryId>,

    health: Option<broadcast::Receiver<LogHealth>>,

    failure: Option<LogError>,
}

impl Default for AppendController {
    fn default() -> Self {
        Self::new()
    }
}

impl AppendController {
    pub fn new() -> Self {
        Self {
            sm: StateMachine::new("AppendController"),
            payload: None,
            wait_for_commit: false,
            entry: None,
            health: None,
            failure: None,
        }
    }

    pub fn open(&mut self, payload: EntryPayload, wait_for_commit: bool) -> Result<(), ControllerError> {
        if !self.sm.is_closed() {
            return Err(ControllerError::not_closed(self.sm.name(), self.sm.current()));
        }

        self.reset();
        self.payload = Some(payload);
        self.wait_for_commit = wait_for_commit;

        self.sm.take(Transition::Open);
        Ok(())
    }

    pub fn close(&mut self) {
        self.sm.take(Transition::Close);
    }

    /// Close and drive the controller until it is closed.
    pub fn close_forcibly<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) {
        self.close();
        while !self.is_closed() {
            if self.do_work(ctx) == 0 {
                break;
            }
        }
    }

    pub fn do_work<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> usize {
        let mut work = 0;

        loop {
            let transition = match self.sm.current() {
                AppendState::Closed => None,
                AppendState::Write => self.write(ctx),
                AppendState::Append => self.append(ctx),
                AppendState::Commit => self.commit(ctx),
                AppendState::Appended | AppendState::Committed | AppendState::Failed => None,
                AppendState::Closing => self.closing(),
            };

            match transition {
                Some(t) if self.sm.take(t) => work += 1,
                _ => return work,
            }
        }
    }

    pub fn state(&self) -> AppendState {
        self.sm.current()
    }

    pub fn is_closed(&self) -> bool {
        self.sm.is_closed()
    }

    pub fn is_failed(&self) -> bool {
        self.sm.current() == AppendState::Failed
    }

    /// Whether the entry is durable in the local log.
    pub fn is_appended(&self) -> bool {
        matches!(
            self.sm.current(),
            AppendState::Commit | AppendState::Appended | AppendState::Committed
        )
    }

    pub fn is_committed(&self) -> bool {
        self.sm.current() == AppendState::Committed
    }

    /// The entry written by the current operation, once the log accepted it.
    pub fn entry(&self) -> Option<EntryId> {
        self.entry
    }

    pub fn entry_position(&self) -> Option<LogPosition> {
        self.entry.position()
    }

    pub fn failure(&self) -> Option<&LogError> {
        self.failure.as_ref()
    }

    fn reset(&mut self) {
        self.payload = None;
        self.wait_for_commit = false;
        self.entry = None;
        self.health = None;
        self.failure = None;
    }

    fn write<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let payload = self.payload.clone()?;
        let term = ctx.state.term();

        // Resubscribe on every attempt: events from a rejected attempt concern no entry.
        self.health = Some(ctx.log.subscribe());

        match ctx.log.try_write(term, payload) {
            Ok(position) => {
                let entry = EntryId::new(term, position);
                tracing::debug!(entry = display(entry), "entry written");

                self.entry = Some(entry);
                Some(Transition::Default)
            }
            Err(LogError::Backpressure) => {
                tracing::debug!("log is applying backpressure, retry write on next tick");
                None
            }
            Err(e) => {
                tracing::warn!(error = display(&e), "failed to write entry");

                self.failure = Some(e);
                Some(Transition::Fail)
            }
        }
    }

    fn append<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let position = self.entry_position()?;

        if let Some(failed_at) = self.failed_position() {
            if failed_at <= position {
                tracing::warn!(
                    position = display(position),
                    failed_at = display(failed_at),
                    "log failed before entry became durable"
                );

                self.failure = Some(LogError::Failed { position: failed_at });
                return Some(Transition::Fail);
            }
        }

        if ctx.log.appended_position() < Some(position) {
            return None;
        }

        if self.wait_for_commit {
            Some(Transition::Default)
        } else {
            Some(Transition::Next)
        }
    }

    fn commit<C: RaftTypeConfig>(&mut self, ctx: &mut RaftContext<'_, C>) -> Option<Transition> {
        let position = self.entry_position()?;

        if ctx.state.commit_position() < Some(position) {
            return None;
        }

        Some(Transition::Default)
    }

    fn closing(&mut self) -> Option<Transition> {
        self.payload = None;
        self.health = None;
        Some(Transition::Default)
    }

    /// The lowest position of the log failures published since the last check, if any.
    ///
    /// Drains every pending event so that a failure followed by a recovery is still observed.
    fn failed_position(&mut self) -> Option<LogPosition> {
        let entry = self.entry_position();
        let rx = self.health.as_mut()?;
        let mut failed_at: Option<LogPosition> = None;

        loop {
            match rx.try_recv() {
                Ok(LogHealth::Failed { position }) => {
                    failed_at = Some(failed_at.map_or(position, |p| p.min(position)));
                }
                Ok(LogHealth::Recovered { position }) => {
                    tracing::debug!(position = display(position), "log recovered");
                }
                Err(TryRecvError::Lagged(missed)) => {
                    // Missed events may hold a failure of this entry.
                    tracing::warn!(missed = display(missed), "log health events lost");
                    failed_at = failed_at.into_iter().chain(entry).min();
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return failed_at,
            }
        }
    }
}
