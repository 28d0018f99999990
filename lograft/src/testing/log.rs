use std::collections::BTreeMap;

use anyerror::AnyError;
use tokio::sync::broadcast;

use crate::error::LogError;
use crate::storage::LogHealth;
use crate::Entry;
use crate::EntryId;
use crate::EntryPayload;
use crate::LogPosition;
use crate::RaftLog;
use crate::Term;

/// A log kept in memory.
///
/// By default every write is durable immediately. With [`MemLog::with_manual_flush`] the durable
/// cursor only moves when [`MemLog::flush`] or [`MemLog::flush_to`] is called.
#[derive(Debug)]
pub struct MemLog {
    entries: BTreeMap<LogPosition, Entry>,
    appended: Option<LogPosition>,
    auto_flush: bool,

    backpressure: bool,
    write_error: Option<String>,

    health: broadcast::Sender<LogHealth>,
}

impl Default for MemLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemLog {
    pub fn new() -> Self {
        let (health, _) = broadcast::channel(64);

        Self {
            entries: BTreeMap::new(),
            appended: None,
            auto_flush: true,
            backpressure: false,
            write_error: None,
            health,
        }
    }

    pub fn with_manual_flush() -> Self {
        Self {
            auto_flush: false,
            ..Self::new()
        }
    }

    /// Make every written entry durable.
    pub fn flush(&mut self) {
        self.appended = self.entries.keys().next_back().copied();
    }

    /// Make entries up to `position` durable.
    pub fn flush_to(&mut self, position: LogPosition) {
        let last = self.entries.keys().next_back().copied();
        self.appended = std::cmp::min(Some(position), last).max(self.appended);
    }

    /// Refuse writes with backpressure while `on` is true.
    pub fn set_backpressure(&mut self, on: bool) {
        self.backpressure = on;
    }

    /// Refuse writes with an io error while it is set.
    pub fn set_write_error(&mut self, error: Option<&str>) {
        self.write_error = error.map(|s| s.to_string());
    }

    /// Publish a failure at `position` to all subscribers.
    pub fn fail_at(&mut self, position: LogPosition) {
        self.publish(LogHealth::Failed { position });
    }

    pub fn recover_at(&mut self, position: LogPosition) {
        self.publish(LogHealth::Recovered { position });
    }

    fn publish(&self, event: LogHealth) {
        // No subscriber is not an error: nobody waits on the log.
        let _ = self.health.send(event);
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RaftLog for MemLog {
    fn try_write(&mut self, term: Term, payload: EntryPayload) -> Result<LogPosition, LogError> {
        if self.backpressure {
            return Err(LogError::Backpressure);
        }

        if let Some(msg) = &self.write_error {
            return Err(LogError::Io(AnyError::error(msg)));
        }

        let position = match self.entries.keys().next_back() {
            Some(last) => last + 1,
            None => 0,
        };

        self.entries.insert(position, Entry::new(EntryId::new(term, position), payload));

        if self.auto_flush {
            self.appended = Some(position);
        }

        Ok(position)
    }

    fn appended_position(&self) -> Option<LogPosition> {
        self.appended
    }

    fn subscribe(&self) -> broadcast::Receiver<LogHealth> {
        self.health.subscribe()
    }

    fn entry_at(&self, position: LogPosition) -> Option<Entry> {
        self.entries.get(&position).cloned()
    }

    fn entry_after(&self, position: Option<LogPosition>) -> Option<Entry> {
        let start = match position {
            Some(p) => p + 1,
            None => 0,
        };

        self.entries.range(start..).next().map(|(_, e)| e.clone())
    }

    fn last_entry_id(&self) -> Option<EntryId> {
        self.entries.values().next_back().map(|e| e.id)
    }
}
