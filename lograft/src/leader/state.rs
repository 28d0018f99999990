use crate::controller::Transition;
use crate::controller::TransitionTable;

/// Phases of a leader's term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum LeaderPhase {
    Closed,
    OpenAppendController,
    AppendInitialEntry,
    OpenConfigurationController,
    AppendConfigurationEntry,

    /// The initial entry and the re-appended configuration are in the local log.
    Initialized,

    Failed,
    CloseControllers,
    Closing,
}

impl TransitionTable for LeaderPhase {
    const CLOSED: Self = LeaderPhase::Closed;

    fn next(self, transition: Transition) -> Option<Self> {
        use LeaderPhase::*;
        use Transition as T;

        let next = match (self, transition) {
            (Closed, T::Open) => OpenAppendController,

            (OpenAppendController, T::Default) => AppendInitialEntry,

            (AppendInitialEntry, T::Default) => OpenConfigurationController,
            (AppendInitialEntry, T::Fail) => Failed,

            (OpenConfigurationController, T::Default) => AppendConfigurationEntry,

            (AppendConfigurationEntry, T::Default) => Initialized,
            (AppendConfigurationEntry, T::Fail) => Failed,

            (CloseControllers, T::Default) => Closing,
            (CloseControllers, _) => return None,

            (Closing, T::Default) => Closed,
            (Closing, _) | (Closed, _) => return None,

            (_, T::Close) => CloseControllers,

            _ => return None,
        };

        Some(next)
    }
}
