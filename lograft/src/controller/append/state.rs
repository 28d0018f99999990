use crate::controller::Transition;
use crate::controller::TransitionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum AppendState {
    Closed,
    Write,
    Append,
    Commit,
    Appended,
    Committed,
    Failed,
    Closing,
}

impl TransitionTable for AppendState {
    const CLOSED: Self = AppendState::Closed;

    fn next(self, transition: Transition) -> Option<Self> {
        use AppendState::*;
        use Transition as T;

        let next = match (self, transition) {
            (Closed, T::Open) => Write,

            (Write, T::Default) => Append,
            (Write, T::Fail) => Failed,

            (Append, T::Default) => Commit,
            (Append, T::Next) => Appended,
            (Append, T::Fail) => Failed,

            (Commit, T::Default) => Committed,
            (Commit, T::Fail) => Failed,

            (Closing, T::Default) => Closed,
            (Closing, _) | (Closed, _) => return None,

            (_, T::Close) => Closing,

            _ => return None,
        };

        Some(next)
    }
}
