use crate::controller::Transition;
use crate::controller::TransitionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum LeaveState {
    Closed,
    OpenRequest,
    AwaitResponse,
    Left,
    Failed,
    Closing,
}

impl TransitionTable for LeaveState {
    const CLOSED: Self = LeaveState::Closed;

    fn next(self, transition: Transition) -> Option<Self> {
        use LeaveState::*;
        use Transition as T;

        let next = match (self, transition) {
            (Closed, T::Open) => OpenRequest,

            (OpenRequest, T::Default) => AwaitResponse,
            (OpenRequest, T::Fail) => Failed,

            (AwaitResponse, T::Default) => Left,
            (AwaitResponse, T::Next) => OpenRequest,
            (AwaitResponse, T::Fail) => Failed,

            (Closing, T::Default) => Closed,
            (Closing, _) | (Closed, _) => return None,

            (_, T::Close) => Closing,

            _ => return None,
        };

        Some(next)
    }
}
