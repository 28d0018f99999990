use crate::controller::Transition;
use crate::controller::TransitionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum JoinState {
    Closed,
    OpenRequest,
    AwaitResponse,
    Joined,
    Failed,
    Closing,
}

impl TransitionTable for JoinState {
    const CLOSED: Self = JoinState::Closed;

    fn next(self, transition: Transition) -> Option<Self> {
        use JoinState::*;
        use Transition as T;

        let next = match (self, transition) {
            (Closed, T::Open) => OpenRequest,

            (OpenRequest, T::Default) => AwaitResponse,
            (OpenRequest, T::Fail) => Failed,

            (AwaitResponse, T::Default) => Joined,
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
