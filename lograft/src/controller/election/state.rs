use crate::controller::Transition;
use crate::controller::TransitionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum ElectionState {
    Closed,
    PrepareRequest,
    OpenRequest,
    AwaitResponse,
    ProcessResponse,
    ResponseAvailable,
    Failed,
    Closing,
}

impl TransitionTable for ElectionState {
    const CLOSED: Self = ElectionState::Closed;

    fn next(self, transition: Transition) -> Option<Self> {
        use ElectionState::*;
        use Transition as T;

        let next = match (self, transition) {
            (Closed, T::Open) => PrepareRequest,

            (PrepareRequest, T::Default) => OpenRequest,

            (OpenRequest, T::Default) => AwaitResponse,
            (OpenRequest, T::Fail) => Failed,

            (AwaitResponse, T::Default) => ProcessResponse,
            (AwaitResponse, T::Fail) => Failed,

            (ProcessResponse, T::Default) => ResponseAvailable,

            (Closing, T::Default) => Closed,
            (Closing, _) | (Closed, _) => return None,

            (_, T::Close) => Closing,

            _ => return None,
        };

        Some(next)
    }
}
