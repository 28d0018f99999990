use crate::controller::Transition;
use crate::controller::TransitionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum ConfigureState {
    Closed,
    Schedule,
    PrepareRequest,
    OpenRequest,
    AwaitResponse,
    Closing,
}

impl TransitionTable for ConfigureState {
    const CLOSED: Self = ConfigureState::Closed;

    fn next(self, transition: Transition) -> Option<Self> {
        use ConfigureState::*;
        use Transition as T;

        let next = match (self, transition) {
            (Closed, T::Open) => Schedule,

            (Schedule, T::Default) => PrepareRequest,

            (PrepareRequest, T::Default) => OpenRequest,

            (OpenRequest, T::Default) => AwaitResponse,
            (OpenRequest, T::Next) => Schedule,

            (AwaitResponse, T::Default) => Schedule,

            (Closing, T::Default) => Closed,
            (Closing, _) | (Closed, _) => return None,

            (_, T::Close) => Closing,

            _ => return None,
        };

        Some(next)
    }
}
