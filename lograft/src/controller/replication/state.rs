use crate::controller::Transition;
use crate::controller::TransitionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum ReplicationState {
    Closed,
    PrepareMessage,
    OpenRequest,
    Open,
    Schedule,
    Closing,
}

impl TransitionTable for ReplicationState {
    const CLOSED: Self = ReplicationState::Closed;

    fn next(self, transition: Transition) -> Option<Self> {
        use ReplicationState::*;
        use Transition as T;

        let next = match (self, transition) {
            (Closed, T::Open) => PrepareMessage,

            (PrepareMessage, T::Default) => OpenRequest,

            (OpenRequest, T::Default) => Open,
            (OpenRequest, T::Next) => Schedule,

            (Open, T::Default) => Schedule,

            (Schedule, T::Default) => PrepareMessage,

            (Closing, T::Default) => Closed,
            (Closing, _) | (Closed, _) => return None,

            (_, T::Close) => Closing,

            _ => return None,
        };

        Some(next)
    }
}
