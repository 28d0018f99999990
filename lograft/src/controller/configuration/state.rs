use crate::controller::Transition;
use crate::controller::TransitionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum ConfigurationState {
    Closed,
    PrepareConfigurationEntry,
    OpenAppendController,
    AppendConfiguration,
    ApplyConfiguration,
    CommitConfiguration,
    Configured,
    Failed,
    CloseAppendController,
    Closing,
}

impl TransitionTable for ConfigurationState {
    const CLOSED: Self = ConfigurationState::Closed;

    fn next(self, transition: Transition) -> Option<Self> {
        use ConfigurationState::*;
        use Transition as T;

        let next = match (self, transition) {
            (Closed, T::Open) => PrepareConfigurationEntry,

            (PrepareConfigurationEntry, T::Default) => OpenAppendController,

            (OpenAppendController, T::Default) => AppendConfiguration,

            (AppendConfiguration, T::Default) => ApplyConfiguration,
            (AppendConfiguration, T::Fail) => Failed,

            (ApplyConfiguration, T::Default) => CommitConfiguration,
            (ApplyConfiguration, T::Fail) => Failed,

            (CommitConfiguration, T::Default) => Configured,
            (CommitConfiguration, T::Fail) => Failed,

            (CloseAppendController, T::Default) => Closing,
            (CloseAppendController, _) => return None,

            (Closing, T::Default) => Closed,
            (Closing, _) | (Closed, _) => return None,

            (_, T::Close) => CloseAppendController,

            _ => return None,
        };

        Some(next)
    }
}
