use std::fmt;

/// The events that move a controller from one state to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(derive_more::Display)]
pub enum Transition {
    /// Start a new operation; only accepted in the closed state.
    Open,

    /// The state's work is done; go on with the regular next state.
    Default,

    /// An alternative next state, e.g. retry or skip.
    Next,

    Fail,

    /// Tear down the operation. Accepted from every state except closed.
    Close,
}

/// A state enum with its transition table.
pub trait TransitionTable: Copy + Eq + fmt::Debug + fmt::Display {
    /// The initial state, in which a controller is idle.
    const CLOSED: Self;

    /// The state to move to on `transition`, or `None` if the transition is not defined for this
    /// state.
    fn next(self, transition: Transition) -> Option<Self>;
}

/// Holds the current state of a controller and applies transitions to it.
#[derive(Debug, Clone)]
pub struct StateMachine<S> {
    name: &'static str,
    current: S,
}

impl<S> StateMachine<S>
where S: TransitionTable
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            current: S::CLOSED,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn current(&self) -> S {
        self.current
    }

    pub fn is_closed(&self) -> bool {
        self.current == S::CLOSED
    }

    /// Apply `transition`. Returns `false` and stays put if the current state does not define it.
    pub fn take(&mut self, transition: Transition) -> bool {
        let Some(next) = self.current.next(transition) else {
            return false;
        };

        tracing::debug!(
            controller = self.name,
            from = display(self.current),
            to = display(next),
            transition = display(transition),
            "transit"
        );

        self.current = next;
        true
    }
}
