/// A controller was asked to start an operation while a previous one is still in flight.
///
/// This is a violation of the calling contract: `open()` is only legal on a closed controller.
/// It is returned immediately and the controller is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControllerError {
    #[error("{controller} can not be opened in state {state}: it is not closed")]
    NotClosed { controller: &'static str, state: String },
}

impl ControllerError {
    pub(crate) fn not_closed(controller: &'static str, state: impl ToString) -> Self {
        Self::NotClosed {
            controller,
            state: state.to_string(),
        }
    }
}
