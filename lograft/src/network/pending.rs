use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::error::NetworkError;

/// The not yet arrived result of a request handed to the transport.
///
/// Dropping it cancels the request: the transport observes a closed channel on its sender.
#[derive(Debug)]
pub struct PendingResponse<T> {
    rx: oneshot::Receiver<Result<T, NetworkError>>,
}

/// The result of a fire-and-forget send: it only reports whether the message left the node.
pub type PendingSend = PendingResponse<()>;

impl<T> PendingResponse<T> {
    pub fn new(rx: oneshot::Receiver<Result<T, NetworkError>>) -> Self {
        Self { rx }
    }

    /// Create a pending response and the sender the transport completes it with.
    pub fn channel() -> (oneshot::Sender<Result<T, NetworkError>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::new(rx))
    }

    /// Create an already completed response.
    pub fn ready(res: Result<T, NetworkError>) -> Self {
        let (tx, pending) = Self::channel();
        // The receiver is alive, the send can not fail.
        let _ = tx.send(res);
        pending
    }

    /// Check whether the result has arrived, without blocking.
    ///
    /// Returns `None` while the request is still in flight. A transport that dropped the request
    /// without answering yields `Err(NetworkError::Closed)`.
    pub fn try_take(&mut self) -> Option<Result<T, NetworkError>> {
        match self.rx.try_recv() {
            Ok(res) => Some(res),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(NetworkError::Closed)),
        }
    }
}
