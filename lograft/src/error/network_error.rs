use anyerror::AnyError;

use crate::membership::Endpoint;

/// Failure of the transport to deliver a request or its response.
///
/// Transport failures are always recoverable: the owning controller either fails its quorum vote
/// or counts a failure on the member and retries later.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    /// The target could not be reached.
    #[error("endpoint {target} is unreachable")]
    Unreachable { target: Endpoint },

    /// The request was dropped before a response arrived.
    #[error("request channel closed before a response arrived")]
    Closed,

    /// The remote end failed to handle the request.
    #[error("remote error: {0}")]
    Remote(AnyError),
}

impl NetworkError {
    pub fn unreachable(target: &Endpoint) -> Self {
        Self::Unreachable { target: target.clone() }
    }
}
