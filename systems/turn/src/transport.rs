//! Contract with the asynchronous turn-exchange service.

use thiserror::Error;

/// Delivers committed turns to the opposing client.
pub trait TurnTransport {
    /// Hands an encoded snapshot to the exchange service.
    ///
    /// Returning an error means the turn was not delivered; the same payload
    /// may be submitted again.
    fn submit_turn(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}

/// Failure reported by a [`TurnTransport`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The service could not be reached.
    #[error("turn exchange is unavailable")]
    Unavailable,
    /// The service refused the payload.
    #[error("turn exchange rejected the payload: {reason}")]
    Rejected {
        /// Explanation supplied by the service.
        reason: String,
    },
}

/// Reasons [`crate::Game::submit`] did not commit a turn.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// No closed turn is waiting for submission.
    #[error("no closed turn is waiting for submission")]
    NothingPending,
    /// The transport did not accept the turn.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
