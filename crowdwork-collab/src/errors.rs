use crowdwork_core::{BackendError, TransportError, ValidationError};
use thiserror::Error;

pub type SyncResult<T> = Result<T, SyncError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    /// The backend could not be reached or rejected the request
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The input was rejected before anything was sent
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("You already liked this request")]
    AlreadyVoted,
    #[error("A like for this request is already on its way")]
    LikePending,
    #[error("Not subscribed to the session")]
    NotSubscribed,
    #[error("No session is open")]
    NoActiveSession,
    /// The session was closed or switched while the operation was in flight
    #[error("The session changed before the response arrived")]
    Stale,
}

impl SyncError {
    /// Returns true if this was rejected locally, without any network call
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::AlreadyVoted
                | Self::LikePending
                | Self::NotSubscribed
                | Self::NoActiveSession
        )
    }
}
