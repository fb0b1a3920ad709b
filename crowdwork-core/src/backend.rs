use async_trait::async_trait;
use thiserror::Error;

use crate::{AuthStatus, ChatMessage, DjProfile, RequestStatus, SongRequest};

pub type BackendResult<T> = std::result::Result<T, BackendError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum BackendError {
    /// The request never got a response
    #[error("Network error: {0}")]
    Network(String),
    /// The backend answered with a non-success status
    #[error("{message}")]
    Rejected {
        status: u16,
        /// The error reported by the backend, verbatim
        message: String,
    },
    /// The backend answered with something that could not be understood
    #[error("Unexpected response: {0}")]
    Decode(String),
}

/// Represents the backend REST API a session is synchronized against
#[async_trait]
pub trait Backend: Send + Sync {
    async fn session_requests(&self, session_id: &str) -> BackendResult<Vec<SongRequest>>;
    async fn session_messages(&self, session_id: &str) -> BackendResult<Vec<ChatMessage>>;
    async fn session_dj(&self, session_id: &str) -> BackendResult<DjProfile>;

    async fn update_status(&self, request_id: &str, status: RequestStatus) -> BackendResult<()>;
    /// Increments the likes of a request, returning the new count
    async fn like_request(&self, request_id: &str) -> BackendResult<u32>;

    async fn check_auth(&self) -> BackendResult<AuthStatus>;
}
