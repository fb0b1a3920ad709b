use std::collections::HashMap;

use chrono::{DateTime, Utc};
use crowdwork_core::{ChatMessage, DjProfile, Partitions, RequestId, SessionId};

use super::next_id;

pub type LikeErrorId = u64;

/// A snapshot of everything the presentation layer renders for a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionView {
    pub session_id: Option<SessionId>,
    pub partitions: Partitions,
    pub messages: Vec<ChatMessage>,
    pub profile: Option<DjProfile>,
    pub errors: ErrorSlots,
    /// Like failures per request, only while they are still on display
    pub like_errors: HashMap<RequestId, String>,
    /// Whether the real-time channel is currently delivering events
    pub connected: bool,
}

/// Read failures, one slot per resource so that one failure never hides the others
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSlots {
    pub requests: Option<String>,
    pub messages: Option<String>,
    pub profile: Option<String>,
}

/// A like failure shown next to a single request
#[derive(Debug, Clone)]
pub struct LikeError {
    pub id: LikeErrorId,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl ErrorSlots {
    pub fn is_empty(&self) -> bool {
        self.requests.is_none() && self.messages.is_none() && self.profile.is_none()
    }
}

impl LikeError {
    pub fn new(message: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: next_id(),
            message,
            expires_at,
        }
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}
