use serde::{Deserialize, Serialize};

use crate::{ChatMessage, RequestId, RequestStatus, SessionId, SongRequest};

/// Events pushed by the real-time channel for a session.
///
/// On the wire every frame is `{"event": "<name>", "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Someone requested a song
    NewRequest(SongRequest),
    /// The DJ moved a request to another status
    #[serde(rename_all = "camelCase")]
    StatusUpdate {
        request_id: RequestId,
        status: RequestStatus,
    },
    /// Someone posted in the chat
    NewMessage(ChatMessage),
    /// The like count of a request changed
    #[serde(rename_all = "camelCase")]
    CountUpdate { request_id: RequestId, likes: u32 },
}

/// Emissions the client sends over the real-time channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEmission {
    /// Joins the event group of a session
    #[serde(rename_all = "camelCase")]
    JoinSession { session_id: SessionId },
    /// Requests a song on a session
    #[serde(rename_all = "camelCase")]
    SongRequest { session_id: SessionId, song: String },
    /// Posts a chat message on a session
    #[serde(rename_all = "camelCase")]
    SendMessage {
        session_id: SessionId,
        message: String,
    },
}

/// What a subscription yields, besides events
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelSignal {
    Event(SessionEvent),
    /// The transport dropped. No events missed in the meantime will be replayed.
    Disconnected { reason: Option<String> },
}

impl SessionEvent {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The name of the event on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewRequest(_) => "newRequest",
            Self::StatusUpdate { .. } => "statusUpdate",
            Self::NewMessage(_) => "newMessage",
            Self::CountUpdate { .. } => "countUpdate",
        }
    }
}

impl ClientEmission {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
