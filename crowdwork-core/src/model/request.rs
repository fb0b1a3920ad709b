use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The backend identifier of a song request.
pub type RequestId = String;

/// Where a song request is in its lifecycle. The backend is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Queued,
    Playing,
    Completed,
    Declined,
}

/// A song requested by an attendee of a dancefloor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRequest {
    #[serde(alias = "_id")]
    pub id: RequestId,
    /// Title and artist, as typed or picked by the requester
    pub song: String,
    #[serde(default)]
    pub likes: u32,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Local arrival sequence, bumped whenever this entry is inserted or changed.
    #[serde(skip)]
    pub revision: u64,
}

impl SongRequest {
    pub fn new<I, S>(id: I, song: S, status: RequestStatus) -> Self
    where
        I: Into<RequestId>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            song: song.into(),
            likes: 0,
            status,
            created_at: None,
            revision: 0,
        }
    }

    pub fn with_likes(mut self, likes: u32) -> Self {
        self.likes = likes;
        self
    }
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Playing => "playing",
            Self::Completed => "completed",
            Self::Declined => "declined",
        }
    }
}

impl Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queued" => Ok(Self::Queued),
            "playing" => Ok(Self::Playing),
            "completed" => Ok(Self::Completed),
            "declined" => Ok(Self::Declined),
            other => Err(format!("Unknown request status \"{}\"", other)),
        }
    }
}
