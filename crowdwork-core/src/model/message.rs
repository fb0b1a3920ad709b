use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message on a dancefloor. Messages are never edited or removed once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

/// What makes two chat messages the same message
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Id(String),
    /// Used when the backend did not assign an id
    Content {
        message: String,
        created_at: DateTime<Utc>,
    },
}

impl ChatMessage {
    pub fn key(&self) -> MessageKey {
        match &self.id {
            Some(id) => MessageKey::Id(id.clone()),
            None => MessageKey::Content {
                message: self.message.clone(),
                created_at: self.created_at,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_falls_back_to_content() {
        let created_at = Utc::now();
        let message = ChatMessage {
            id: None,
            message: "hello".to_string(),
            created_at,
            sender: None,
        };

        assert_eq!(
            message.key(),
            MessageKey::Content {
                message: "hello".to_string(),
                created_at
            }
        );

        let with_id = ChatMessage {
            id: Some("m1".to_string()),
            ..message
        };

        assert_eq!(with_id.key(), MessageKey::Id("m1".to_string()));
    }
}
