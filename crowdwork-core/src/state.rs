use std::collections::HashSet;

use log::debug;

use crate::{
    derive_partitions, ChatMessage, MessageKey, Partitions, RequestStatus, SessionEvent,
    SongRequest,
};

/// The local copy of a session's song requests and chat messages.
///
/// Every mutation source funnels through here, so replays and reorderings of the same
/// events and responses converge on the same lists. Only [SessionState::replace_requests]
/// and [SessionState::replace_messages] may overwrite a list wholesale.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    requests: Vec<SongRequest>,
    messages: Vec<ChatMessage>,
    message_keys: HashSet<MessageKey>,
    /// Source of request revisions
    sequence: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the request list with a fresh baseline from the backend.
    /// Duplicate ids in the response keep their first occurrence.
    pub fn replace_requests(&mut self, requests: Vec<SongRequest>) {
        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(requests.len());

        for mut request in requests {
            if !seen.insert(request.id.clone()) {
                continue;
            }

            request.revision = self.next_revision();
            next.push(request);
        }

        self.requests = next;
    }

    /// Replaces the message list with a fresh baseline from the backend
    pub fn replace_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages.clear();
        self.message_keys.clear();

        for message in messages {
            self.append_message(message);
        }
    }

    /// Applies an event from the real-time channel. Returns true if anything changed.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::NewRequest(request) => self.insert_request(request),
            SessionEvent::StatusUpdate { request_id, status } => {
                self.update_status(&request_id, status)
            }
            SessionEvent::NewMessage(message) => self.append_message(message),
            SessionEvent::CountUpdate { request_id, likes } => self.set_likes(&request_id, likes),
        }
    }

    /// Appends a request unless one with the same id is already known
    pub fn insert_request(&mut self, mut request: SongRequest) -> bool {
        if self.request(&request.id).is_some() {
            debug!("Ignoring duplicate request {}", request.id);
            return false;
        }

        request.revision = self.next_revision();
        self.requests.push(request);

        true
    }

    /// Replaces the status of a known request. Unknown ids are ignored.
    pub fn update_status(&mut self, request_id: &str, status: RequestStatus) -> bool {
        let revision = self.next_revision();

        match self.request_mut(request_id) {
            Some(request) => {
                request.status = status;
                request.revision = revision;
                true
            }
            None => {
                debug!("Ignoring status update for unknown request {}", request_id);
                false
            }
        }
    }

    /// Replaces the like count of a known request. Unknown ids are ignored.
    /// The revision is left alone, likes never decide what is playing.
    pub fn set_likes(&mut self, request_id: &str, likes: u32) -> bool {
        match self.request_mut(request_id) {
            Some(request) => {
                request.likes = likes;
                true
            }
            None => {
                debug!("Ignoring like count for unknown request {}", request_id);
                false
            }
        }
    }

    /// Appends a message unless it was already received
    pub fn append_message(&mut self, message: ChatMessage) -> bool {
        if !self.message_keys.insert(message.key()) {
            debug!("Ignoring duplicate message");
            return false;
        }

        self.messages.push(message);
        true
    }

    pub fn request(&self, request_id: &str) -> Option<&SongRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }

    pub fn requests(&self) -> &[SongRequest] {
        &self.requests
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn partitions(&self) -> Partitions {
        derive_partitions(&self.requests)
    }

    fn request_mut(&mut self, request_id: &str) -> Option<&mut SongRequest> {
        self.requests.iter_mut().find(|r| r.id == request_id)
    }

    fn next_revision(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn queued(id: &str) -> SongRequest {
        SongRequest::new(id, format!("Song {}", id), RequestStatus::Queued)
    }

    fn ids(state: &SessionState) -> Vec<&str> {
        state.requests().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn new_request_is_idempotent_across_reload() {
        let mut state = SessionState::new();

        state.apply(SessionEvent::NewRequest(queued("a")));
        state.apply(SessionEvent::NewRequest(queued("b")));
        state.apply(SessionEvent::NewRequest(queued("a")));

        // The bulk reload already contains the pushed requests
        state.replace_requests(vec![queued("a"), queued("b"), queued("c")]);
        state.apply(SessionEvent::NewRequest(queued("c")));
        state.apply(SessionEvent::NewRequest(queued("b")));

        assert_eq!(ids(&state), vec!["a", "b", "c"]);
    }

    #[test]
    fn interleavings_converge() {
        let events = vec![
            SessionEvent::NewRequest(queued("a")),
            SessionEvent::NewRequest(queued("b")),
            SessionEvent::NewRequest(queued("c")),
            SessionEvent::NewRequest(queued("b")),
        ];

        let mut forward = SessionState::new();
        let mut backward = SessionState::new();

        for event in events.iter().cloned() {
            forward.apply(event);
        }

        for event in events.into_iter().rev() {
            backward.apply(event);
        }

        let mut forward_ids = ids(&forward);
        let mut backward_ids = ids(&backward);
        forward_ids.sort();
        backward_ids.sort();

        assert_eq!(forward_ids, backward_ids);
        assert_eq!(forward_ids.len(), 3);
    }

    #[test]
    fn status_update_for_unknown_id_is_a_no_op() {
        let mut state = SessionState::new();
        state.replace_requests(vec![queued("a")]);

        let changed = state.apply(SessionEvent::StatusUpdate {
            request_id: "ghost".to_string(),
            status: RequestStatus::Playing,
        });

        assert!(!changed);
        assert_eq!(state.requests().len(), 1);
        assert_eq!(state.requests()[0].status, RequestStatus::Queued);
    }

    #[test]
    fn status_update_promotes_to_now_playing() {
        let mut state = SessionState::new();
        state.replace_requests(vec![queued("a")]);

        state.apply(SessionEvent::StatusUpdate {
            request_id: "a".to_string(),
            status: RequestStatus::Playing,
        });

        let partitions = state.partitions();
        let now_playing = partitions.now_playing.expect("a is playing");

        assert_eq!(now_playing.id, "a");
        assert_eq!(now_playing.status, RequestStatus::Playing);
        assert_eq!(now_playing.song, "Song a");
        assert_eq!(now_playing.likes, 0);
        assert!(partitions.active.is_empty());
    }

    #[test]
    fn latest_playing_update_wins() {
        let mut state = SessionState::new();
        state.replace_requests(vec![queued("a"), queued("b")]);

        for id in ["b", "a"] {
            state.apply(SessionEvent::StatusUpdate {
                request_id: id.to_string(),
                status: RequestStatus::Playing,
            });
        }

        let partitions = state.partitions();

        assert_eq!(partitions.now_playing.map(|r| r.id), Some("a".to_string()));
        assert_eq!(partitions.active.len(), 1);
    }

    #[test]
    fn count_update_patches_likes_only() {
        let mut state = SessionState::new();
        state.replace_requests(vec![queued("a")]);

        assert!(state.apply(SessionEvent::CountUpdate {
            request_id: "a".to_string(),
            likes: 12
        }));
        assert!(!state.apply(SessionEvent::CountUpdate {
            request_id: "b".to_string(),
            likes: 1
        }));

        assert_eq!(state.request("a").map(|r| r.likes), Some(12));
    }

    #[test]
    fn count_update_keeps_the_playing_pick() {
        let mut state = SessionState::new();
        state.replace_requests(vec![queued("a"), queued("b")]);

        for id in ["a", "b"] {
            state.apply(SessionEvent::StatusUpdate {
                request_id: id.to_string(),
                status: RequestStatus::Playing,
            });
        }

        let revision = state.request("a").map(|r| r.revision);
        state.apply(SessionEvent::CountUpdate {
            request_id: "a".to_string(),
            likes: 3,
        });

        assert_eq!(state.request("a").map(|r| r.revision), revision);
        assert_eq!(
            state.partitions().now_playing.map(|r| r.id),
            Some("b".to_string())
        );
    }

    #[test]
    fn messages_are_deduplicated_by_id_or_content() {
        let created_at = Utc::now();
        let message = |id: Option<&str>, text: &str, offset: i64| ChatMessage {
            id: id.map(str::to_string),
            message: text.to_string(),
            created_at: created_at + Duration::seconds(offset),
            sender: None,
        };

        let mut state = SessionState::new();
        state.replace_messages(vec![message(Some("m1"), "hello", 0)]);

        assert!(!state.apply(SessionEvent::NewMessage(message(Some("m1"), "hello", 0))));
        assert!(state.apply(SessionEvent::NewMessage(message(None, "hello", 1))));
        assert!(!state.apply(SessionEvent::NewMessage(message(None, "hello", 1))));
        assert!(state.apply(SessionEvent::NewMessage(message(None, "hello", 2))));

        assert_eq!(state.messages().len(), 3);
    }

    #[test]
    fn reload_replaces_rather_than_merges() {
        let mut state = SessionState::new();
        state.replace_requests(vec![queued("a"), queued("b")]);
        state.replace_requests(vec![queued("c")]);

        assert_eq!(ids(&state), vec!["c"]);
    }
}
