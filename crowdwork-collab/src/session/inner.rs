use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use crowdwork_core::{AuthStatus, DjProfile, RequestId, SessionId, SessionRole, SessionState};

use super::{ErrorSlots, LikeError, SessionView, Subscription, SubscriptionId};

/// Identifies the session an async operation started under.
/// Completions holding an outdated ticket are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub session_id: SessionId,
    pub epoch: u64,
}

/// Everything a synchronizer mutates, behind a single lock
#[derive(Default)]
pub(super) struct Inner {
    pub session: Option<Ticket>,
    /// Bumped every time the active session changes or closes
    pub epoch: u64,
    pub state: SessionState,
    pub profile: Option<DjProfile>,
    pub errors: ErrorSlots,
    pub like_errors: HashMap<RequestId, LikeError>,
    pub pending_likes: HashSet<RequestId>,
    pub subscription: Option<Subscription>,
    pub connected: bool,
    /// Not tied to a session, survives switching
    pub auth: Option<AuthStatus>,
}

impl Inner {
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.session.as_ref() == Some(ticket)
    }

    pub fn is_current_subscription(&self, ticket: &Ticket, id: SubscriptionId) -> bool {
        self.is_current(ticket) && self.subscription.as_ref().map(|s| s.id) == Some(id)
    }

    /// Makes the given session the active one, clearing everything from the previous one
    pub fn activate(&mut self, session_id: &str) -> Ticket {
        if let Some(ticket) = self.session.as_ref().filter(|t| t.session_id == session_id) {
            return ticket.clone();
        }

        self.reset();

        let ticket = Ticket {
            session_id: session_id.to_string(),
            epoch: self.epoch,
        };

        self.session = Some(ticket.clone());
        ticket
    }

    /// Tears down the subscription and clears all session state.
    /// Returns the id of the session that was active, if any.
    pub fn reset(&mut self) -> Option<SessionId> {
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }

        self.epoch += 1;
        self.state = SessionState::new();
        self.profile = None;
        self.errors = ErrorSlots::default();
        self.like_errors.clear();
        self.pending_likes.clear();
        self.connected = false;

        self.session.take().map(|t| t.session_id)
    }

    pub fn role(&self) -> SessionRole {
        match &self.auth {
            Some(auth) => SessionRole::derive(auth, self.profile.as_ref()),
            None => SessionRole::Guest,
        }
    }

    pub fn view(&self, now: DateTime<Utc>) -> SessionView {
        SessionView {
            session_id: self.session.as_ref().map(|t| t.session_id.clone()),
            partitions: self.state.partitions(),
            messages: self.state.messages().to_vec(),
            profile: self.profile.clone(),
            errors: self.errors.clone(),
            like_errors: self
                .like_errors
                .iter()
                .filter(|(_, e)| e.is_visible(now))
                .map(|(id, e)| (id.clone(), e.message.clone()))
                .collect(),
            connected: self.connected,
        }
    }
}
