mod inner;
mod subscription;
mod view;

use std::sync::Arc;

use chrono::Utc;
use crossbeam::{atomic::AtomicCell, channel::unbounded};
use crowdwork_core::{
    validate_message, validate_selection, AuthStatus, Backend, ClientEmission, Config,
    GuardStore, GuardStoreError, RequestStatus, SessionRole, Transport, VoteGuard,
};
use log::{debug, info, warn};
use parking_lot::Mutex;

pub use inner::Ticket;
pub use subscription::*;
pub use view::*;

use crate::{EventReceiver, EventSender, SyncError, SyncEvent, SyncResult};
use inner::Inner;

static NEXT_ID: AtomicCell<u64> = AtomicCell::new(1);

/// Hands out process-local ids for subscriptions and like errors
fn next_id() -> u64 {
    NEXT_ID.fetch_add(1)
}

/// Keeps one consistent local view of a dancefloor session.
///
/// The view is fed by bulk loads, REST mutation responses, and the real-time channel.
/// Only one session is active at a time; switching or closing discards anything still
/// in flight for the previous one.
pub struct Synchronizer<B, T>
where
    B: Backend + 'static,
    T: Transport + 'static,
{
    context: SyncContext<B, T>,
    event_receiver: EventReceiver,
}

/// A type passed to subscription tasks and handles, to access state and emit events.
pub struct SyncContext<B, T> {
    pub config: Config,

    backend: Arc<B>,
    transport: Arc<T>,
    guard: Arc<Mutex<VoteGuard>>,
    inner: Arc<Mutex<Inner>>,

    event_sender: EventSender,
}

impl<B, T> Synchronizer<B, T>
where
    B: Backend + 'static,
    T: Transport + 'static,
{
    pub fn new<S>(config: Config, backend: B, transport: T, guard_store: S) -> Result<Self, GuardStoreError>
    where
        S: GuardStore + 'static,
    {
        let (event_sender, event_receiver) = unbounded();
        let guard = VoteGuard::open(guard_store, config.vote_window(), Utc::now())?;

        let context = SyncContext {
            config,
            backend: Arc::new(backend),
            transport: Arc::new(transport),
            guard: Arc::new(Mutex::new(guard)),
            inner: Default::default(),
            event_sender,
        };

        Ok(Self {
            context,
            event_receiver,
        })
    }

    /// Fetches requests, messages, and the DJ profile of a session.
    ///
    /// Each resource that loads replaces its local copy. Each one that fails keeps the
    /// previous copy and fills its own error slot. Loading a different session than the
    /// active one switches to it.
    pub async fn load_initial_state(&self, session_id: &str) -> SyncResult<SessionView> {
        let ticket = self.context.inner.lock().activate(session_id);
        self.context.refresh(&ticket).await
    }

    /// Opens the real-time channel and joins the session's event group.
    /// Any previous subscription is torn down first.
    pub async fn subscribe(&self, session_id: &str) -> SyncResult<SubscriptionHandle<B, T>> {
        let ticket = {
            let mut inner = self.context.inner.lock();
            let ticket = inner.activate(session_id);

            if let Some(previous) = inner.subscription.take() {
                info!("Replacing subscription {} of session {}", previous.id, session_id);
                previous.close();
                inner.connected = false;
            }

            ticket
        };

        let channel = self.context.transport.open().await?;
        channel.emit(ClientEmission::JoinSession {
            session_id: session_id.to_string(),
        })?;

        let mut inner = self.context.inner.lock();

        if !inner.is_current(&ticket) {
            return Err(SyncError::Stale);
        }

        // Another subscribe may have finished while this one was connecting
        if let Some(previous) = inner.subscription.take() {
            previous.close();
        }

        let id = next_id();
        let task = tokio::spawn(run_subscription(
            self.context.clone(),
            ticket,
            id,
            channel.incoming,
        ));

        inner.subscription = Some(Subscription::new(id, channel.outgoing, task));
        inner.connected = true;

        info!("Subscribed to session {}", session_id);

        let view = inner.view(Utc::now());
        drop(inner);

        self.context.emit(SyncEvent::ViewUpdated(view));

        Ok(SubscriptionHandle::new(&self.context, id))
    }

    /// Moves a request to another status, then reloads the session.
    ///
    /// The mutation response is not trusted to reflect concurrent pushes by others,
    /// so the whole session is fetched again instead of patching locally.
    pub async fn request_status_change(
        &self,
        request_id: &str,
        status: RequestStatus,
    ) -> SyncResult<SessionView> {
        let ticket = self.context.ticket()?;

        self.context
            .backend
            .update_status(request_id, status)
            .await?;

        info!("Request {} is now {}", request_id, status);

        self.context.refresh(&ticket).await
    }

    /// Likes a request once per vote window, returning the new like count.
    ///
    /// A repeated like fails without contacting the backend. On success only the liked
    /// request's count is patched locally. Failures show next to the request for a
    /// short while and leave the request likeable.
    pub async fn like_request(&self, request_id: &str) -> SyncResult<u32> {
        let ticket = self.context.ticket()?;

        // Guard and pending set are checked under one lock
        let claim = {
            let mut inner = self.context.inner.lock();

            if !inner.is_current(&ticket) {
                Err(SyncError::Stale)
            } else if self.context.guard.lock().has_voted(request_id, Utc::now()) {
                Err(SyncError::AlreadyVoted)
            } else if !inner.pending_likes.insert(request_id.to_string()) {
                Err(SyncError::LikePending)
            } else {
                Ok(())
            }
        };

        if let Err(error) = claim {
            if error == SyncError::AlreadyVoted {
                self.context.show_like_error(&ticket, request_id, &error);
            }

            return Err(error);
        }

        let result = self.context.backend.like_request(request_id).await;

        let view = {
            let mut inner = self.context.inner.lock();

            // Marked before the pending claim is released
            if result.is_ok() {
                if let Err(e) = self.context.guard.lock().mark(request_id, Utc::now()) {
                    warn!("Could not persist vote guard: {}", e);
                }
            }

            // After a switch the pending set belongs to the new session
            if inner.is_current(&ticket) {
                inner.pending_likes.remove(request_id);

                result.as_ref().ok().map(|&likes| {
                    inner.state.set_likes(request_id, likes);
                    inner.like_errors.remove(request_id);
                    inner.view(Utc::now())
                })
            } else {
                None
            }
        };

        match result {
            Ok(likes) => {
                if let Some(view) = view {
                    self.context.emit(SyncEvent::ViewUpdated(view));
                }

                Ok(likes)
            }
            Err(e) => {
                let error = SyncError::from(e);
                self.context.show_like_error(&ticket, request_id, &error);

                Err(error)
            }
        }
    }

    /// Posts a chat message over the real-time channel.
    ///
    /// Nothing is added locally, the message shows up once the channel echoes it back.
    pub fn send_message(&self, text: &str) -> SyncResult<()> {
        let message = validate_message(text, self.context.config.max_message_length)?;

        self.context
            .emit_on_channel(|session_id| ClientEmission::SendMessage {
                session_id,
                message: message.to_string(),
            })
    }

    /// Requests a song over the real-time channel. The request arrives as a pushed event.
    pub fn submit_request(&self, song: &str) -> SyncResult<()> {
        let song = validate_selection(song)?;

        self.context
            .emit_on_channel(|session_id| ClientEmission::SongRequest {
                session_id,
                song: song.to_string(),
            })
    }

    /// Asks the auth collaborator who is logged in
    pub async fn check_auth(&self) -> SyncResult<AuthStatus> {
        let auth = self.context.backend.check_auth().await?;
        self.context.inner.lock().auth = Some(auth.clone());

        Ok(auth)
    }

    /// The role of this client on the active session, based on the last auth check
    pub fn role(&self) -> SessionRole {
        self.context.inner.lock().role()
    }

    pub fn view(&self) -> SessionView {
        self.context.inner.lock().view(Utc::now())
    }

    /// Leaves the session: closes the channel and clears local state.
    /// Anything still in flight for it is discarded when it completes.
    pub fn close(&self) {
        let closed = self.context.inner.lock().reset();

        if let Some(session_id) = closed {
            info!("Left session {}", session_id);
            self.context.emit(SyncEvent::Closed { session_id });
        }
    }

    /// Returns a receiver of events for the presentation layer
    pub fn events(&self) -> EventReceiver {
        self.event_receiver.clone()
    }
}

impl<B, T> SyncContext<B, T>
where
    B: Backend + 'static,
    T: Transport + 'static,
{
    pub fn emit(&self, event: SyncEvent) {
        if self.event_sender.send(event).is_err() {
            debug!("Synchronizer is gone, dropping event");
        }
    }

    fn ticket(&self) -> SyncResult<Ticket> {
        self.inner
            .lock()
            .session
            .clone()
            .ok_or(SyncError::NoActiveSession)
    }

    /// Fetches the session again under the given ticket
    async fn refresh(&self, ticket: &Ticket) -> SyncResult<SessionView> {
        let session_id = ticket.session_id.as_str();
        debug!("Loading session {}", session_id);

        let (requests, messages, profile) = tokio::join!(
            self.backend.session_requests(session_id),
            self.backend.session_messages(session_id),
            self.backend.session_dj(session_id),
        );

        let view = {
            let mut inner = self.inner.lock();

            if !inner.is_current(ticket) {
                debug!("Discarding load of session {}", session_id);
                return Err(SyncError::Stale);
            }

            inner.errors.requests = match requests {
                Ok(requests) => {
                    inner.state.replace_requests(requests);
                    None
                }
                Err(e) => {
                    warn!("Could not load requests of session {}: {}", session_id, e);
                    Some(e.to_string())
                }
            };

            inner.errors.messages = match messages {
                Ok(messages) => {
                    inner.state.replace_messages(messages);
                    None
                }
                Err(e) => {
                    warn!("Could not load messages of session {}: {}", session_id, e);
                    Some(e.to_string())
                }
            };

            inner.errors.profile = match profile {
                Ok(profile) => {
                    inner.profile = Some(profile);
                    None
                }
                Err(e) => {
                    warn!("Could not load DJ of session {}: {}", session_id, e);
                    Some(e.to_string())
                }
            };

            inner.view(Utc::now())
        };

        self.emit(SyncEvent::ViewUpdated(view.clone()));
        Ok(view)
    }

    fn emit_on_channel<F>(&self, emission: F) -> SyncResult<()>
    where
        F: FnOnce(String) -> ClientEmission,
    {
        let inner = self.inner.lock();

        let session_id = inner
            .session
            .as_ref()
            .map(|t| t.session_id.clone())
            .ok_or(SyncError::NoActiveSession)?;

        let subscription = inner.subscription.as_ref().ok_or(SyncError::NotSubscribed)?;
        subscription.emit(emission(session_id))?;

        Ok(())
    }

    /// Shows a like error next to a request, clearing it once its display window passes
    fn show_like_error(&self, ticket: &Ticket, request_id: &str, error: &SyncError) {
        let display = self.config.like_error_display();
        let like_error = LikeError::new(error.to_string(), Utc::now() + display);
        let error_id = like_error.id;

        let view = {
            let mut inner = self.inner.lock();

            if !inner.is_current(ticket) {
                return;
            }

            inner.like_errors.insert(request_id.to_string(), like_error);
            inner.view(Utc::now())
        };

        self.emit(SyncEvent::ViewUpdated(view));

        let context = self.clone();
        let ticket = ticket.clone();
        let request_id = request_id.to_string();

        tokio::spawn(async move {
            tokio::time::sleep(display.to_std().unwrap_or_default()).await;

            let view = {
                let mut inner = context.inner.lock();

                let still_shown = inner.is_current(&ticket)
                    && inner
                        .like_errors
                        .get(&request_id)
                        .map(|e| e.id == error_id)
                        .unwrap_or_default();

                if !still_shown {
                    return;
                }

                inner.like_errors.remove(&request_id);
                inner.view(Utc::now())
            };

            context.emit(SyncEvent::ViewUpdated(view));
        });
    }

    /// Called when a [SubscriptionHandle] is dropped
    pub fn end_subscription(&self, id: SubscriptionId) {
        let mut inner = self.inner.lock();

        if inner.subscription.as_ref().map(|s| s.id) != Some(id) {
            return;
        }

        if let Some(subscription) = inner.subscription.take() {
            subscription.close();
        }

        inner.connected = false;
        info!("Unsubscribed from the session");
    }
}

impl<B, T> Clone for SyncContext<B, T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            backend: self.backend.clone(),
            transport: self.transport.clone(),
            guard: self.guard.clone(),
            inner: self.inner.clone(),
            event_sender: self.event_sender.clone(),
        }
    }
}

impl<B, T> Clone for Synchronizer<B, T>
where
    B: Backend + 'static,
    T: Transport + 'static,
{
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            event_receiver: self.event_receiver.clone(),
        }
    }
}
