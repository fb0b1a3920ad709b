use chrono::Utc;
use crowdwork_core::{
    Backend, ChannelSignal, ClientEmission, EmissionSender, SignalReceiver, Transport,
    TransportError,
};
use log::{debug, warn};
use tokio::task::JoinHandle;

use crate::SyncEvent;

use super::{SyncContext, Ticket};

pub type SubscriptionId = u64;

/// The live half of a subscription, owned by the synchronizer
pub struct Subscription {
    pub id: SubscriptionId,
    outgoing: EmissionSender,
    task: JoinHandle<()>,
}

/// A handle to a subscription, which when dropped ends the subscription
/// unless another one has replaced it already
pub struct SubscriptionHandle<B, T>
where
    B: Backend + 'static,
    T: Transport + 'static,
{
    id: SubscriptionId,
    context: SyncContext<B, T>,
}

impl Subscription {
    pub(super) fn new(id: SubscriptionId, outgoing: EmissionSender, task: JoinHandle<()>) -> Self {
        Self { id, outgoing, task }
    }

    pub fn emit(&self, emission: ClientEmission) -> Result<(), TransportError> {
        self.outgoing
            .send(emission)
            .map_err(|_| TransportError::Closed)
    }

    /// Stops delivering events and closes the channel
    pub fn close(self) {
        self.task.abort();
        debug!("Subscription {} closed", self.id);
    }
}

impl<B, T> SubscriptionHandle<B, T>
where
    B: Backend + 'static,
    T: Transport + 'static,
{
    pub(super) fn new(context: &SyncContext<B, T>, id: SubscriptionId) -> Self {
        Self {
            id,
            context: context.clone(),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Ends the subscription now rather than on drop
    pub fn close(self) {
        // Dropping does the work
    }
}

impl<B, T> Drop for SubscriptionHandle<B, T>
where
    B: Backend + 'static,
    T: Transport + 'static,
{
    fn drop(&mut self) {
        self.context.end_subscription(self.id)
    }
}

/// Applies incoming events to the session until the channel ends
pub(super) async fn run_subscription<B, T>(
    context: SyncContext<B, T>,
    ticket: Ticket,
    id: SubscriptionId,
    mut incoming: SignalReceiver,
) where
    B: Backend + 'static,
    T: Transport + 'static,
{
    let mut reason = None;

    while let Some(signal) = incoming.recv().await {
        match signal {
            ChannelSignal::Event(event) => {
                let view = {
                    let mut inner = context.inner.lock();

                    if !inner.is_current_subscription(&ticket, id) {
                        return;
                    }

                    debug!("Applying {} on session {}", event.name(), ticket.session_id);

                    inner
                        .state
                        .apply(event)
                        .then(|| inner.view(Utc::now()))
                };

                if let Some(view) = view {
                    context.emit(SyncEvent::ViewUpdated(view));
                }
            }
            ChannelSignal::Disconnected { reason: r } => {
                reason = r;
                break;
            }
        }
    }

    let view = {
        let mut inner = context.inner.lock();

        if !inner.is_current_subscription(&ticket, id) {
            return;
        }

        // The task is this one, so dropping the subscription only closes the sender
        inner.subscription = None;
        inner.connected = false;
        inner.view(Utc::now())
    };

    warn!(
        "Lost the real-time channel of session {}{}",
        ticket.session_id,
        reason
            .as_ref()
            .map(|r| format!(": {}", r))
            .unwrap_or_default()
    );

    context.emit(SyncEvent::ViewUpdated(view));
    context.emit(SyncEvent::Disconnected {
        session_id: ticket.session_id,
        reason,
    });
}
