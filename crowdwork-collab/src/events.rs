use crossbeam::channel::{Receiver, Sender};
use crowdwork_core::SessionId;

use crate::SessionView;

pub type EventSender = Sender<SyncEvent>;
pub type EventReceiver = Receiver<SyncEvent>;

/// Events emitted by the synchronizer for the presentation layer
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Anything visible in the session changed
    ViewUpdated(SessionView),
    /// The real-time channel dropped. The view stays as the last known snapshot,
    /// resubscribe and reload to catch up.
    Disconnected {
        session_id: SessionId,
        reason: Option<String>,
    },
    /// The session was left and its local state cleared
    Closed { session_id: SessionId },
}
