use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::{ChannelSignal, ClientEmission};

pub type EmissionSender = UnboundedSender<ClientEmission>;
pub type SignalReceiver = UnboundedReceiver<ChannelSignal>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("Could not connect to the real-time channel: {0}")]
    Connect(String),
    #[error("The real-time channel is closed")]
    Closed,
    #[error("Could not encode emission: {0}")]
    Encode(String),
}

/// An open real-time channel.
///
/// Dropping the channel closes it. The receiver ends, or yields
/// [ChannelSignal::Disconnected], when the transport goes away.
pub struct Channel {
    pub outgoing: EmissionSender,
    pub incoming: SignalReceiver,
}

impl Channel {
    pub fn emit(&self, emission: ClientEmission) -> Result<(), TransportError> {
        self.outgoing
            .send(emission)
            .map_err(|_| TransportError::Closed)
    }
}

/// Represents a bidirectional push transport that groups clients by session
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens a fresh channel. Joining a session is done by emitting on it.
    async fn open(&self) -> Result<Channel, TransportError>;
}
