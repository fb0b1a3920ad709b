use async_trait::async_trait;
use crowdwork_core::{
    Channel, ChannelSignal, ClientEmission, SessionEvent, Transport, TransportError,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio::sync::mpsc::unbounded_channel;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

/// A real-time channel over a WebSocket carrying JSON text frames
pub struct WebSocketTransport {
    url: Url,
}

impl WebSocketTransport {
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self) -> Result<Channel, TransportError> {
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        debug!("Connected to {}", self.url);

        let (mut sink, mut source) = stream.split();
        let (outgoing, mut emissions) = unbounded_channel::<ClientEmission>();
        let (signals, incoming) = unbounded_channel::<ChannelSignal>();

        // Writes emissions until the channel is dropped, then closes the socket
        tokio::spawn(async move {
            while let Some(emission) = emissions.recv().await {
                let text = match emission.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Dropping emission that could not be encoded: {}", e);
                        continue;
                    }
                };

                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!("Could not write to the real-time channel: {}", e);
                    break;
                }
            }

            let _ = sink.close().await;
        });

        // Reads events until the socket ends, then reports why
        tokio::spawn(async move {
            let reason = loop {
                match source.next().await {
                    Some(Ok(Message::Text(text))) => match SessionEvent::from_json(&text) {
                        Ok(event) => {
                            if signals.send(ChannelSignal::Event(event)).is_err() {
                                // Nobody is listening anymore
                                return;
                            }
                        }
                        Err(e) => debug!("Skipping unknown frame: {}", e),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        break frame.map(|f| f.reason.to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Some(e.to_string()),
                    None => break None,
                }
            };

            let _ = signals.send(ChannelSignal::Disconnected { reason });
        });

        Ok(Channel { outgoing, incoming })
    }
}

#[cfg(test)]
mod tests {
    use crowdwork_core::RequestStatus;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use super::*;

    #[tokio::test]
    async fn exchanges_frames_with_a_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut socket = accept_async(stream).await.unwrap();

            let joined = socket.next().await.unwrap().unwrap();

            socket
                .send(Message::Text("not json".to_string()))
                .await
                .unwrap();
            socket
                .send(Message::Text(
                    r#"{"event":"statusUpdate","data":{"requestId":"a","status":"declined"}}"#
                        .to_string(),
                ))
                .await
                .unwrap();
            socket.close(None).await.unwrap();

            joined.into_text().unwrap()
        });

        let url = Url::parse(&format!("ws://{}/socket", address)).unwrap();
        let transport = WebSocketTransport::new(url);
        let mut channel = transport.open().await.unwrap();

        channel
            .emit(ClientEmission::JoinSession {
                session_id: "s1".to_string(),
            })
            .unwrap();

        assert_eq!(
            channel.incoming.recv().await,
            Some(ChannelSignal::Event(SessionEvent::StatusUpdate {
                request_id: "a".to_string(),
                status: RequestStatus::Declined
            }))
        );
        assert!(matches!(
            channel.incoming.recv().await,
            Some(ChannelSignal::Disconnected { .. })
        ));

        let joined = server.await.unwrap();
        assert_eq!(joined, r#"{"event":"joinSession","data":{"sessionId":"s1"}}"#);
    }

    #[tokio::test]
    async fn reports_connection_failures() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let transport = WebSocketTransport::new(Url::parse(&format!("ws://{}", address)).unwrap());

        assert!(matches!(
            transport.open().await,
            Err(TransportError::Connect(_))
        ));
    }
}
