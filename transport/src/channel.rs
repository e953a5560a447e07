use dashlink_core::EventEnvelope;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{AuthToken, HubUrl, TransportError};

const FRAME_BUFFER_SIZE: usize = 100;

/// Persistent channel the hub pushes unsolicited events through.
///
/// Frames are handed out in arrival order. Reconnection is the caller's
/// concern: once the hub side closes, the receiver reports disconnected
/// exactly once and the channel is spent.
pub struct EventChannel {
    frames: flume::Receiver<EventEnvelope>,
    reader: JoinHandle<()>,
}

impl EventChannel {
    pub async fn connect(
        endpoint: &HubUrl,
        token: Option<&AuthToken>,
    ) -> Result<Self, TransportError> {
        let mut url = endpoint.events_url();
        if let Some(token) = token {
            url.query_pairs_mut().append_pair("token", token.as_str());
        }

        let (mut socket, _) = connect_async(url.as_str()).await?;
        let (tx, frames) = flume::bounded(FRAME_BUFFER_SIZE);

        let reader = tokio::spawn(async move {
            while let Some(frame) = socket.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        let envelope: EventEnvelope = match serde_json::from_str(text.as_str()) {
                            Ok(envelope) => envelope,
                            Err(error) => {
                                tracing::warn!("failed to parse event frame: {error}");
                                continue;
                            }
                        };

                        if tx.send_async(envelope).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(error) => {
                        tracing::error!("event channel error: {error}");
                        break;
                    }
                }
            }

            tracing::info!("event channel reader finished");
        });

        Ok(Self { frames, reader })
    }

    /// Next pushed event; an error means the channel closed for good.
    pub async fn recv(&self) -> Result<EventEnvelope, flume::RecvError> {
        self.frames.recv_async().await
    }

    /// Receiver half for callers that want to consume frames elsewhere.
    pub fn frames(&self) -> flume::Receiver<EventEnvelope> {
        self.frames.clone()
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
