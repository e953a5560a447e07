use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{HubUrl, TransportError};

const CHUNK_BUFFER_SIZE: usize = 100;

/// One long-running command's incremental output.
///
/// Chunks arrive in send order and are never reordered or deduplicated;
/// the server's close frame ends the stream.
pub struct OutputStream {
    chunks: flume::Receiver<String>,
    reader: JoinHandle<()>,
}

impl OutputStream {
    pub async fn open(endpoint: &HubUrl, stream_id: &str) -> Result<Self, TransportError> {
        let url = endpoint.stream_url(stream_id);
        let (mut socket, _) = connect_async(url.as_str()).await?;
        let (tx, chunks) = flume::bounded(CHUNK_BUFFER_SIZE);

        let stream_id = stream_id.to_string();
        let reader = tokio::spawn(async move {
            while let Some(frame) = socket.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if tx.send_async(text.as_str().to_string()).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(error) => {
                        tracing::error!("output stream {stream_id} error: {error}");
                        break;
                    }
                }
            }
        });

        Ok(Self { chunks, reader })
    }

    /// Next output chunk; an error means the stream ended.
    pub async fn recv(&self) -> Result<String, flume::RecvError> {
        self.chunks.recv_async().await
    }

    /// Receiver half for callers that want to consume chunks elsewhere.
    pub fn chunks(&self) -> flume::Receiver<String> {
        self.chunks.clone()
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
