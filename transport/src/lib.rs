pub mod channel;
pub mod endpoint;
pub mod http;
pub mod stream;

pub use channel::EventChannel;
pub use endpoint::{AuthToken, HubUrl, HubUrlError};
pub use http::HttpTransport;
pub use stream::OutputStream;

/// Connectivity or protocol-level failure. Transient from the caller's
/// point of view; whether to retry is the caller's decision.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("hub returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed response body: {0}")]
    MalformedBody(#[source] serde_json::Error),
    #[error("websocket failure: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}
