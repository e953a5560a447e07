use dashlink_core::{ActionResponse, ClientMessage};

use crate::{AuthToken, HubUrl, TransportError};

/// HTTP request/reply leg of the hub connection.
///
/// One shared `reqwest::Client` per instance; no client-side timeout is
/// configured, so a stalled call stays pending until the connection itself
/// fails or the caller drops the future.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: HubUrl,
    token: Option<AuthToken>,
}

impl HttpTransport {
    pub fn new(endpoint: HubUrl) -> Self {
        Self::with_token(endpoint, None)
    }

    pub fn with_token(endpoint: HubUrl, token: Option<AuthToken>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            token,
        }
    }

    pub fn endpoint(&self) -> &HubUrl {
        &self.endpoint
    }

    pub fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    /// Deliver one serialized request and return the parsed reply.
    pub async fn send(&self, message: &ClientMessage) -> Result<ActionResponse, TransportError> {
        let mut request = self.client.post(self.endpoint.execute_url()).json(message);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token.as_str());
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(TransportError::MalformedBody)
    }
}

#[cfg(test)]
mod tests {
    use dashlink_core::{ActionRequest, ArgMap};
    use serde_json::json;

    use super::*;

    fn request() -> ClientMessage {
        ClientMessage::Request(ActionRequest::new("music.mpd.play", ArgMap::new()))
    }

    #[tokio::test]
    async fn test_send_posts_envelope_and_parses_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/execute")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(json!({
                "kind": "request",
                "action": "music.mpd.play",
            })))
            .with_body(r#"{"output":{"state":"play"},"errors":[]}"#)
            .create_async()
            .await;

        let endpoint: HubUrl = server.url().parse().unwrap();
        let transport = HttpTransport::new(endpoint);

        let response = transport.send(&request()).await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.output, json!({"state": "play"}));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_attaches_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/execute")
            .match_header("authorization", "Bearer secret")
            .with_body(r#"{"output":null,"errors":[]}"#)
            .create_async()
            .await;

        let endpoint: HubUrl = server.url().parse().unwrap();
        let transport = HttpTransport::with_token(endpoint, Some(AuthToken::new("secret")));

        transport.send(&request()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_maps_non_2xx_to_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_status(503)
            .create_async()
            .await;

        let endpoint: HubUrl = server.url().parse().unwrap();
        let transport = HttpTransport::new(endpoint);

        match transport.send(&request()).await {
            Err(TransportError::Status(status)) => assert_eq!(status.as_u16(), 503),
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_maps_garbage_body_to_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .with_body("not json at all")
            .create_async()
            .await;

        let endpoint: HubUrl = server.url().parse().unwrap();
        let transport = HttpTransport::new(endpoint);

        assert!(matches!(
            transport.send(&request()).await,
            Err(TransportError::MalformedBody(_))
        ));
    }

    #[tokio::test]
    async fn test_send_surfaces_connection_failure() {
        // nothing listens on port 9 on localhost
        let endpoint: HubUrl = ":9".parse().unwrap();
        let transport = HttpTransport::new(endpoint);

        assert!(matches!(
            transport.send(&request()).await,
            Err(TransportError::Request(_))
        ));
    }
}
