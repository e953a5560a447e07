use dashlink_client::ActionClient;
use dashlink_core::{ActionRequest, ClientMessage};
use serde_json::Value;

use crate::FormError;

/// Raw mode: the caller supplies the whole request body as text.
///
/// The body is parsed only as generic structured data and never checked
/// against the catalog. This is the escape hatch for actions the catalog
/// does not know about, or describes incorrectly.
pub fn parse_request(body: &str) -> Result<ActionRequest, FormError> {
    let body = body.trim();

    // accept the full envelope or a bare request object
    if let Ok(ClientMessage::Request(request)) = serde_json::from_str(body) {
        return Ok(request);
    }

    serde_json::from_str(body).map_err(FormError::InvalidBody)
}

/// Parse and send a raw request body. A malformed body is rejected here
/// and never reaches the transport.
pub async fn execute(client: &ActionClient, body: &str) -> Result<Value, FormError> {
    let request = parse_request(body)?;
    Ok(client.send(request).await?)
}

#[cfg(test)]
mod tests {
    use dashlink_transport::{HttpTransport, HubUrl};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_full_envelope() {
        let request =
            parse_request(r#"{"kind":"request","action":"music.mpd.play","args":{}}"#).unwrap();
        assert_eq!(&*request.action, "music.mpd.play");
    }

    #[test]
    fn test_parse_bare_request_object() {
        let request =
            parse_request(r#"{"action":"music.mpd.seek","args":{"position":30}}"#).unwrap();
        assert_eq!(request.args.get("position"), Some(&json!(30)));
    }

    #[test]
    fn test_parse_uncataloged_action_is_accepted() {
        // nothing here consults the catalog
        let request = parse_request(r#"{"action":"custom.plugin.run","args":{}}"#).unwrap();
        assert_eq!(&*request.action, "custom.plugin.run");
    }

    #[test]
    fn test_parse_malformed_body_is_rejected() {
        assert!(matches!(
            parse_request("{not json"),
            Err(FormError::InvalidBody(_))
        ));
        assert!(matches!(
            parse_request(r#"{"kind":"request"}"#),
            Err(FormError::InvalidBody(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_malformed_body_never_reaches_transport() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/execute")
            .expect(0)
            .create_async()
            .await;

        let endpoint: HubUrl = server.url().parse().unwrap();
        let client = ActionClient::new(HttpTransport::new(endpoint));

        let result = execute(&client, "{not json").await;
        assert!(matches!(result, Err(FormError::InvalidBody(_))));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_execute_sends_parsed_request() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/execute")
            .match_body(mockito::Matcher::PartialJson(
                json!({"kind": "request", "action": "custom.plugin.run"}),
            ))
            .with_body(r#"{"output":"done","errors":[]}"#)
            .create_async()
            .await;

        let endpoint: HubUrl = server.url().parse().unwrap();
        let client = ActionClient::new(HttpTransport::new(endpoint));

        let output = execute(&client, r#"{"action":"custom.plugin.run","args":{}}"#)
            .await
            .unwrap();
        assert_eq!(output, json!("done"));
    }
}
