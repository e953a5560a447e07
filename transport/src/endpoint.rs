use std::{fmt, str::FromStr};

use url::Url;

const DEFAULT_PORT: u16 = 8008;

#[derive(Debug, Clone, thiserror::Error)]
pub enum HubUrlError {
    #[error("invalid hub address: {0}")]
    Invalid(#[from] url::ParseError),
    #[error("unsupported scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
}

/// Base address of the hub.
///
/// Accepts the forms a user would type into a connection dialog:
///
///   media-hub               Host with the default port
///   media-hub:8080          Host and port
///   :8080                   Localhost on a port
///   https://hub.lan/base    Full URL, optionally with a base path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubUrl(Url);

impl HubUrl {
    /// URL action requests are POSTed to.
    pub fn execute_url(&self) -> Url {
        self.join("execute")
    }

    /// Websocket URL the hub pushes unsolicited events through.
    pub fn events_url(&self) -> Url {
        let mut url = self.join("ws/events");
        to_ws_scheme(&mut url);
        url
    }

    /// Websocket URL for one long-running command's output stream.
    pub fn stream_url(&self, stream_id: &str) -> Url {
        let mut url = self.join(&format!("ws/stream/{stream_id}"));
        to_ws_scheme(&mut url);
        url
    }

    fn join(&self, path: &str) -> Url {
        // base path always ends in '/', so join appends instead of replacing
        self.0.join(path).unwrap_or_else(|_| self.0.clone())
    }
}

fn to_ws_scheme(url: &mut Url) {
    let scheme = match url.scheme() {
        "https" => "wss",
        _ => "ws",
    };
    let _ = url.set_scheme(scheme);
}

impl FromStr for HubUrl {
    type Err = HubUrlError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let spec = spec.trim();
        let had_scheme = spec.contains("://");

        let mut url = if had_scheme {
            Url::parse(spec)?
        } else if let Some(port) = spec.strip_prefix(':') {
            Url::parse(&format!("http://localhost:{port}"))?
        } else {
            Url::parse(&format!("http://{spec}"))?
        };

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(HubUrlError::UnsupportedScheme(other.to_string())),
        }

        if !had_scheme && url.port().is_none() {
            let _ = url.set_port(Some(DEFAULT_PORT));
        }

        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }

        Ok(Self(url))
    }
}

impl fmt::Display for HubUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bearer token authenticating the dashboard against the hub.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AuthToken(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_host_uses_default_port() {
        let url: HubUrl = "media-hub".parse().unwrap();
        assert_eq!(url.to_string(), "http://media-hub:8008/");
    }

    #[test]
    fn test_parse_host_and_port() {
        let url: HubUrl = "media-hub:8080".parse().unwrap();
        assert_eq!(url.to_string(), "http://media-hub:8080/");
    }

    #[test]
    fn test_parse_port_only_means_localhost() {
        let url: HubUrl = ":8080".parse().unwrap();
        assert_eq!(url.to_string(), "http://localhost:8080/");
    }

    #[test]
    fn test_parse_full_url_keeps_implied_port() {
        let url: HubUrl = "https://hub.lan".parse().unwrap();
        assert_eq!(url.to_string(), "https://hub.lan/");
    }

    #[test]
    fn test_parse_full_url_with_base_path() {
        let url: HubUrl = "http://hub.lan:8008/base".parse().unwrap();
        assert_eq!(url.execute_url().as_str(), "http://hub.lan:8008/base/execute");
    }

    #[test]
    fn test_parse_rejects_non_http_scheme() {
        let result: Result<HubUrl, _> = "ftp://hub.lan".parse();
        assert!(matches!(result, Err(HubUrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result: Result<HubUrl, _> = "".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_execute_url() {
        let url: HubUrl = "media-hub".parse().unwrap();
        assert_eq!(url.execute_url().as_str(), "http://media-hub:8008/execute");
    }

    #[test]
    fn test_events_url_maps_scheme() {
        let url: HubUrl = "media-hub".parse().unwrap();
        assert_eq!(url.events_url().as_str(), "ws://media-hub:8008/ws/events");

        let url: HubUrl = "https://hub.lan".parse().unwrap();
        assert_eq!(url.events_url().as_str(), "wss://hub.lan/ws/events");
    }

    #[test]
    fn test_stream_url() {
        let url: HubUrl = "media-hub".parse().unwrap();
        assert_eq!(
            url.stream_url("42").as_str(),
            "ws://media-hub:8008/ws/stream/42"
        );
    }

    #[test]
    fn test_auth_token_debug_is_redacted() {
        let token = AuthToken::new("super-secret");
        assert_eq!(format!("{token:?}"), "AuthToken(..)");
    }
}
