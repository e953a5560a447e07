pub mod registry;

pub use registry::SchemaRegistry;

use std::sync::Arc;

use dashlink_core::{ActionError, ActionName, ActionRequest, ArgMap, ClientMessage};
use dashlink_transport::{HttpTransport, TransportError};
use serde_json::Value;

/// Failure modes of a single invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The hub was unreachable or replied with something unusable.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The hub executed the action and it failed.
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// The single path through which widgets invoke named hub actions.
///
/// Performs no caching, retries, or deduplication: a failed invocation
/// surfaces immediately, and retry policy stays with the caller. There is
/// no built-in cancellation either; a caller that stops caring simply
/// drops the future.
#[derive(Clone)]
pub struct ActionClient {
    transport: Arc<HttpTransport>,
}

impl ActionClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Invoke a named action with the given arguments.
    pub async fn invoke(
        &self,
        action: impl Into<ActionName>,
        args: ArgMap,
    ) -> Result<Value, InvokeError> {
        self.send(ActionRequest::new(action, args)).await
    }

    /// Send an already-built request, normalizing success and failure into
    /// one result shape so callers never branch on transport-specific
    /// error types.
    pub async fn send(&self, request: ActionRequest) -> Result<Value, InvokeError> {
        tracing::info!("call action '{}'", request.action);

        let response = self
            .transport
            .send(&ClientMessage::Request(request))
            .await?;

        Ok(response.into_result()?)
    }
}
