//! HTTP transport abstraction.
//!
//! The client only needs "send one request, get one response". Anything
//! implementing [`HttpTransport`] can be injected into a
//! [`QueueClient`](crate::QueueClient); without one the client lazily builds a
//! [`reqwest::Client`] the first time it sends a request.

use crate::error::{BoxError, QueueError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Error returned by a transport that failed to produce a response.
pub type TransportError = BoxError;

/// Sends a single HTTP request.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute `request` and return the response, whatever its status.
    ///
    /// Errors mean no response was received (DNS, TLS, connection failures).
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, TransportError>;
}

#[async_trait]
impl HttpTransport for reqwest::Client {
    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, TransportError> {
        reqwest::Client::execute(self, request)
            .await
            .map_err(TransportError::from)
    }
}

/// Resolves the transport used by one client instance.
///
/// An injected transport always wins. Otherwise the default transport is built
/// at most once, on first use, and shared by every later call.
pub(crate) struct TransportSelector {
    injected: Option<Arc<dyn HttpTransport>>,
    default: OnceCell<Arc<dyn HttpTransport>>,
}

impl TransportSelector {
    pub(crate) fn new(injected: Option<Arc<dyn HttpTransport>>) -> Self {
        Self {
            injected,
            default: OnceCell::new(),
        }
    }

    pub(crate) async fn get(&self) -> Result<&Arc<dyn HttpTransport>, QueueError> {
        if let Some(transport) = &self.injected {
            return Ok(transport);
        }

        self.default
            .get_or_try_init(|| async {
                debug!("Creating default HTTP transport");
                reqwest::Client::builder()
                    .build()
                    .map(|client| Arc::new(client) as Arc<dyn HttpTransport>)
                    .map_err(|e| QueueError::transport("Failed to build default HTTP client", e))
            })
            .await
    }
}

impl std::fmt::Debug for TransportSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSelector")
            .field("injected", &self.injected.is_some())
            .field("default_initialized", &self.default.initialized())
            .finish()
    }
}
