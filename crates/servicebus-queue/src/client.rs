//! Queue client: the four queue operations over the REST API.
//!
//! Each operation runs the same sequence: build and sign the request, send it
//! through the transport, classify the response status, then decode the
//! message where the operation returns one. Nothing is retried.

use crate::auth::{Clock, SharedAccessKey, SystemClock};
use crate::codec::decode_response;
use crate::config::QueueClientConfig;
use crate::error::QueueError;
use crate::message::Message;
use crate::request::build_request;
use crate::status::check_response;
use crate::transport::{HttpTransport, TransportSelector};
use reqwest::Method;
use std::sync::Arc;
use tracing::{debug, error, instrument};

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;

/// Client for a single Service Bus queue.
///
/// The client is `Send + Sync`; share one instance behind an [`Arc`] rather
/// than creating one per task, so the default transport is built only once.
#[derive(Debug)]
pub struct QueueClient {
    config: QueueClientConfig,
    key: SharedAccessKey,
    transport: TransportSelector,
    clock: Arc<dyn Clock>,
}

impl QueueClient {
    /// Create a client that builds its default HTTP transport on first use.
    pub fn new(config: QueueClientConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a client that sends every request through `transport`.
    pub fn with_transport(config: QueueClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::build(config, Some(transport))
    }

    fn build(config: QueueClientConfig, transport: Option<Arc<dyn HttpTransport>>) -> Self {
        let key = SharedAccessKey::new(config.key_name.clone(), config.key_value.clone());
        Self {
            config,
            key,
            transport: TransportSelector::new(transport),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source used to sign requests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &QueueClientConfig {
        &self.config
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Receive and lock the message at the head of the queue (peek-lock).
    ///
    /// The service waits up to the configured timeout for a message to arrive.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::NoMessagesAvailable`] when the wait ended with an
    /// empty queue, any other classified error for a failure status, and
    /// [`QueueError::Transport`] or [`QueueError::BodyRead`] when no complete
    /// response was received.
    #[instrument(skip(self), fields(queue = %self.config.queue_name, operation = "get_message"))]
    pub async fn get_message(&self) -> Result<Message, QueueError> {
        let path = format!("messages/head?timeout={}", self.config.timeout);
        let response = self.execute(Method::POST, &path, None).await?;

        let message = decode_response(response).await?;
        debug!(
            message_id = %message.id,
            delivery_count = message.delivery_count,
            "Message received"
        );

        Ok(message)
    }

    /// Send `message` to the queue.
    #[instrument(
        skip(self, message),
        fields(queue = %self.config.queue_name, operation = "send_message", message_id = %message.id)
    )]
    pub async fn send_message(&self, message: &Message) -> Result<(), QueueError> {
        self.execute(Method::POST, "messages/", Some(message)).await?;
        debug!("Message sent");
        Ok(())
    }

    /// Release the lock on a received message so it can be delivered again.
    #[instrument(
        skip(self, message),
        fields(queue = %self.config.queue_name, operation = "unlock_message", message_id = %message.id)
    )]
    pub async fn unlock_message(&self, message: &Message) -> Result<(), QueueError> {
        self.execute(Method::PUT, &lock_path(message), None).await?;
        debug!("Message unlocked");
        Ok(())
    }

    /// Delete a received message, completing it.
    #[instrument(
        skip(self, message),
        fields(queue = %self.config.queue_name, operation = "delete_message", message_id = %message.id)
    )]
    pub async fn delete_message(&self, message: &Message) -> Result<(), QueueError> {
        self.execute(Method::DELETE, &lock_path(message), None).await?;
        debug!("Message deleted");
        Ok(())
    }

    // ========================================================================
    // Request Pipeline
    // ========================================================================

    async fn execute(
        &self,
        method: Method,
        path: &str,
        message: Option<&Message>,
    ) -> Result<reqwest::Response, QueueError> {
        let request = build_request(
            &self.config,
            &self.key,
            self.clock.now(),
            method.clone(),
            path,
            message,
        )?;

        let transport = self.transport.get().await?;
        let response = transport.execute(request).await.map_err(|e| {
            error!(method = %method, error = %e, "Request could not be sent");
            QueueError::transport(format!("Sending {} request failed", method), e)
        })?;

        check_response(response).await
    }
}

/// Path addressing the lock held on a received message.
///
/// The id and lock token are inserted as they are.
fn lock_path(message: &Message) -> String {
    format!("messages/{}/{}", message.id, message.lock_token)
}
