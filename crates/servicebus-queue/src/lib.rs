//! # Service Bus Queue
//!
//! Client for Azure Service Bus queues over the HTTPS REST API, authenticated
//! with Shared Access Signatures.
//!
//! This library provides:
//! - Peek-lock receive, send, unlock and delete of queue messages
//! - SAS token generation (HMAC-SHA256, five minute expiry)
//! - Encoding and decoding of the `BrokerProperties` header and user
//!   properties
//! - A closed error taxonomy mapped from HTTP status codes
//! - A pluggable HTTP transport, defaulting to `reqwest`
//!
//! ## Module Organization
//!
//! - [`auth`] - Signature generation and the signing clock
//! - [`properties`] - Case-insensitive user property map
//! - [`message`] - The message model and RFC-2616 timestamps
//! - [`codec`] - Message to HTTP headers and body, and back
//! - [`status`] - HTTP status classification
//! - [`request`] - Signed request construction
//! - [`transport`] - The HTTP transport seam
//! - [`config`] - Client configuration and loading
//! - [`error`] - Error types
//! - [`client`] - The queue client
//!
//! ## Example
//!
//! ```no_run
//! use servicebus_queue::{Message, QueueClient, QueueClientConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QueueClientConfig::new("my-namespace", "RootManageSharedAccessKey", "key", "orders");
//! let client = QueueClient::new(config);
//!
//! client.send_message(&Message::new("hello").with_label("greeting")).await?;
//!
//! match client.get_message().await {
//!     Ok(message) => client.delete_message(&message).await?,
//!     Err(e) if e.is_no_messages() => {}
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod message;
pub mod properties;
pub mod request;
pub mod status;
pub mod transport;

// Re-export commonly used types at crate root for convenience
pub use crate::auth::{auth_header, signature, Clock, FixedClock, SharedAccessKey, SystemClock};
pub use crate::client::QueueClient;
pub use crate::codec::{decode_message, encode_message, EncodedMessage};
pub use crate::config::QueueClientConfig;
pub use crate::error::{BoxError, ConfigurationError, QueueError};
pub use crate::message::{format_rfc2616, parse_rfc2616, Message};
pub use crate::properties::Properties;
pub use crate::status::classify;
pub use crate::transport::{HttpTransport, TransportError};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
