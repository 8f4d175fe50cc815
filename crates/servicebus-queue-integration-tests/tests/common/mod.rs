//! Common test utilities for servicebus-queue integration tests
//!
//! Every test runs against a local `wiremock` server standing in for the
//! Service Bus namespace. The client reaches it through the real `reqwest`
//! transport via the endpoint override.

use chrono::{DateTime, TimeZone, Utc};
use servicebus_queue::{FixedClock, QueueClient, QueueClientConfig};
use std::sync::Arc;
use wiremock::MockServer;

pub const QUEUE_NAME: &str = "orders";
pub const KEY_NAME: &str = "RootManageSharedAccessKey";
pub const KEY_VALUE: &str = "c2VjcmV0LWtleS12YWx1ZQ==";

/// Instant every test client signs its requests at.
pub fn sign_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
}

pub fn config_for(server: &MockServer) -> QueueClientConfig {
    QueueClientConfig::new("", KEY_NAME, KEY_VALUE, QUEUE_NAME)
        .with_endpoint(server.uri())
        .with_timeout(5)
}

/// Client using the default transport against `server`, with a fixed clock.
pub fn client_for(server: &MockServer) -> QueueClient {
    QueueClient::new(config_for(server)).with_clock(Arc::new(FixedClock(sign_time())))
}

/// `BrokerProperties` header as the service returns it for a locked message.
#[allow(dead_code)]
pub fn received_broker_properties(message_id: &str, lock_token: &str) -> String {
    serde_json::json!({
        "DeliveryCount": 1,
        "EnqueuedSequenceNumber": 0,
        "EnqueuedTimeUtc": "Fri, 15 Mar 2024 09:29:58 GMT",
        "Label": "order-created",
        "LockToken": lock_token,
        "LockedUntilUtc": "Fri, 15 Mar 2024 09:30:58 GMT",
        "MessageId": message_id,
        "SequenceNumber": 42,
        "SessionId": "customer-7",
        "State": "Active",
        "TimeToLive": 922337203685.47754
    })
    .to_string()
}
