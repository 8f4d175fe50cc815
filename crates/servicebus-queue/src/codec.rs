//! Conversion between [`Message`] and the HTTP representation used by the
//! Service Bus REST API.
//!
//! ## Wire format
//!
//! - The body of the HTTP request/response is the message body, untouched.
//! - System metadata travels as a JSON object in the `BrokerProperties`
//!   header.
//! - Every user property is an HTTP header of its own.
//! - Timestamps inside `BrokerProperties` use the RFC-2616 layout, e.g.
//!   `Sun, 06 Nov 1994 08:49:37 GMT`.
//!
//! Decoding is best effort: a malformed `BrokerProperties` header or timestamp
//! is logged and the affected fields keep their defaults. Only a failure to
//! read the body fails the decode.

use crate::error::QueueError;
use crate::message::{format_rfc2616, parse_rfc2616, Message};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, error};

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;

/// Name of the header carrying the JSON-encoded system properties.
pub const BROKER_PROPERTIES_HEADER: &str = "BrokerProperties";

// ============================================================================
// Wire Forms
// ============================================================================

/// System properties the sender may set, in the order they are marshalled.
///
/// Empty strings and a zero time to live are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BrokerProperties {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub correlation_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub time_to_live: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reply_to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scheduled_enqueue_time_utc: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reply_to_session_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub partition_key: String,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl BrokerProperties {
    /// Collect the sender-settable system properties of `message`.
    pub fn from_message(message: &Message) -> Self {
        Self {
            message_id: message.id.clone(),
            label: message.label.clone(),
            correlation_id: message.correlation_id.clone(),
            session_id: message.session_id.clone(),
            time_to_live: message.time_to_live,
            to: message.to.clone(),
            reply_to: message.reply_to.clone(),
            scheduled_enqueue_time_utc: message
                .scheduled_enqueue_time_utc
                .map(format_rfc2616)
                .unwrap_or_default(),
            reply_to_session_id: message.reply_to_session_id.clone(),
            partition_key: message.partition_key.clone(),
        }
    }

    /// Check if nothing would be marshalled.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Render the JSON text sent in the `BrokerProperties` header.
    pub fn marshal(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// System properties as returned by the service when a message is received.
///
/// A missing field or an explicit `null` leaves the field at its default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ReceivedBrokerProperties {
    #[serde(deserialize_with = "null_as_default")]
    pub message_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub lock_token: String,
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub correlation_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub session_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub delivery_count: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub locked_until_utc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reply_to: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enqueued_time_utc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sequence_number: i64,
    #[serde(deserialize_with = "deserialize_seconds")]
    pub time_to_live: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub to: String,
    #[serde(deserialize_with = "null_as_default")]
    pub scheduled_enqueue_time_utc: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reply_to_session_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub partition_key: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The service reports `TimeToLive` as fractional seconds; keep whole seconds.
fn deserialize_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        Some(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds.trunc() as u64),
        _ => Ok(0),
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Headers and body of an outbound message.
#[derive(Debug, Clone, Default)]
pub struct EncodedMessage {
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Encode `message` into request headers and body.
///
/// User properties are copied verbatim, without quoting. A property whose key
/// is not a valid header name, or whose value is not a valid header value,
/// fails with [`QueueError::RequestConstruction`].
pub fn encode_message(message: &Message) -> Result<EncodedMessage, QueueError> {
    let mut headers = HeaderMap::new();

    for (key, value) in &message.properties {
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            QueueError::request_construction(format!("Invalid property name '{}'", key), e)
        })?;
        let value = HeaderValue::from_bytes(value.as_bytes()).map_err(|e| {
            QueueError::request_construction(format!("Invalid value for property '{}'", key), e)
        })?;
        headers.append(name, value);
    }

    if !message.content_type.is_empty() && !headers.contains_key(CONTENT_TYPE) {
        let value = HeaderValue::from_str(&message.content_type)
            .map_err(|e| QueueError::request_construction("Invalid content type", e))?;
        headers.insert(CONTENT_TYPE, value);
    }

    let broker_properties = BrokerProperties::from_message(message);
    if !broker_properties.is_empty() {
        let json = broker_properties.marshal().map_err(|e| {
            QueueError::request_construction("BrokerProperties serialization failed", e)
        })?;
        let value = HeaderValue::from_bytes(json.as_bytes()).map_err(|e| {
            QueueError::request_construction("Invalid BrokerProperties header value", e)
        })?;
        headers.insert(HeaderName::from_static("brokerproperties"), value);
    }

    Ok(EncodedMessage {
        headers,
        body: message.body.clone(),
    })
}

// ============================================================================
// Decoding
// ============================================================================

/// Decode a received message from its response headers and body.
///
/// Never fails: unparsable metadata leaves the affected fields at their
/// defaults.
pub fn decode_message(headers: &HeaderMap, body: Bytes) -> Message {
    let mut message = Message {
        body,
        ..Message::default()
    };

    decode_properties(&mut message, headers);

    let broker_properties = headers
        .get(BROKER_PROPERTIES_HEADER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .unwrap_or_default();

    if !broker_properties.is_empty() {
        decode_broker_properties(&mut message, &broker_properties);
    }

    message
}

/// Read the body of `response` and decode it together with the headers.
///
/// # Errors
///
/// Returns [`QueueError::BodyRead`] when the body cannot be read in full.
pub async fn decode_response(response: reqwest::Response) -> Result<Message, QueueError> {
    debug!(
        status = response.status().as_u16(),
        headers = ?response.headers(),
        content_length = ?response.content_length(),
        "Decoding message response"
    );

    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(QueueError::body_read)?;

    Ok(decode_message(&headers, body))
}

/// Copy every header except `BrokerProperties` into the message properties.
///
/// Only the first value of a repeated header is kept, and one pair of
/// surrounding double quotes is removed.
pub fn decode_properties(message: &mut Message, headers: &HeaderMap) {
    for name in headers.keys() {
        if name.as_str().eq_ignore_ascii_case(BROKER_PROPERTIES_HEADER) {
            continue;
        }

        if let Some(value) = headers.get(name) {
            let value = String::from_utf8_lossy(value.as_bytes());
            message
                .properties
                .set(canonical_header_key(name.as_str()), strip_quotes(&value));
        }
    }
}

/// Apply the JSON `BrokerProperties` header to `message`.
///
/// A payload that is not valid JSON is logged and otherwise ignored.
pub fn decode_broker_properties(message: &mut Message, raw: &str) {
    debug!(broker_properties = %raw, "Parsing BrokerProperties");

    let wire: ReceivedBrokerProperties = match serde_json::from_str(raw) {
        Ok(wire) => wire,
        Err(e) => {
            error!(error = %e, "BrokerProperties header parse failed");
            return;
        }
    };

    message.id = wire.message_id;
    message.session_id = wire.session_id;
    message.lock_token = wire.lock_token;
    message.label = wire.label;
    message.reply_to = wire.reply_to;
    message.to = wire.to;
    message.content_type = wire.content_type;
    message.correlation_id = wire.correlation_id;
    message.reply_to_session_id = wire.reply_to_session_id;
    message.partition_key = wire.partition_key;
    message.delivery_count = wire.delivery_count;
    message.sequence_number = wire.sequence_number;
    message.time_to_live = wire.time_to_live;

    message.locked_until_utc = decode_timestamp("LockedUntilUtc", &wire.locked_until_utc);
    message.enqueued_time_utc = decode_timestamp("EnqueuedTimeUtc", &wire.enqueued_time_utc);
    message.scheduled_enqueue_time_utc =
        decode_timestamp("ScheduledEnqueueTimeUtc", &wire.scheduled_enqueue_time_utc);
}

fn decode_timestamp(field: &str, value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }

    let parsed = parse_rfc2616(value);
    if parsed.is_none() {
        debug!(field = field, value = %value, "Ignoring unparsable timestamp");
    }
    parsed
}

/// Remove one pair of double quotes wrapping `value`, if present.
fn strip_quotes(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

/// Canonical MIME form of a header name: the first letter and every letter
/// following a hyphen upper-cased, the rest lower-cased
/// (`content-type` → `Content-Type`).
pub fn canonical_header_key(name: &str) -> String {
    let mut canonical = String::with_capacity(name.len());
    let mut upper = true;

    for c in name.chars() {
        if upper {
            canonical.push(c.to_ascii_uppercase());
        } else {
            canonical.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }

    canonical
}
