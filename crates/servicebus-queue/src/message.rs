//! Queue message model.
//!
//! See <https://docs.microsoft.com/en-us/rest/api/servicebus/message-headers-and-properties>

use crate::properties::Properties;
use bytes::Bytes;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// `strftime` layout of the date and time part of an RFC-2616 timestamp,
/// e.g. `Sun, 06 Nov 1994 08:49:37`. The zone abbreviation follows it.
const RFC2616_LAYOUT: &str = "%a, %d %b %Y %H:%M:%S";

/// Layout of an RFC-2616 timestamp once the weekday and zone are removed.
const RFC2616_DATE_TIME_LAYOUT: &str = "%d %b %Y %H:%M:%S";

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A single queue message, either built by the caller for sending or decoded
/// from a response.
///
/// String fields use the empty string for "absent". Timestamps are `None` when
/// the service did not send them or sent something unparsable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub correlation_id: String,
    pub label: String,
    /// Proof of the current peek-lock; required to unlock or delete.
    pub lock_token: String,
    pub partition_key: String,
    pub reply_to: String,
    pub reply_to_session_id: String,
    pub to: String,
    pub content_type: String,

    pub sequence_number: i64,
    /// Number of previous deliveries of this message.
    pub delivery_count: u32,
    /// Time to live in seconds.
    pub time_to_live: u64,

    pub enqueued_time_utc: Option<DateTime<Utc>>,
    pub scheduled_enqueue_time_utc: Option<DateTime<Utc>>,
    pub locked_until_utc: Option<DateTime<Utc>>,

    /// User-defined properties, sent as individual HTTP headers.
    pub properties: Properties,

    pub body: Bytes,
}

impl Message {
    /// Create a message with the given body.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_partition_key(mut self, partition_key: impl Into<String>) -> Self {
        self.partition_key = partition_key.into();
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = reply_to.into();
        self
    }

    pub fn with_reply_to_session_id(mut self, reply_to_session_id: impl Into<String>) -> Self {
        self.reply_to_session_id = reply_to_session_id.into();
        self
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = to.into();
        self
    }

    /// Set the time to live in seconds.
    pub fn with_time_to_live(mut self, seconds: u64) -> Self {
        self.time_to_live = seconds;
        self
    }

    /// Ask the service to make the message visible only at `at`.
    pub fn with_scheduled_enqueue_time(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_enqueue_time_utc = Some(at);
        self
    }

    /// Add a user property (sent as an HTTP header).
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.set(key, value);
        self
    }
}

/// Parse an RFC-2616 timestamp such as `Sun, 06 Nov 1994 08:49:37 GMT`.
///
/// The weekday must be a three-letter day name but is not checked against
/// the date. The zone must look like an abbreviation: `UT`, `Z`, `UTC`,
/// `GMT` with an optional whole-hour offset (`GMT+3`), or three to five
/// upper-case letters where four or five letters end in `T`. Only the `GMT`
/// offset is applied; any other abbreviation is read as offset zero.
pub fn parse_rfc2616(value: &str) -> Option<DateTime<Utc>> {
    let (weekday, rest) = value.trim().split_once(", ")?;
    if !WEEKDAYS.iter().any(|day| day.eq_ignore_ascii_case(weekday)) {
        return None;
    }

    let (date_time, zone) = rest.rsplit_once(' ')?;
    let offset_hours = zone_offset_hours(zone)?;

    NaiveDateTime::parse_from_str(date_time, RFC2616_DATE_TIME_LAYOUT)
        .ok()
        .map(|naive| naive.and_utc() - Duration::hours(offset_hours))
}

/// Offset in hours east of UTC for a zone abbreviation, or `None` if `zone`
/// is not shaped like one.
fn zone_offset_hours(zone: &str) -> Option<i64> {
    if matches!(zone, "UT" | "Z" | "UTC" | "ChST" | "MeST") {
        return Some(0);
    }

    if let Some(offset) = zone.strip_prefix("GMT") {
        return gmt_offset_hours(offset);
    }

    if !zone.bytes().all(|b| b.is_ascii_uppercase()) {
        return None;
    }

    match zone.len() {
        3 => Some(0),
        4 | 5 if zone.ends_with('T') || zone == "WITA" => Some(0),
        _ => None,
    }
}

/// Parse the `+h`/`-hh` suffix of `GMT+h`. An empty suffix is plain `GMT`.
fn gmt_offset_hours(offset: &str) -> Option<i64> {
    if offset.is_empty() {
        return Some(0);
    }

    let (sign, digits) = if let Some(digits) = offset.strip_prefix('+') {
        (1, digits)
    } else if let Some(digits) = offset.strip_prefix('-') {
        (-1, digits)
    } else {
        return None;
    };

    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: i64 = digits.parse().ok()?;
    if !(-23..=23).contains(&(sign * hours)) {
        return None;
    }

    Some(sign * hours)
}

/// Format a timestamp in the RFC-2616 layout with the `GMT` zone.
pub fn format_rfc2616(value: DateTime<Utc>) -> String {
    format!("{} GMT", value.format(RFC2616_LAYOUT))
}
