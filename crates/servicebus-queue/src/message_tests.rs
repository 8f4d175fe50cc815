//! Tests for message types.

use super::*;
use chrono::TimeZone;

#[test]
fn test_message_builder() {
    let scheduled = Utc.with_ymd_and_hms(2018, 2, 22, 10, 3, 56).unwrap();

    let message = Message::new("Hello!")
        .with_session_id("SessionA")
        .with_content_type("CustomContentType")
        .with_correlation_id("corr-123")
        .with_time_to_live(90)
        .with_scheduled_enqueue_time(scheduled)
        .with_property("Prop1", "Value1");

    assert_eq!(message.body, Bytes::from_static(b"Hello!"));
    assert_eq!(message.session_id, "SessionA");
    assert_eq!(message.content_type, "CustomContentType");
    assert_eq!(message.correlation_id, "corr-123");
    assert_eq!(message.time_to_live, 90);
    assert_eq!(message.scheduled_enqueue_time_utc, Some(scheduled));
    assert_eq!(message.properties.get("prop1"), Some("Value1"));
}

#[test]
fn test_default_message_is_empty() {
    let message = Message::default();

    assert!(message.id.is_empty());
    assert!(message.body.is_empty());
    assert!(message.properties.is_empty());
    assert_eq!(message.enqueued_time_utc, None);
    assert_eq!(message.delivery_count, 0);
}

#[test]
fn test_parse_rfc2616_gmt() {
    let parsed = parse_rfc2616("Sun, 06 Nov 1994 08:49:37 GMT");

    assert_eq!(
        parsed,
        Some(Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap())
    );
}

#[test]
fn test_parse_rfc2616_unknown_zone_is_offset_zero() {
    let parsed = parse_rfc2616("Thu, 22 Feb 2018 10:03:56 NZDT");

    assert_eq!(
        parsed,
        Some(Utc.with_ymd_and_hms(2018, 2, 22, 10, 3, 56).unwrap())
    );
}

#[test]
fn test_parse_rfc2616_ignores_mismatched_weekday() {
    let parsed = parse_rfc2616("Mon, 06 Nov 1994 08:49:37 GMT");

    assert_eq!(
        parsed,
        Some(Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap())
    );
}

#[test]
fn test_parse_rfc2616_rejects_unknown_weekday() {
    assert_eq!(parse_rfc2616("Xyz, 06 Nov 1994 08:49:37 GMT"), None);
    assert_eq!(parse_rfc2616("Sunday, 06 Nov 1994 08:49:37 GMT"), None);
}

#[test]
fn test_parse_rfc2616_zone_abbreviations() {
    let expected = Some(Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap());

    for zone in ["GMT", "UTC", "UT", "Z", "PST", "CEST", "ChST", "WITA"] {
        let value = format!("Sun, 06 Nov 1994 08:49:37 {}", zone);
        assert_eq!(parse_rfc2616(&value), expected, "zone {}", zone);
    }

    for zone in ["z", "ab", "gmt", "Pst", "ABCD", "ABCDEF"] {
        let value = format!("Sun, 06 Nov 1994 08:49:37 {}", zone);
        assert_eq!(parse_rfc2616(&value), None, "zone {}", zone);
    }
}

#[test]
fn test_parse_rfc2616_applies_gmt_offset() {
    assert_eq!(
        parse_rfc2616("Sun, 06 Nov 1994 08:49:37 GMT+3"),
        Some(Utc.with_ymd_and_hms(1994, 11, 6, 5, 49, 37).unwrap())
    );
    assert_eq!(
        parse_rfc2616("Sun, 06 Nov 1994 08:49:37 GMT-10"),
        Some(Utc.with_ymd_and_hms(1994, 11, 6, 18, 49, 37).unwrap())
    );
    assert_eq!(parse_rfc2616("Sun, 06 Nov 1994 08:49:37 GMT+24"), None);
    assert_eq!(parse_rfc2616("Sun, 06 Nov 1994 08:49:37 GMT+"), None);
}

#[test]
fn test_parse_rfc2616_rejects_malformed_values() {
    assert_eq!(parse_rfc2616(""), None);
    assert_eq!(parse_rfc2616("not a date"), None);
    assert_eq!(parse_rfc2616("2018-02-22T10:03:56Z"), None);
    assert_eq!(parse_rfc2616("Sun, 06 Nov 1994 08:49:37"), None);
    assert_eq!(parse_rfc2616("Sun, 06 Nov 1994 08:49:37 +0100"), None);
}

#[test]
fn test_format_rfc2616() {
    let value = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();

    assert_eq!(format_rfc2616(value), "Sun, 06 Nov 1994 08:49:37 GMT");
    assert_eq!(parse_rfc2616(&format_rfc2616(value)), Some(value));
}
