//! Tests for the servicebus-queue library surface.

use super::*;
use bytes::Bytes;

/// A message survives encoding for send and decoding as if received, apart
/// from the fields only the service assigns.
#[test]
fn test_sent_message_decodes_to_same_metadata() {
    // Arrange
    let original = Message::new("order #42")
        .with_id("order-42")
        .with_session_id("customer-7")
        .with_correlation_id("corr-1")
        .with_label("order")
        .with_property("Region", "west");

    // Act
    let encoded = encode_message(&original).unwrap();
    let decoded = decode_message(&encoded.headers, encoded.body.clone());

    // Assert
    assert_eq!(decoded.id, original.id);
    assert_eq!(decoded.session_id, original.session_id);
    assert_eq!(decoded.correlation_id, original.correlation_id);
    assert_eq!(decoded.label, original.label);
    assert_eq!(decoded.properties.get("region"), Some("west"));
    assert_eq!(decoded.body, Bytes::from_static(b"order #42"));
    assert!(decoded.lock_token.is_empty());
}

#[test]
fn test_error_classification_from_crate_root() {
    let err = classify(410, "queue deleted").unwrap_err();

    assert!(err.is_classified());
    assert!(!err.is_no_messages());
}
