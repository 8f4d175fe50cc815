//! Tests for the servicebus-queue-cli library module.

use super::*;
use serial_test::serial;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn clear_env() {
    for var in [
        "SBQ__NAMESPACE",
        "SBQ__KEY_NAME",
        "SBQ__KEY_VALUE",
        "SBQ__QUEUE_NAME",
        "SBQ__TIMEOUT",
        "SBQ__ENDPOINT",
    ] {
        std::env::remove_var(var);
    }
}

// ============================================================================
// Argument Parsing
// ============================================================================

#[test]
fn test_cli_parsing_send() {
    let cli = Cli::try_parse_from([
        "sbq",
        "--queue",
        "orders",
        "send",
        "--body",
        "hello",
        "-p",
        "Region=west",
        "--property",
        "Priority=High",
        "--label",
        "greeting",
    ])
    .unwrap();

    assert_eq!(cli.connection.queue.as_deref(), Some("orders"));
    match cli.command {
        Commands::Send(args) => {
            assert_eq!(args.body.as_deref(), Some("hello"));
            assert_eq!(args.label.as_deref(), Some("greeting"));
            assert_eq!(
                args.properties,
                vec![
                    ("Region".to_string(), "west".to_string()),
                    ("Priority".to_string(), "High".to_string()),
                ]
            );
        }
        other => panic!("Expected Send command, got {:?}", other),
    }
}

#[test]
fn test_cli_parsing_receive_defaults() {
    let cli = Cli::try_parse_from(["sbq", "receive"]).unwrap();

    assert_eq!(cli.log_level, "warn");
    assert!(!cli.json_logs);
    match cli.command {
        Commands::Receive {
            timeout,
            delete,
            unlock,
            format,
        } => {
            assert_eq!(timeout, None);
            assert!(!delete);
            assert!(!unlock);
            assert_eq!(format, OutputFormat::Text);
        }
        other => panic!("Expected Receive command, got {:?}", other),
    }
}

#[test]
fn test_cli_rejects_delete_with_unlock() {
    let result = Cli::try_parse_from(["sbq", "receive", "--delete", "--unlock"]);

    assert!(result.is_err());
}

#[test]
fn test_global_connection_args_after_subcommand() {
    let cli = Cli::try_parse_from([
        "sbq",
        "delete",
        "--id",
        "m-1",
        "--lock-token",
        "lock-1",
        "--endpoint",
        "http://localhost:8080",
    ])
    .unwrap();

    assert_eq!(
        cli.connection.endpoint.as_deref(),
        Some("http://localhost:8080")
    );
    match cli.command {
        Commands::Delete(args) => {
            assert_eq!(args.id, "m-1");
            assert_eq!(args.lock_token, "lock-1");
        }
        other => panic!("Expected Delete command, got {:?}", other),
    }
}

#[test]
fn test_parse_property() {
    assert_eq!(
        parse_property("key=value").unwrap(),
        ("key".to_string(), "value".to_string())
    );
    assert_eq!(
        parse_property("url=http://x?a=b").unwrap(),
        ("url".to_string(), "http://x?a=b".to_string())
    );
    assert_eq!(
        parse_property("empty=").unwrap(),
        ("empty".to_string(), String::new())
    );
    assert!(parse_property("novalue").is_err());
    assert!(parse_property("=value").is_err());
}

// ============================================================================
// Message Construction and Output
// ============================================================================

#[test]
fn test_build_message_from_args() {
    let args = SendArgs {
        body: Some("payload".to_string()),
        properties: vec![("Region".to_string(), "west".to_string())],
        id: Some("m-1".to_string()),
        session_id: Some("s-1".to_string()),
        ttl: Some(60),
        ..SendArgs::default()
    };

    let message = build_message(&args).unwrap();

    assert_eq!(&message.body[..], b"payload");
    assert_eq!(message.id, "m-1");
    assert_eq!(message.session_id, "s-1");
    assert_eq!(message.time_to_live, 60);
    assert_eq!(message.properties.get("region"), Some("west"));
}

#[test]
fn test_build_message_reads_body_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("body.json");
    std::fs::write(&path, br#"{"order":42}"#).unwrap();
    let args = SendArgs {
        body_file: Some(path),
        ..SendArgs::default()
    };

    let message = build_message(&args).unwrap();

    assert_eq!(&message.body[..], br#"{"order":42}"#);
}

#[test]
fn test_build_message_requires_body() {
    let err = build_message(&SendArgs::default()).unwrap_err();

    assert!(matches!(err, CliError::InvalidArgument { .. }));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_message_view_json() {
    let message = Message::new("hi")
        .with_id("m-1")
        .with_property("Region", "west");

    let rendered = MessageView::from(&message)
        .render(OutputFormat::Json)
        .unwrap();

    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["id"], "m-1");
    assert_eq!(value["body"], "hi");
    assert_eq!(value["properties"]["Region"], "west");
    assert!(value.get("label").is_none());
    assert!(value.get("enqueued_time_utc").is_none());
}

#[test]
fn test_message_view_text() {
    let message = Message::new("hi").with_id("m-1");

    let rendered = MessageView::from(&message)
        .render(OutputFormat::Text)
        .unwrap();

    assert!(rendered.starts_with("Id:             m-1"));
    assert!(rendered.ends_with("\nhi"));
}

// ============================================================================
// Configuration and Errors
// ============================================================================

#[test]
fn test_apply_overrides() {
    let mut config = QueueClientConfig::new("ns", "policy", "key", "queue");
    let overrides = ConnectionArgs {
        queue: Some("other".to_string()),
        endpoint: Some("http://localhost:1234".to_string()),
        ..ConnectionArgs::default()
    };

    apply_overrides(&mut config, &overrides);

    assert_eq!(config.namespace, "ns");
    assert_eq!(config.queue_name, "other");
    assert_eq!(config.endpoint.as_deref(), Some("http://localhost:1234"));
}

#[test]
#[serial]
fn test_load_configuration_merges_flags_over_environment() {
    // Arrange
    clear_env();
    std::env::set_var("SBQ__NAMESPACE", "env-ns");
    std::env::set_var("SBQ__KEY_NAME", "EnvPolicy");
    std::env::set_var("SBQ__KEY_VALUE", "env-secret");
    let overrides = ConnectionArgs {
        queue: Some("flag-queue".to_string()),
        ..ConnectionArgs::default()
    };

    // Act
    let result = load_configuration(None, &overrides);

    // Assert
    clear_env();
    let config = result.unwrap();
    assert_eq!(config.namespace, "env-ns");
    assert_eq!(config.queue_name, "flag-queue");
}

#[test]
#[serial]
fn test_load_configuration_reports_missing_setting() {
    clear_env();

    let err = load_configuration(None, &ConnectionArgs::default()).unwrap_err();

    assert!(matches!(err, CliError::Configuration(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_exit_codes_for_queue_errors() {
    let empty = CliError::from(servicebus_queue::classify(204, "").unwrap_err());
    let missing = CliError::from(servicebus_queue::classify(404, "").unwrap_err());

    assert_eq!(empty.exit_code(), 3);
    assert_eq!(missing.exit_code(), 2);
}

// ============================================================================
// Command Execution
// ============================================================================

#[tokio::test]
#[serial]
async fn test_run_send_against_endpoint() {
    // Arrange
    clear_env();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/messages/"))
        .and(header_exists("Authorization"))
        .and(header_exists("Region"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let cli = Cli::try_parse_from([
        "sbq",
        "--endpoint",
        server.uri().as_str(),
        "--queue",
        "orders",
        "--key-name",
        "policy",
        "--key-value",
        "secret",
        "send",
        "--body",
        "hello",
        "-p",
        "Region=west",
    ])
    .unwrap();

    // Act
    let result = run(cli).await;

    // Assert
    assert!(result.is_ok(), "send failed: {:?}", result.err());
}

#[tokio::test]
#[serial]
async fn test_run_receive_empty_queue() {
    clear_env();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/orders/messages/head"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let cli = Cli::try_parse_from([
        "sbq",
        "--endpoint",
        server.uri().as_str(),
        "-q",
        "orders",
        "--key-name",
        "policy",
        "--key-value",
        "secret",
        "receive",
        "--timeout",
        "0",
    ])
    .unwrap();

    let err = run(cli).await.unwrap_err();

    assert_eq!(err.exit_code(), 3);
}
