//! # Service Bus Queue CLI
//!
//! Command-line interface for a single Service Bus queue.
//!
//! This module provides CLI commands for:
//! - Sending a message with system and user properties
//! - Receiving (peek-lock) the next message, optionally completing or
//!   releasing it straight away
//! - Unlocking or deleting a previously received message
//! - Printing a SAS `Authorization` header for ad-hoc requests
//!
//! Connection settings come from an optional config file, then `SBQ__*`
//! environment variables, then command-line flags.

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use servicebus_queue::{
    format_rfc2616, ConfigurationError, Message, QueueClient, QueueClientConfig, QueueError,
    SharedAccessKey,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

// ============================================================================
// CLI Structure
// ============================================================================

/// sbq - send and receive Azure Service Bus queue messages
#[derive(Debug, Parser)]
#[command(name = "sbq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Send and receive Azure Service Bus queue messages")]
#[command(
    long_about = "Talks to a Service Bus queue over the REST API using a shared access policy"
)]
pub struct Cli {
    /// Configuration file path (TOML, JSON or YAML)
    #[arg(short, long, env = "SBQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level or filter directive
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings that override the configuration sources.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct ConnectionArgs {
    /// Service Bus namespace
    #[arg(long, global = true)]
    pub namespace: Option<String>,

    /// Queue name
    #[arg(short, long, global = true)]
    pub queue: Option<String>,

    /// Shared access policy name
    #[arg(long, global = true)]
    pub key_name: Option<String>,

    /// Shared access policy key
    #[arg(long, global = true)]
    pub key_value: Option<String>,

    /// Base URL replacing https://<namespace>.servicebus.windows.net:443
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

/// Available CLI commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Send a message to the queue
    Send(SendArgs),

    /// Receive and lock the next message
    Receive {
        /// Seconds the service may wait for a message
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Delete the message after printing it
        #[arg(long, conflicts_with = "unlock")]
        delete: bool,

        /// Release the lock after printing the message
        #[arg(long)]
        unlock: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Release the lock on a received message
    Unlock(LockArgs),

    /// Delete a received message
    Delete(LockArgs),

    /// Print a SAS Authorization header for a resource URI
    Token {
        /// Resource URI to sign, exactly as it will be requested
        #[arg(long)]
        uri: String,
    },
}

/// Message content and metadata for `send`.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct SendArgs {
    /// Message body
    #[arg(short, long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the message body from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// User property as key=value, may be repeated
    #[arg(short, long = "property", value_parser = parse_property)]
    pub properties: Vec<(String, String)>,

    #[arg(long)]
    pub id: Option<String>,

    #[arg(long)]
    pub label: Option<String>,

    #[arg(long)]
    pub session_id: Option<String>,

    #[arg(long)]
    pub correlation_id: Option<String>,

    #[arg(long)]
    pub content_type: Option<String>,

    /// Time to live in seconds
    #[arg(long)]
    pub ttl: Option<u64>,
}

/// Identifies a locked message.
#[derive(Debug, Clone, clap::Args)]
pub struct LockArgs {
    /// Message id
    #[arg(long)]
    pub id: String,

    /// Lock token returned when the message was received
    #[arg(long)]
    pub lock_token: String,
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Configuration(_) => 1,
            CliError::Queue(e) if e.is_no_messages() => 3,
            CliError::Queue(_) => 2,
            CliError::InvalidArgument { .. } => 4,
            CliError::Io(_) => 5,
            CliError::Output(_) => 6,
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Printable view of a received message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageView {
    pub id: String,
    pub lock_token: String,
    pub sequence_number: i64,
    pub delivery_count: u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub session_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub correlation_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enqueued_time_utc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until_utc: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub body: String,
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            lock_token: message.lock_token.clone(),
            sequence_number: message.sequence_number,
            delivery_count: message.delivery_count,
            label: message.label.clone(),
            session_id: message.session_id.clone(),
            correlation_id: message.correlation_id.clone(),
            content_type: message.content_type.clone(),
            enqueued_time_utc: message.enqueued_time_utc.map(format_rfc2616),
            locked_until_utc: message.locked_until_utc.map(format_rfc2616),
            properties: message
                .properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: String::from_utf8_lossy(&message.body).into_owned(),
        }
    }
}

impl MessageView {
    pub fn render(&self, format: OutputFormat) -> Result<String, CliError> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Text => {
                let mut lines = vec![
                    format!("Id:             {}", self.id),
                    format!("Lock token:     {}", self.lock_token),
                    format!("Sequence:       {}", self.sequence_number),
                    format!("Delivery count: {}", self.delivery_count),
                ];
                if let Some(enqueued) = &self.enqueued_time_utc {
                    lines.push(format!("Enqueued:       {}", enqueued));
                }
                for (key, value) in &self.properties {
                    lines.push(format!("{}: {}", key, value));
                }
                lines.push(String::new());
                lines.push(self.body.clone());
                Ok(lines.join("\n"))
            }
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    initialize_logging(&cli.log_level, cli.json_logs)?;

    run(cli).await
}

/// Execute a parsed command line. Logging must already be set up.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_configuration(cli.config.as_deref(), &cli.connection)?;
    debug!(config = ?config, "Resolved configuration");

    match cli.command {
        Commands::Send(args) => execute_send_command(config, args).await,
        Commands::Receive {
            timeout,
            delete,
            unlock,
            format,
        } => execute_receive_command(config, timeout, delete, unlock, format).await,
        Commands::Unlock(args) => execute_unlock_command(config, args).await,
        Commands::Delete(args) => execute_delete_command(config, args).await,
        Commands::Token { uri } => execute_token_command(&config, &uri),
    }
}

/// Initialize logging to stderr, leaving stdout for command output.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn initialize_logging(level: &str, json: bool) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| CliError::InvalidArgument {
            arg: "log-level".to_string(),
            message: e.to_string(),
        })?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::InvalidArgument {
        arg: "log-level".to_string(),
        message: e.to_string(),
    })
}

/// Load configuration from file and environment, apply command-line
/// overrides, then validate.
pub fn load_configuration(
    path: Option<&Path>,
    overrides: &ConnectionArgs,
) -> Result<QueueClientConfig, CliError> {
    let mut config = QueueClientConfig::from_sources(path)?;
    apply_overrides(&mut config, overrides);
    config.validate()?;
    Ok(config)
}

/// Replace configured settings with those given on the command line.
pub fn apply_overrides(config: &mut QueueClientConfig, overrides: &ConnectionArgs) {
    if let Some(namespace) = &overrides.namespace {
        config.namespace = namespace.clone();
    }
    if let Some(queue) = &overrides.queue {
        config.queue_name = queue.clone();
    }
    if let Some(key_name) = &overrides.key_name {
        config.key_name = key_name.clone();
    }
    if let Some(key_value) = &overrides.key_value {
        config.key_value = key_value.clone();
    }
    if let Some(endpoint) = &overrides.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
}

/// Parse a `key=value` user property.
pub fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

/// Build the outbound message described by `args`.
pub fn build_message(args: &SendArgs) -> Result<Message, CliError> {
    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone().into_bytes(),
        (None, Some(path)) => std::fs::read(path)?,
        (None, None) => {
            return Err(CliError::InvalidArgument {
                arg: "body".to_string(),
                message: "either --body or --body-file is required".to_string(),
            })
        }
    };

    let mut message = Message::new(body);
    if let Some(id) = &args.id {
        message = message.with_id(id);
    }
    if let Some(label) = &args.label {
        message = message.with_label(label);
    }
    if let Some(session_id) = &args.session_id {
        message = message.with_session_id(session_id);
    }
    if let Some(correlation_id) = &args.correlation_id {
        message = message.with_correlation_id(correlation_id);
    }
    if let Some(content_type) = &args.content_type {
        message = message.with_content_type(content_type);
    }
    if let Some(ttl) = args.ttl {
        message = message.with_time_to_live(ttl);
    }
    for (key, value) in &args.properties {
        message = message.with_property(key, value);
    }

    Ok(message)
}

fn locked_message(args: LockArgs) -> Message {
    Message {
        id: args.id,
        lock_token: args.lock_token,
        ..Message::default()
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn execute_send_command(config: QueueClientConfig, args: SendArgs) -> Result<(), CliError> {
    let message = build_message(&args)?;
    info!(
        queue = %config.queue_name,
        bytes = message.body.len(),
        properties = message.properties.len(),
        "Sending message"
    );

    QueueClient::new(config).send_message(&message).await?;

    println!("Message sent");
    Ok(())
}

async fn execute_receive_command(
    mut config: QueueClientConfig,
    timeout: Option<u64>,
    delete: bool,
    unlock: bool,
    format: OutputFormat,
) -> Result<(), CliError> {
    if let Some(timeout) = timeout {
        config.timeout = timeout;
    }
    info!(
        queue = %config.queue_name,
        timeout = config.timeout,
        "Receiving message"
    );

    let client = QueueClient::new(config);
    let message = client.get_message().await?;

    println!("{}", MessageView::from(&message).render(format)?);

    if delete {
        client.delete_message(&message).await?;
        info!(message_id = %message.id, "Message deleted");
    } else if unlock {
        client.unlock_message(&message).await?;
        info!(message_id = %message.id, "Message unlocked");
    }

    Ok(())
}

async fn execute_unlock_command(config: QueueClientConfig, args: LockArgs) -> Result<(), CliError> {
    info!(queue = %config.queue_name, message_id = %args.id, "Unlocking message");

    QueueClient::new(config)
        .unlock_message(&locked_message(args))
        .await?;

    println!("Message unlocked");
    Ok(())
}

async fn execute_delete_command(config: QueueClientConfig, args: LockArgs) -> Result<(), CliError> {
    info!(queue = %config.queue_name, message_id = %args.id, "Deleting message");

    QueueClient::new(config)
        .delete_message(&locked_message(args))
        .await?;

    println!("Message deleted");
    Ok(())
}

fn execute_token_command(config: &QueueClientConfig, uri: &str) -> Result<(), CliError> {
    let key = SharedAccessKey::new(config.key_name.clone(), config.key_value.clone());
    println!("{}", key.authorization(uri, Utc::now()));
    Ok(())
}
