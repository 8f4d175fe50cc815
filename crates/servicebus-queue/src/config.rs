//! Client configuration.
//!
//! A [`QueueClientConfig`] names the queue and carries the shared access
//! policy used to sign requests. It can be built in code or loaded with
//! [`QueueClientConfig::load`], which layers an optional file under
//! environment variables:
//!
//! | Setting      | Environment variable  | Default |
//! |--------------|-----------------------|---------|
//! | `namespace`  | `SBQ__NAMESPACE`      |         |
//! | `key_name`   | `SBQ__KEY_NAME`       |         |
//! | `key_value`  | `SBQ__KEY_VALUE`      |         |
//! | `queue_name` | `SBQ__QUEUE_NAME`     |         |
//! | `timeout`    | `SBQ__TIMEOUT`        | 60      |
//! | `endpoint`   | `SBQ__ENDPOINT`       | none    |

use crate::error::ConfigurationError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Prefix of the environment variables read by [`QueueClientConfig::load`].
pub const ENV_PREFIX: &str = "SBQ";

/// Server-side wait, in seconds, used when none is configured.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Connection settings for one queue.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct QueueClientConfig {
    /// Service Bus namespace, the `<namespace>` in
    /// `<namespace>.servicebus.windows.net`.
    #[serde(default)]
    pub namespace: String,

    /// Name of the shared access policy.
    #[serde(default)]
    pub key_name: String,

    /// Shared access policy key. Never printed.
    #[serde(default)]
    pub key_value: String,

    #[serde(default)]
    pub queue_name: String,

    /// Seconds the service may hold a receive request open waiting for a
    /// message. Sent to the service, not enforced locally.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Replaces `https://<namespace>.servicebus.windows.net:443` as the base
    /// of every request URL.
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl QueueClientConfig {
    pub fn new(
        namespace: impl Into<String>,
        key_name: impl Into<String>,
        key_value: impl Into<String>,
        queue_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key_name: key_name.into(),
            key_value: key_value.into(),
            queue_name: queue_name.into(),
            timeout: DEFAULT_TIMEOUT_SECONDS,
            endpoint: None,
        }
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Base URL requests are built on, without a trailing slash.
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.servicebus.windows.net:443", self.namespace),
        }
    }

    /// Load configuration from an optional file, then `SBQ__*` environment
    /// variables, and validate the result.
    ///
    /// The file format follows its extension (TOML, JSON or YAML). When a path
    /// is given the file must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Load`] when a source cannot be read or
    /// deserialized, and the errors of [`validate`](Self::validate) otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let config = Self::from_sources(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge the file and environment sources without validating, so callers
    /// can apply their own overrides first.
    pub fn from_sources(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Check that every setting needed to sign and address requests is present.
    ///
    /// The namespace may be empty when an endpoint override is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Missing`] for an empty required setting
    /// and [`ConfigurationError::Invalid`] for a malformed endpoint.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.namespace.trim().is_empty() && self.endpoint.is_none() {
            return Err(missing("namespace"));
        }
        if self.key_name.trim().is_empty() {
            return Err(missing("key_name"));
        }
        if self.key_value.is_empty() {
            return Err(missing("key_value"));
        }
        if self.queue_name.trim().is_empty() {
            return Err(missing("queue_name"));
        }

        if let Some(endpoint) = &self.endpoint {
            let url = reqwest::Url::parse(endpoint).map_err(|e| ConfigurationError::Invalid {
                key: "endpoint".to_string(),
                message: e.to_string(),
            })?;

            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(ConfigurationError::Invalid {
                    key: "endpoint".to_string(),
                    message: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
        }

        Ok(())
    }
}

fn missing(key: &str) -> ConfigurationError {
    ConfigurationError::Missing {
        key: key.to_string(),
    }
}

impl fmt::Debug for QueueClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueClientConfig")
            .field("namespace", &self.namespace)
            .field("key_name", &self.key_name)
            .field("key_value", &"<REDACTED>")
            .field("queue_name", &self.queue_name)
            .field("timeout", &self.timeout)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
