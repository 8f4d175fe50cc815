//! Shared Access Signature (SAS) authentication.
//!
//! Every request carries an `Authorization` header of the form
//!
//! ```text
//! SharedAccessSignature sig=<signature>&se=<expiry>&skn=<key name>&sr=<resource>
//! ```
//!
//! where `resource` is the query-escaped, lower-cased request URL and
//! `signature` is the query-escaped base64 HMAC-SHA256 of
//! `resource + "\n" + expiry` keyed with the policy secret.
//!
//! For more information see
//! <https://docs.microsoft.com/en-us/azure/service-bus-messaging/service-bus-sas>

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

/// Lifetime of a generated token.
pub const TOKEN_EXPIRY_SECONDS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

// ============================================================================
// Time Source
// ============================================================================

/// Source of the signing time for request authorization.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Shared access policy credentials.
///
/// The key value is the signing secret and is never printed by `Debug`.
#[derive(Clone)]
pub struct SharedAccessKey {
    key_name: String,
    key_value: String,
}

impl SharedAccessKey {
    /// Create credentials from a policy name (e.g. `RootManageSharedAccessKey`)
    /// and its key.
    pub fn new(key_name: impl Into<String>, key_value: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            key_value: key_value.into(),
        }
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Build the `Authorization` header value for `resource_uri` signed at
    /// `sign_time`.
    pub fn authorization(&self, resource_uri: &str, sign_time: DateTime<Utc>) -> String {
        auth_header(&self.key_value, &self.key_name, resource_uri, sign_time)
    }
}

impl fmt::Debug for SharedAccessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedAccessKey")
            .field("key_name", &self.key_name)
            .field("key_value", &"<REDACTED>")
            .finish()
    }
}

// ============================================================================
// Signing
// ============================================================================

/// Compute the query-escaped base64 HMAC-SHA256 of `message` keyed with
/// `secret`.
pub fn signature(secret: &str, message: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());

    let encoded = STANDARD.encode(mac.finalize().into_bytes());
    query_escape(&encoded)
}

/// Build the SAS `Authorization` header value.
///
/// The token expires [`TOKEN_EXPIRY_SECONDS`] after `sign_time`, rounded to the
/// nearest second.
pub fn auth_header(
    secret: &str,
    key_name: &str,
    resource_uri: &str,
    sign_time: DateTime<Utc>,
) -> String {
    let expiry = expiry_epoch(sign_time).to_string();

    let encoded_uri = query_escape(resource_uri).to_lowercase();
    let sig = signature(secret, &format!("{}\n{}", encoded_uri, expiry));

    format!(
        "SharedAccessSignature sig={}&se={}&skn={}&sr={}",
        sig, expiry, key_name, encoded_uri
    )
}

/// Unix seconds at which a token signed at `sign_time` expires.
pub fn expiry_epoch(sign_time: DateTime<Utc>) -> i64 {
    let expires_at = sign_time + Duration::seconds(TOKEN_EXPIRY_SECONDS);

    let round_up = expires_at.timestamp_subsec_nanos() >= 500_000_000;
    expires_at.timestamp() + i64::from(round_up)
}

/// Escape `value` for use inside a URL query component.
///
/// Unreserved characters pass through, a space becomes `+` and everything else
/// is percent-encoded with upper-case hex digits.
pub fn query_escape(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}
