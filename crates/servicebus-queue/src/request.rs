//! Construction of signed REST requests.

use crate::auth::SharedAccessKey;
use crate::codec::encode_message;
use crate::config::QueueClientConfig;
use crate::error::QueueError;
use crate::message::Message;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Url};
use tracing::debug;

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

/// Full URL of `path` on the configured queue.
///
/// `path` is appended verbatim, query string included.
pub fn request_url(config: &QueueClientConfig, path: &str) -> String {
    format!("{}/{}/{}", config.base_url(), config.queue_name, path)
}

/// Build a signed request for `path` on the configured queue.
///
/// When `message` is given its body and headers are attached. The
/// `Authorization` header is signed at `sign_time` over the URL exactly as
/// produced by [`request_url`].
///
/// # Errors
///
/// Returns [`QueueError::RequestConstruction`] if the URL does not parse or a
/// header cannot be represented.
pub fn build_request(
    config: &QueueClientConfig,
    key: &SharedAccessKey,
    sign_time: DateTime<Utc>,
    method: Method,
    path: &str,
    message: Option<&Message>,
) -> Result<reqwest::Request, QueueError> {
    let url = request_url(config, path);
    let parsed = Url::parse(&url)
        .map_err(|e| QueueError::request_construction(format!("Invalid URL '{}'", url), e))?;

    let mut request = reqwest::Request::new(method, parsed);

    if let Some(message) = message {
        let encoded = encode_message(message)?;
        request.headers_mut().extend(encoded.headers);
        *request.body_mut() = Some(encoded.body.into());
    }

    let authorization = HeaderValue::from_str(&key.authorization(&url, sign_time))
        .map_err(|e| QueueError::request_construction("Invalid Authorization header", e))?;
    request.headers_mut().insert(AUTHORIZATION, authorization);

    debug!(
        method = %request.method(),
        url = %url,
        has_message = message.is_some(),
        "Built queue request"
    );

    Ok(request)
}
