//! Classification of HTTP responses into success or a typed [`QueueError`].

use crate::error::QueueError;
use tracing::debug;

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

/// Check if `status` means the operation succeeded.
pub fn is_success(status: u16) -> bool {
    status == 200 || status == 201
}

/// Map a status code and the full response body to a result.
///
/// 200 and 201 succeed whatever the body holds. The recognised error codes map
/// to their own variants; anything else becomes
/// [`QueueError::UnknownStatus`].
pub fn classify(status: u16, body: &str) -> Result<(), QueueError> {
    if is_success(status) {
        return Ok(());
    }

    Err(status_error(status, body.to_string()))
}

fn status_error(status: u16, body: String) -> QueueError {
    match status {
        204 => QueueError::NoMessagesAvailable { status, body },
        400 => QueueError::BadRequest { status, body },
        401 => QueueError::NotAuthorized { status, body },
        404 => QueueError::MessageNotFound { status, body },
        410 => QueueError::QueueNotFound { status, body },
        500 => QueueError::InternalServiceError { status, body },
        _ => QueueError::UnknownStatus { status, body },
    }
}

/// Pass a successful response through, or read its body and classify it.
///
/// # Errors
///
/// Returns the classified error for non-success statuses, or
/// [`QueueError::BodyRead`] when the error body cannot be read.
pub async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, QueueError> {
    let status = response.status().as_u16();
    if is_success(status) {
        return Ok(response);
    }

    let body = response.bytes().await.map_err(QueueError::body_read)?;
    let body = String::from_utf8_lossy(&body).into_owned();
    debug!(status = status, body = %body, "Service returned an error status");

    Err(status_error(status, body))
}
