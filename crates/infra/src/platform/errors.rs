//! Platform error bodies → [`RemoteError`].

use adsync_core::limiter::RemoteError;
use reqwest::StatusCode;

use super::types::ErrorEnvelope;

/// Longest slice of an unparseable body kept in the error message.
const BODY_SNIPPET_LEN: usize = 200;

/// Build a [`RemoteError`] from a non-success response.
///
/// The platform's `error.code` / `error.error_subcode` are kept verbatim so
/// throttling signatures can be matched; bodies that are not the platform's
/// error envelope fall back to the HTTP status alone.
pub(crate) fn remote_error_from_body(status: StatusCode, body: &str) -> RemoteError {
    let code = status.as_u16();

    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let message = if envelope.error.message.is_empty() {
                status.canonical_reason().unwrap_or("platform error").to_string()
            } else {
                envelope.error.message
            };
            RemoteError::api(Some(code), envelope.error.code, envelope.error.error_subcode, message)
        }
        Err(_) => {
            let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
            let message = if snippet.trim().is_empty() {
                status.canonical_reason().unwrap_or("unexpected status").to_string()
            } else {
                snippet
            };
            RemoteError::http(code, message)
        }
    }
}
