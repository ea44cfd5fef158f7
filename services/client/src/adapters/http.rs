//! services/client/src/adapters/http.rs
//!
//! Shared plumbing for the outbound HTTP adapters: client construction with
//! the configured request timeout, and the status-to-port-error mapping.

use std::time::Duration;

use reqwest::{Response, StatusCode};
use study_coach_core::ports::{PortError, PortResult};

use crate::error::ClientError;

/// Builds the shared HTTP client. A single client is created at startup and
/// cloned into each adapter; the timeout bounds every remote call so a hung
/// request can never pin a loading flag forever.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client, ClientError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;
    Ok(client)
}

/// Maps a non-2xx response to the port error taxonomy. `subject` names the
/// document or request the caller was addressing.
pub(crate) fn ensure_success(response: Response, subject: &str) -> PortResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(match status {
        StatusCode::NOT_FOUND => PortError::NotFound(subject.to_string()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        _ => PortError::Unexpected(format!("{subject}: request failed with status {status}")),
    })
}

/// Base URLs are stored without a trailing slash so route formatting stays
/// uniform.
pub(crate) fn normalize_base_url(base_url: String) -> String {
    base_url.trim_end_matches('/').to_string()
}
