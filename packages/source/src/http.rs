//! HTTP helpers with retry for transient upstream errors.
//!
//! Fetchers should use [`send_json`] instead of calling
//! `reqwest::RequestBuilder::send()` directly so that connection failures,
//! timeouts, HTTP 429, and HTTP 5xx are retried with exponential backoff
//! according to the caller's [`RetryPolicy`].
//!
//! ```ignore
//! let body = http::send_json(|| client.get(&url).query(&params), &policy, None).await?;
//! ```

use accident_map_retry::{RetryPolicy, retry};
use tokio::time::Instant;

use crate::SourceError;

/// Maximum number of characters of a bad response body included in logs.
const BODY_PREVIEW_LEN: usize = 500;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// Does **not** retry HTTP 4xx (except 429) or bodies that fail to parse;
/// those are permanent for this request.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails after all retries, the
/// server returns a non-retryable status code, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(
    build_request: F,
    policy: &RetryPolicy,
    deadline: Option<Instant>,
) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    retry(policy, "upstream request", deadline, || {
        send_once(&build_request)
    })
    .await
}

/// Sends one attempt of the request built by `build_request`.
#[allow(clippy::future_not_send)]
async fn send_once<F>(build_request: &F) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let response = build_request().send().await?;

    let url = response.url().to_string();
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url,
        });
    }

    let text = response.text().await?;

    serde_json::from_str(&text).map_err(|e| {
        let preview: String = text.chars().take(BODY_PREVIEW_LEN).collect();
        log::error!(
            "JSON parse failed.\n  \
             url: {url}\n  \
             status: {status}\n  \
             content-type: {content_type:?}\n  \
             received: {} bytes\n  \
             parse error: {e}\n  \
             body preview: {preview}",
            text.len(),
        );
        SourceError::Json(e)
    })
}

/// Returns `true` if the error is likely transient and worth retrying.
pub(crate) fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_request()
}
