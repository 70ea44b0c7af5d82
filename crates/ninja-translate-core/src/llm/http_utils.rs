//! HTTP utilities for the translation backend
//!
//! Request/response handling with error classification into
//! [`TranslationError`] reason codes.

use crate::llm::TranslationError;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_BODY_LEN: usize = 500;

/// Creates an HTTP client with an explicit request timeout.
///
/// Without it a stalled backend would hold the user's update forever.
#[must_use]
pub fn create_http_client(timeout_secs: u64) -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

/// Sends an HTTP POST request with JSON body and returns parsed JSON response.
///
/// # Errors
///
/// Returns `TranslationError::Network` on connectivity issues and timeouts,
/// `TranslationError::BadResponse` on non-success status codes,
/// or `TranslationError::ParseError` if the body is not JSON.
pub async fn send_json_request(
    client: &HttpClient,
    url: &str,
    body: &Value,
    auth_header: Option<&str>,
) -> Result<Value, TranslationError> {
    let mut request = client.post(url).json(body);

    if let Some(auth) = auth_header {
        request = request.header("Authorization", auth);
    }

    let response = request
        .send()
        .await
        .map_err(|e| TranslationError::Network(e.without_url().to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(TranslationError::BadResponse(describe_error_body(
            status.as_u16(),
            &error_text,
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| TranslationError::Network(e.without_url().to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| TranslationError::ParseError(e.to_string()))
}

fn describe_error_body(status: u16, error_text: &str) -> String {
    let trimmed = error_text.trim_start();
    // Proxies answer with HTML pages; keep those out of the logs
    let is_html = trimmed.starts_with("<!DOCTYPE")
        || trimmed.starts_with("<html")
        || trimmed.starts_with("<HTML");

    if is_html {
        return format!("status {status} (server returned an HTML error page)");
    }

    if error_text.chars().count() > MAX_ERROR_BODY_LEN {
        let truncated: String = error_text.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("status {status} - {truncated}... (truncated)")
    } else {
        format!("status {status} - {error_text}")
    }
}

/// Extracts text content from a JSON response by navigating a path.
///
/// # Example
/// ```ignore
/// let content = extract_text_content(&response, &["choices", "0", "message", "content"])?;
/// ```
///
/// # Errors
///
/// Returns `TranslationError::ParseError` if the path is invalid or the target is not a string.
pub fn extract_text_content(response: &Value, path: &[&str]) -> Result<String, TranslationError> {
    let mut current = response;

    for segment in path {
        current = if let Ok(index) = segment.parse::<usize>() {
            current.get(index).ok_or_else(|| {
                TranslationError::ParseError(format!("missing index {index}"))
            })?
        } else {
            current.get(*segment).ok_or_else(|| {
                TranslationError::ParseError(format!("missing key {segment}"))
            })?
        };
    }

    current
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| TranslationError::ParseError(format!("expected string, got: {current}")))
}
