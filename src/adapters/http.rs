//! Shared HTTP Handling
//!
//! Every provider client builds its `reqwest::Client` and decodes responses
//! through these helpers so status codes and bodies map onto the same
//! [`ProviderError`] variants everywhere.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::ports::provider::ProviderError;

/// Longest upstream body excerpt kept in an error message
const BODY_EXCERPT_LEN: usize = 200;

/// Build a client with a fixed per-call timeout
pub fn build_client(timeout: Duration) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("market-mood/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::UpstreamUnavailable(format!("Failed to create HTTP client: {}", e)))
}

/// Send a request and decode a JSON body into `T`
pub async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    deadline: Duration,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_transport(e, deadline))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_transport(e, deadline))?;

    if !status.is_success() {
        return Err(status_error(status, &body));
    }

    decode(&body)
}

/// Decode a JSON body, mapping shape mismatches to `UpstreamMalformed`
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(format!("Failed to parse response: {}", e)))
}

fn status_error(status: StatusCode, body: &str) -> ProviderError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::UpstreamUnavailable("Rate limit exceeded (429)".into());
    }

    ProviderError::UpstreamUnavailable(format!("API error {}: {}", status, excerpt(body)))
}

fn excerpt(body: &str) -> &str {
    let body = body.trim();
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Parse an upstream decimal string such as `"50123.45000000"`
pub fn parse_decimal(field: &str, raw: &str) -> Result<f64, ProviderError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ProviderError::malformed(format!("{} is not a number: '{}'", field, raw)))
}

/// Serde helper for numbers that arrive as JSON numbers, decimal strings or null
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde::Deserialize;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("'{}' is not a number", s))),
        Some(other) => Err(D::Error::custom(format!("expected a number, got {}", other))),
    }
}

/// Reject empty caller input before any network I/O
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, ProviderError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::InvalidRequest(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

/// Reject zero limits before any network I/O
pub fn require_positive(field: &str, value: u32) -> Result<u32, ProviderError> {
    if value == 0 {
        return Err(ProviderError::InvalidRequest(format!("{} must be positive", field)));
    }
    Ok(value)
}
