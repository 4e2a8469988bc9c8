use crate::error::{GenerationError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_CHARS: usize = 512;

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("promptpaint/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GenerationError::Configuration(format!("cannot build HTTP client: {}", e)))
}

/// Check the status and decode a JSON body.
///
/// Non-2xx answers are classified with [`GenerationError::from_status`] and
/// carry the service's own `error.message` when the body has one.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = error_message(&body).unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                truncate(&body, MAX_ERROR_CHARS)
            }
        });
        log::error!("❌ {} request failed ({}): {}", provider, status.as_u16(), message);
        return Err(GenerationError::from_status(status.as_u16(), message));
    }

    serde_json::from_str(&body).map_err(|e| GenerationError::Backend {
        status: Some(status.as_u16()),
        message: format!("{} returned an unexpected payload: {}", provider, e),
    })
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())?;
    Some(truncate(message, MAX_ERROR_CHARS))
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
