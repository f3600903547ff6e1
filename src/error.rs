//! Error types for provider calls.
//!
//! These errors describe what went wrong talking to a remote model. The
//! generation pipeline logs them and collapses them into the flat
//! [`ErrorKind`](crate::pipeline::ErrorKind) taxonomy shown to users.

use std::time::Duration;

/// Errors that can occur while calling a text or image provider.
#[derive(Debug, thiserror::Error)]
pub enum JobPostError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit or quota exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// A stage did not complete within its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., exporting a file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider answered 200 but the body was not usable.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for provider operations.
pub type Result<T> = std::result::Result<T, JobPostError>;

const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Strips anything that looks like an API key and caps the length of an
/// upstream error body so it is safe to log.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let redacted: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            if looks_like_api_key(word) {
                "[REDACTED]".to_string()
            } else {
                word.to_string()
            }
        })
        .collect();
    let joined = redacted.join(" ");

    if joined.chars().count() > MAX_ERROR_MESSAGE_LEN {
        let truncated: String = joined.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
        format!("{truncated}...")
    } else {
        joined
    }
}

fn looks_like_api_key(word: &str) -> bool {
    let trimmed = word.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-');
    // Google API keys are 39 chars starting with "AIza".
    (trimmed.starts_with("AIza") && trimmed.len() >= 35)
        || trimmed.to_ascii_lowercase().starts_with("key=")
}

/// Parses a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = JobPostError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = JobPostError::ContentBlocked("Safety filter triggered".into());
        assert_eq!(err.to_string(), "content blocked: Safety filter triggered");
    }

    #[test]
    fn test_sanitize_redacts_google_key() {
        let msg = "API key AIzaSyA1234567890abcdefghijklmnopqrstu is invalid";
        let clean = sanitize_error_message(msg);
        assert!(!clean.contains("AIzaSy"));
        assert!(clean.contains("[REDACTED]"));
        assert!(clean.ends_with("is invalid"));
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let msg = "x".repeat(2_000);
        let clean = sanitize_error_message(&msg);
        assert_eq!(clean.chars().count(), MAX_ERROR_MESSAGE_LEN + 3);
        assert!(clean.ends_with("..."));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);

        headers.insert(reqwest::header::RETRY_AFTER, "30".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(30));

        headers.insert(reqwest::header::RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }
}
