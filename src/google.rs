//! Shared plumbing for the Google Generative Language API.

use crate::error::{parse_retry_after, sanitize_error_message, JobPostError, Result};

pub(crate) const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV_VARS: [&str; 3] = ["API_KEY", "GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Resolves the API key from an explicit value or the environment.
pub(crate) fn resolve_api_key(explicit: Option<String>) -> Result<String> {
    explicit
        .filter(|k| !k.trim().is_empty())
        .or_else(|| {
            API_KEY_ENV_VARS.iter().find_map(|var| {
                std::env::var(var)
                    .ok()
                    .filter(|v| !v.trim().is_empty())
            })
        })
        .ok_or_else(|| {
            JobPostError::Auth(format!(
                "no API key provided and none of {} is set",
                API_KEY_ENV_VARS.join(", ")
            ))
        })
}

/// Maps a non-success HTTP response to an error.
pub(crate) fn parse_error(
    status: u16,
    text: &str,
    headers: &reqwest::header::HeaderMap,
) -> JobPostError {
    let text = sanitize_error_message(text);
    match status {
        404 => {
            return JobPostError::InvalidRequest(
                "Model not found. Verify the model name is correct.".into(),
            )
        }
        429 => {
            let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
            return JobPostError::RateLimited { retry_after };
        }
        401 | 403 => return JobPostError::Auth(text),
        _ => {}
    }
    let lower = text.to_lowercase();
    if lower.contains("safety") || lower.contains("blocked") || lower.contains("prohibited") {
        return JobPostError::ContentBlocked(text);
    }
    if status == 400 && lower.contains("api key not valid") {
        return JobPostError::Auth(text);
    }
    JobPostError::Api {
        status,
        message: text,
    }
}

/// Fetches the model resource to confirm the key and model name.
pub(crate) async fn check_model(client: &reqwest::Client, api_key: &str, model: &str) -> Result<()> {
    let url = format!("{BASE_URL}/models/{model}");

    let response = client
        .get(&url)
        .header("x-goog-api-key", api_key)
        .send()
        .await?;

    match response.status().as_u16() {
        401 | 403 => Err(JobPostError::Auth("Invalid API key".into())),
        404 => Err(JobPostError::InvalidRequest(
            "Model not found. Verify the model name is correct.".into(),
        )),
        s if !(200..300).contains(&s) => Err(JobPostError::Api {
            status: s,
            message: "Health check failed".into(),
        }),
        _ => Ok(()),
    }
}
