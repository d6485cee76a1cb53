/// Error type for calls against the REST backend
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("permission denied: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
    #[error("invalid base url '{0}' (expected http:// or https://)")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// HTTP 403. The only failure surfaced to the user as a distinct notice.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, ApiError::Forbidden(_))
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Pull a human-readable message out of an error body. The backend answers
/// errors with `{"detail": "..."}`; anything else is passed through, clipped.
pub(crate) fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(detail) = value.get("detail")
    {
        return match detail.as_str() {
            Some(s) => s.to_string(),
            None => detail.to_string(),
        };
    }
    let trimmed = body.trim();
    if trimmed.chars().count() > 200 {
        let clipped: String = trimmed.chars().take(200).collect();
        format!("{}…", clipped)
    } else if trimmed.is_empty() {
        "(empty body)".to_string()
    } else {
        trimmed.to_string()
    }
}
