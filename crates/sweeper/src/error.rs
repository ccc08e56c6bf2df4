use reqwest::StatusCode;

/// Failures talking to the GitHub or Cloudflare APIs.
///
/// Only [`ApiError::Status`] is recoverable: the cleanup run logs it and
/// carries on. Everything else aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Build a status error, pulling the useful part out of the body
    pub fn status(status: StatusCode, body: &str) -> Self {
        ApiError::Status {
            status,
            message: describe_body(body),
        }
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, ApiError::Status { .. })
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error bodies come in two shapes: Cloudflare's `{"errors": [{code, message}]}`
/// envelope and GitHub's `{"message": ...}`. Anything else is passed through.
fn describe_body(body: &str) -> String {
    let body = body.trim();
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.to_string();
    };

    if let Some(errors) = value.get("errors").and_then(|e| e.as_array()) {
        let messages: Vec<String> = errors
            .iter()
            .filter_map(|e| {
                let message = e.get("message")?.as_str()?;
                Some(match e.get("code").and_then(|c| c.as_i64()) {
                    Some(code) => format!("{}: {}", code, message),
                    None => message.to_string(),
                })
            })
            .collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }

    if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
        return message.to_string();
    }

    body.to_string()
}
