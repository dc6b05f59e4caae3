use serde_json::Value;
use thiserror::Error;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Message suitable for display: the server-supplied text for HTTP
    /// failures, the transport description otherwise.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Http { message, .. } => message.clone(),
            ApiError::Config(message)
            | ApiError::Network(message)
            | ApiError::Timeout(message)
            | ApiError::Parse(message) => message.clone(),
        }
    }

    /// Builds an HTTP error from a failed response body.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let message = body_message(body)
            .unwrap_or_else(|| format!("Request failed with status code {status}"));
        ApiError::Http { status, message }
    }

    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout("Request timed out. Please try again.".to_string())
        } else if err.is_decode() {
            ApiError::Parse(format!("Failed to decode response: {err}"))
        } else if err.is_builder() {
            ApiError::Config(format!("Failed to build request: {err}"))
        } else {
            ApiError::Network(format!("Unable to reach the server: {err}"))
        }
    }
}

/// Message carried by an error body. JSON bodies contribute only their
/// `message`, string `detail`, or `detail.message`; other bodies are used as
/// text.
fn body_message(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => server_message(&value),
        Err(_) => sanitize_body(body),
    }
}

fn server_message(value: &Value) -> Option<String> {
    let candidate = value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| match value.get("detail") {
            Some(Value::String(detail)) => Some(detail.as_str()),
            Some(detail) => detail.get("message").and_then(Value::as_str),
            None => None,
        })?;
    sanitize_body(candidate)
}

/// Trims and truncates error text; blank bodies yield `None`.
fn sanitize_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(MAX_ERROR_CHARS).collect())
    }
}
