use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Session expired - please log in again")]
    SessionExpired,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error envelope the API uses for every non-2xx response
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Pull the human-readable message out of a response body.
    /// Falls back to the (truncated) raw body when it is not the usual envelope.
    pub fn server_message(body: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self::truncate_body(&parsed.error),
            Err(_) => Self::truncate_body(body.trim()),
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = Self::server_message(body);
        match status.as_u16() {
            400 | 422 => ApiError::BadRequest(message),
            401 => ApiError::Unauthorized(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(message),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, message)),
        }
    }

    /// Drain a failed response into the matching error variant
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Self::from_status(status, &body)
    }

    /// Whether this error means the caller must authenticate again
    pub fn is_session_error(&self) -> bool {
        matches!(self, ApiError::SessionExpired | ApiError::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_unwraps_error_envelope() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, r#"{"error":"Customer not found"}"#);
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "Customer not found"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_from_status_mapping() {
        let map = |status| ApiError::from_status(status, "");
        assert!(matches!(map(StatusCode::BAD_REQUEST), ApiError::BadRequest(_)));
        assert!(matches!(map(StatusCode::UNAUTHORIZED), ApiError::Unauthorized(_)));
        assert!(matches!(map(StatusCode::FORBIDDEN), ApiError::AccessDenied(_)));
        assert!(matches!(map(StatusCode::TOO_MANY_REQUESTS), ApiError::RateLimited));
        assert!(matches!(map(StatusCode::BAD_GATEWAY), ApiError::ServerError(_)));
        assert!(matches!(map(StatusCode::IM_A_TEAPOT), ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_plain_text_body_is_kept() {
        assert_eq!(ApiError::server_message("  gateway timeout \n"), "gateway timeout");
    }

    #[test]
    fn test_long_body_is_truncated() {
        let body = "x".repeat(2000);
        let msg = ApiError::server_message(&body);
        assert!(msg.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(msg.ends_with("(truncated, 2000 total bytes)"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        // 'ş' is two bytes, so byte 500 falls inside a character
        let body = format!("a{}", "ş".repeat(400));
        let msg = ApiError::server_message(&body);
        assert!(msg.contains("truncated"));
    }

    #[test]
    fn test_session_errors() {
        assert!(ApiError::SessionExpired.is_session_error());
        assert!(ApiError::Unauthorized(String::new()).is_session_error());
        assert!(!ApiError::Auth(String::new()).is_session_error());
    }
}
