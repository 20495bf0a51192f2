use reqwest::StatusCode;
use serde::Deserialize;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("session expired")]
    SessionExpired,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify a non-success HTTP response into an error variant.
    ///
    /// Backends answer errors as `{"message": "..."}` or `{"error": "...",
    /// "message": "..."}`; fall back to the raw body, then the status line.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let message = extract_message(body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::BAD_REQUEST => Self::BadRequest(message),
            _ => Self::Server(message),
        }
    }

    /// Short stable tag for notices and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::SessionExpired => "session_expired",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Server(_) => "server",
            ApiError::Network(_) => "network",
            ApiError::Decode(_) => "decode",
            ApiError::Configuration(_) => "configuration",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

fn extract_message(body: &[u8]) -> Option<String> {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
            return Some(message);
        }
        if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
            return Some(error);
        }
    }

    let text = String::from_utf8_lossy(body);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_status_codes() {
        let body = br#"{"message": "nope"}"#;

        assert!(matches!(
            ApiError::from_response(StatusCode::BAD_REQUEST, body),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::UNAUTHORIZED, body),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::FORBIDDEN, body),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::NOT_FOUND, body),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::CONFLICT, body),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, body),
            ApiError::Server(_)
        ));
        assert!(matches!(
            ApiError::from_response(StatusCode::BAD_GATEWAY, body),
            ApiError::Server(_)
        ));
    }

    #[test]
    fn test_prefers_message_field() {
        let err = ApiError::from_response(StatusCode::CONFLICT, br#"{"message": "email already in use"}"#);
        assert_eq!(err.to_string(), "conflict: email already in use");
    }

    #[test]
    fn test_falls_back_to_error_field_then_status() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, br#"{"error": "not_found"}"#);
        assert_eq!(err.to_string(), "not found: not_found");

        let err = ApiError::from_response(StatusCode::NOT_FOUND, b"");
        assert_eq!(err.to_string(), "not found: Not Found");
    }
}
