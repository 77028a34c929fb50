//! Core error types.

use thiserror::Error;

/// Errors surfaced by a chunked session or its transport.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Transport-level HTTP failure (send, body read, stream read)
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Non-2xx response from the stream endpoint
    #[error("API error {code}: {message}")]
    ApiError {
        code: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The byte stream broke off mid-response
    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Coarse error classification for presentation and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Client,
    Server,
    Network,
    Parsing,
    Validation,
}

impl LlmError {
    /// Build an `ApiError` without details.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status code carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            Self::AuthenticationError(_) => Some(401),
            Self::RateLimitError(_) => Some(429),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AuthenticationError(_) => ErrorCategory::Authentication,
            Self::RateLimitError(_) => ErrorCategory::RateLimit,
            Self::ApiError { code, .. } if *code >= 500 => ErrorCategory::Server,
            Self::ApiError { .. } => ErrorCategory::Client,
            Self::HttpError(_)
            | Self::TimeoutError(_)
            | Self::ConnectionError(_)
            | Self::StreamError(_) => ErrorCategory::Network,
            Self::JsonError(_) => ErrorCategory::Parsing,
            Self::ConfigurationError(_) | Self::InvalidInput(_) => ErrorCategory::Validation,
        }
    }

    /// Whether issuing the same request again could plausibly succeed.
    ///
    /// Sessions never retry on their own; this is a hint for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Server | ErrorCategory::Network
        )
    }

    /// Message suitable for a "generation interrupted" notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::ApiError { message, .. } => message.clone(),
            Self::HttpError(m)
            | Self::AuthenticationError(m)
            | Self::RateLimitError(m)
            | Self::TimeoutError(m)
            | Self::ConnectionError(m)
            | Self::StreamError(m)
            | Self::JsonError(m)
            | Self::ConfigurationError(m)
            | Self::InvalidInput(m) => m.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_category_depends_on_status() {
        assert_eq!(
            LlmError::api_error(503, "down").category(),
            ErrorCategory::Server
        );
        assert_eq!(
            LlmError::api_error(422, "bad").category(),
            ErrorCategory::Client
        );
        assert!(LlmError::api_error(503, "down").is_retryable());
        assert!(!LlmError::api_error(422, "bad").is_retryable());
    }

    #[test]
    fn network_errors_are_retryable() {
        assert!(LlmError::TimeoutError("t".into()).is_retryable());
        assert!(LlmError::StreamError("reset".into()).is_retryable());
        assert!(!LlmError::ConfigurationError("x".into()).is_retryable());
    }

    #[test]
    fn status_code_is_reported_for_http_classes() {
        assert_eq!(LlmError::api_error(418, "teapot").status_code(), Some(418));
        assert_eq!(
            LlmError::AuthenticationError("no".into()).status_code(),
            Some(401)
        );
        assert_eq!(LlmError::StreamError("x".into()).status_code(), None);
    }

    #[test]
    fn malformed_json_is_a_parsing_error_and_not_retryable() {
        let err = LlmError::JsonError("expected value".into());
        assert_eq!(err.category(), ErrorCategory::Parsing);
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), "expected value");
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = LlmError::api_error(500, "boom");
        assert_eq!(err.to_string(), "API error 500: boom");
        assert_eq!(err.user_message(), "boom");
    }
}
