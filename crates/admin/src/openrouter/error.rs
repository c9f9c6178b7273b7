//! Error types for the OpenRouter API client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when interacting with the OpenRouter API.
#[derive(Debug, Error)]
pub enum OpenRouterError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model is rate limited. The fallback loop tries the next candidate.
    #[error("model {model} rate limited: {message}")]
    RateLimited {
        /// Model that was rate limited.
        model: String,
        /// Error message from the API.
        message: String,
    },

    /// The model id is unknown or currently unavailable. The fallback loop
    /// tries the next candidate.
    #[error("model {model} not found: {message}")]
    ModelNotFound {
        /// Model that was not found.
        model: String,
        /// Error message from the API.
        message: String,
    },

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The API returned an error that does not map to a recoverable kind.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}

impl OpenRouterError {
    /// Whether the fallback loop should advance to the next candidate model.
    ///
    /// Only rate limits and missing models are worth retrying elsewhere;
    /// every other failure aborts the scan so broken auth or a malformed
    /// request is not replayed against the whole candidate list.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::ModelNotFound { .. })
    }

    /// Classify an upstream failure into a typed error.
    ///
    /// The HTTP status wins when it is unambiguous (404, 429, 401). Error
    /// envelopes delivered with a 200 status fall back to message text,
    /// checking "not found" before "rate" because some providers mention
    /// rate plans in their not-found messages.
    pub(crate) fn classify(status: StatusCode, model: &str, message: String) -> Self {
        if status == StatusCode::NOT_FOUND {
            return Self::ModelNotFound {
                model: model.to_string(),
                message,
            };
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Self::RateLimited {
                model: model.to_string(),
                message,
            };
        }
        if status == StatusCode::UNAUTHORIZED {
            return Self::Unauthorized(message);
        }

        let lower = message.to_lowercase();
        if lower.contains("not found") {
            return Self::ModelNotFound {
                model: model.to_string(),
                message,
            };
        }
        if lower.contains("rate") {
            return Self::RateLimited {
                model: model.to_string(),
                message,
            };
        }

        Self::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// API error envelope returned by OpenRouter (and OpenAI-compatible
/// providers behind it).
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Error message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_404() {
        let err = OpenRouterError::classify(
            StatusCode::NOT_FOUND,
            "openai/gpt-oss-20b",
            "No endpoints found".to_string(),
        );
        assert!(matches!(err, OpenRouterError::ModelNotFound { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_classify_status_429() {
        let err = OpenRouterError::classify(
            StatusCode::TOO_MANY_REQUESTS,
            "openai/gpt-oss-20b",
            "slow down".to_string(),
        );
        assert!(matches!(err, OpenRouterError::RateLimited { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_classify_status_401() {
        let err = OpenRouterError::classify(
            StatusCode::UNAUTHORIZED,
            "openai/gpt-oss-20b",
            "bad key".to_string(),
        );
        assert!(matches!(err, OpenRouterError::Unauthorized(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_classify_message_rate_limit() {
        // Error envelope delivered with a 200 status
        let err = OpenRouterError::classify(
            StatusCode::OK,
            "openai/gpt-oss-20b",
            "Rate limit exceeded: free-models-per-day".to_string(),
        );
        assert!(matches!(err, OpenRouterError::RateLimited { .. }));
    }

    #[test]
    fn test_classify_message_not_found() {
        let err = OpenRouterError::classify(
            StatusCode::OK,
            "openai/gpt-oss-20b",
            "Model not found".to_string(),
        );
        assert!(matches!(err, OpenRouterError::ModelNotFound { .. }));
    }

    #[test]
    fn test_classify_not_found_wins_over_rate() {
        // "not found" is checked first even when "rate" also appears
        let err = OpenRouterError::classify(
            StatusCode::OK,
            "openai/gpt-oss-20b",
            "model not found on your rate plan".to_string(),
        );
        assert!(matches!(err, OpenRouterError::ModelNotFound { .. }));
    }

    #[test]
    fn test_classify_other_is_api_error() {
        let err = OpenRouterError::classify(
            StatusCode::INTERNAL_SERVER_ERROR,
            "openai/gpt-oss-20b",
            "boom".to_string(),
        );
        assert!(matches!(err, OpenRouterError::Api { status: 500, .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = OpenRouterError::RateLimited {
            model: "openai/gpt-oss-20b".to_string(),
            message: "slow down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "model openai/gpt-oss-20b rate limited: slow down"
        );

        let err = OpenRouterError::Api {
            status: 500,
            message: "upstream exploded".to_string(),
        };
        assert_eq!(err.to_string(), "API error (status 500): upstream exploded");
    }

    #[test]
    fn test_api_error_deserialization() {
        let json = r#"{
            "error": {
                "message": "Rate limit exceeded: free-models-per-day",
                "code": 429
            }
        }"#;

        let response: ApiErrorResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            response.error.message,
            "Rate limit exceeded: free-models-per-day"
        );
    }
}
