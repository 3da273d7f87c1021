use thiserror::Error;

use super::response::ResponseInfo;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {}", join_errors(.errors))]
    ApiError {
        status: u16,
        errors: Vec<ResponseInfo>,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable (HTTP {0}), retry later")]
    ServiceUnavailable(u16),

    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimited | ApiError::ServiceUnavailable(_) | ApiError::Timeout(_) => true,
            ApiError::RequestError(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

fn join_errors(errors: &[ResponseInfo]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_lists_every_message() {
        let err = ApiError::ApiError {
            status: 400,
            errors: vec![
                ResponseInfo {
                    code: 1003,
                    message: "Invalid or missing zone id.".to_string(),
                },
                ResponseInfo {
                    code: 6003,
                    message: "Invalid request headers".to_string(),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "API returned error (HTTP 400): 1003: Invalid or missing zone id.; 6003: Invalid request headers"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn throttling_and_outages_are_retryable() {
        assert!(ApiError::RateLimited.is_retryable());
        assert!(ApiError::ServiceUnavailable(503).is_retryable());
        assert!(!ApiError::AuthError("bad token".into()).is_retryable());
    }
}
