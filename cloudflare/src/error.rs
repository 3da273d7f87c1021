use thiserror::Error;

/// Problems turning the provider block and environment into a usable
/// configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "credentials are required: set api_token, api_key and email, or api_user_service_key \
         (or the CLOUDFLARE_API_TOKEN, CLOUDFLARE_API_KEY and CLOUDFLARE_EMAIL, or \
         CLOUDFLARE_API_USER_SERVICE_KEY environment variables)"
    )]
    MissingCredentials,

    #[error("{first} conflicts with {second}; only one authentication method may be used")]
    ConflictingCredentials {
        first: &'static str,
        second: &'static str,
    },

    #[error("email is required when using api_key (set email or CLOUDFLARE_EMAIL)")]
    MissingEmail,

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key} must be a {expected}")]
    WrongType {
        key: &'static str,
        expected: &'static str,
    },

    #[error("{key} is not known yet; provider configuration must be known at plan time")]
    Unknown { key: &'static str },

    #[error("min_backoff ({min}) must not exceed max_backoff ({max})")]
    BackoffRange { min: u64, max: u64 },

    #[error("invalid API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_value_message_quotes_the_value() {
        let err = ConfigError::InvalidValue {
            key: "rps",
            value: "fast".to_string(),
            reason: "expected a whole number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid value \"fast\" for rps: expected a whole number"
        );
    }
}
