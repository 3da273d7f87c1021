//! Provider configuration resolution
//!
//! Each argument is taken from the provider block, then its environment
//! variable, then its registry default (see [`crate::consts`]).

use crate::consts::{self, ConfigField};
use crate::error::ConfigError;
use std::time::Duration;
use tfplug::{AttributePath, Config, Dynamic};
use url::Url;

/// How requests authenticate against the API
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiToken(String),
    ApiKey { key: String, email: String },
    UserServiceKey(String),
}

impl Credentials {
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::ApiToken(_) => "api_token",
            Credentials::ApiKey { .. } => "api_key",
            Credentials::UserServiceKey(_) => "api_user_service_key",
        }
    }
}

// Secrets stay out of logs and panic messages
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiToken(_) => f.write_str("ApiToken(***)"),
            Credentials::ApiKey { email, .. } => f
                .debug_struct("ApiKey")
                .field("key", &"***")
                .field("email", email)
                .finish(),
            Credentials::UserServiceKey(_) => f.write_str("UserServiceKey(***)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub credentials: Credentials,
    /// Extra key for origin CA endpoints, kept alongside token or key auth
    pub user_service_key: Option<String>,
    pub api_hostname: String,
    pub api_base_path: String,
    pub rps: u32,
    pub retries: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub api_client_logging: bool,
    pub account_id: Option<String>,
    pub zone_id: Option<String>,
    pub user_agent_operator_suffix: Option<String>,
}

impl ProviderConfig {
    /// Resolves against the process environment
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::from_config_with_env(config, |key| std::env::var(key).ok())
    }

    pub fn from_config_with_env<F>(config: &Config, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |field: &ConfigField, expected: &'static str| -> Result<Option<String>, ConfigError> {
            Ok(field.resolve(explicit(config, field, expected)?, &env))
        };

        let token = value(&consts::API_TOKEN, "string")?;
        let key = value(&consts::API_KEY, "string")?;
        let email = value(&consts::EMAIL, "string")?;
        let user_service_key = value(&consts::API_USER_SERVICE_KEY, "string")?;

        let credentials = match (token, key, email, &user_service_key) {
            (Some(_), Some(_), _, _) => {
                return Err(ConfigError::ConflictingCredentials {
                    first: consts::API_TOKEN_SCHEMA_KEY,
                    second: consts::API_KEY_SCHEMA_KEY,
                })
            }
            (Some(token), None, _, _) => Credentials::ApiToken(token),
            (None, Some(key), Some(email), _) => Credentials::ApiKey { key, email },
            (None, Some(_), None, _) => return Err(ConfigError::MissingEmail),
            (None, None, _, Some(service_key)) => Credentials::UserServiceKey(service_key.clone()),
            (None, None, _, None) => return Err(ConfigError::MissingCredentials),
        };

        let api_hostname = required(&consts::API_HOSTNAME, value(&consts::API_HOSTNAME, "string")?)?;
        let api_base_path =
            required(&consts::API_BASE_PATH, value(&consts::API_BASE_PATH, "string")?)?;
        if !api_base_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: consts::API_BASE_PATH_SCHEMA_KEY,
                value: api_base_path,
                reason: "must start with '/'".to_string(),
            });
        }

        let rps = parse_u32(&consts::RPS, value(&consts::RPS, "number")?)?;
        if rps == 0 {
            return Err(ConfigError::InvalidValue {
                key: consts::RPS_SCHEMA_KEY,
                value: rps.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let retries = parse_u32(&consts::RETRIES, value(&consts::RETRIES, "number")?)?;

        let min_backoff = parse_u32(&consts::MINIMUM_BACKOFF, value(&consts::MINIMUM_BACKOFF, "number")?)?;
        let max_backoff = parse_u32(&consts::MAXIMUM_BACKOFF, value(&consts::MAXIMUM_BACKOFF, "number")?)?;
        if min_backoff > max_backoff {
            return Err(ConfigError::BackoffRange {
                min: min_backoff.into(),
                max: max_backoff.into(),
            });
        }

        let api_client_logging = parse_bool(
            &consts::API_CLIENT_LOGGING,
            value(&consts::API_CLIENT_LOGGING, "bool")?,
        )?;

        let config = Self {
            credentials,
            user_service_key,
            api_hostname,
            api_base_path,
            rps,
            retries,
            min_backoff: Duration::from_secs(min_backoff.into()),
            max_backoff: Duration::from_secs(max_backoff.into()),
            api_client_logging,
            account_id: value(&consts::ACCOUNT_ID, "string")?,
            zone_id: value(&consts::ZONE_ID, "string")?,
            user_agent_operator_suffix: value(&consts::USER_AGENT_OPERATOR_SUFFIX, "string")?,
        };
        config.base_url()?;

        tracing::debug!(
            auth = config.credentials.kind(),
            hostname = %config.api_hostname,
            rps = config.rps,
            retries = config.retries,
            "Resolved provider configuration"
        );

        Ok(config)
    }

    /// API root, e.g. `https://api.cloudflare.com/client/v4`. A hostname that
    /// already carries a scheme is used as given, which lets the provider
    /// talk to proxies and local test servers over plain HTTP.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let host = self.api_hostname.trim_end_matches('/');
        let raw = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}{}", host, self.api_base_path)
        } else {
            format!("https://{}{}", host, self.api_base_path)
        };
        Ok(Url::parse(&raw)?)
    }

    pub fn user_agent(&self) -> String {
        consts::user_agent(
            env!("CARGO_PKG_VERSION"),
            self.user_agent_operator_suffix.as_deref(),
        )
    }
}

/// Reads a provider block value as a string, whatever its Terraform type, so
/// block values and environment values share one parsing path
fn explicit(
    config: &Config,
    field: &ConfigField,
    expected: &'static str,
) -> Result<Option<String>, ConfigError> {
    let Some(value) = config.get_optional(&AttributePath::new(field.schema_key)) else {
        return Ok(None);
    };
    match value {
        // An empty string in the block counts as unset, like an empty env var
        Dynamic::String(s) if s.is_empty() => Ok(None),
        Dynamic::String(s) => Ok(Some(s.clone())),
        Dynamic::Number(n) if n.fract() == 0.0 => Ok(Some(format!("{}", *n as i64))),
        Dynamic::Number(n) => Ok(Some(n.to_string())),
        Dynamic::Bool(b) => Ok(Some(b.to_string())),
        Dynamic::Unknown => Err(ConfigError::Unknown {
            key: field.schema_key,
        }),
        _ => Err(ConfigError::WrongType {
            key: field.schema_key,
            expected,
        }),
    }
}

fn required(field: &ConfigField, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        other => Err(ConfigError::InvalidValue {
            key: field.schema_key,
            value: other.unwrap_or_default(),
            reason: "must not be empty".to_string(),
        }),
    }
}

fn parse_u32(field: &ConfigField, value: Option<String>) -> Result<u32, ConfigError> {
    let raw = required(field, value)?;
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidValue {
            key: field.schema_key,
            value: raw.clone(),
            reason: "expected a whole number".to_string(),
        })
}

fn parse_bool(field: &ConfigField, value: Option<String>) -> Result<bool, ConfigError> {
    let raw = required(field, value)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: field.schema_key,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tfplug::DynamicValue;

    fn block(pairs: &[(&str, Dynamic)]) -> DynamicValue {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        DynamicValue::new(Dynamic::Map(map))
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn token() -> Dynamic {
        Dynamic::String("a".repeat(40))
    }

    #[test]
    fn defaults_fill_unset_tuning_fields() {
        let config =
            ProviderConfig::from_config_with_env(&block(&[("api_token", token())]), env_from(&[]))
                .unwrap();

        assert_eq!(config.credentials, Credentials::ApiToken("a".repeat(40)));
        assert_eq!(config.api_hostname, "api.cloudflare.com");
        assert_eq!(config.api_base_path, "/client/v4");
        assert_eq!(config.rps, 4);
        assert_eq!(config.retries, 4);
        assert_eq!(config.min_backoff, Duration::from_secs(1));
        assert_eq!(config.max_backoff, Duration::from_secs(30));
        assert!(!config.api_client_logging);
        assert_eq!(config.account_id, None);
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://api.cloudflare.com/client/v4"
        );
    }

    #[test]
    fn block_values_win_over_environment() {
        let config = ProviderConfig::from_config_with_env(
            &block(&[
                ("api_token", token()),
                ("rps", Dynamic::Number(10.0)),
                ("api_client_logging", Dynamic::Bool(true)),
            ]),
            env_from(&[("CLOUDFLARE_RPS", "2"), ("CLOUDFLARE_RETRIES", "7")]),
        )
        .unwrap();

        assert_eq!(config.rps, 10);
        assert_eq!(config.retries, 7);
        assert!(config.api_client_logging);
    }

    #[test]
    fn credentials_can_come_from_environment() {
        let config = ProviderConfig::from_config_with_env(
            &DynamicValue::null(),
            env_from(&[
                ("CLOUDFLARE_API_KEY", "key"),
                ("CLOUDFLARE_EMAIL", "user@example.com"),
                ("CLOUDFLARE_ACCOUNT_ID", "acc"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.credentials,
            Credentials::ApiKey {
                key: "key".into(),
                email: "user@example.com".into()
            }
        );
        assert_eq!(config.account_id.as_deref(), Some("acc"));
    }

    #[test]
    fn token_and_key_conflict() {
        let err = ProviderConfig::from_config_with_env(
            &block(&[("api_token", token())]),
            env_from(&[("CLOUDFLARE_API_KEY", "key")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingCredentials { .. }));
    }

    #[test]
    fn api_key_requires_email() {
        let err = ProviderConfig::from_config_with_env(
            &block(&[("api_key", Dynamic::String("key".into()))]),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEmail));
    }

    #[test]
    fn no_credentials_is_an_error() {
        let err = ProviderConfig::from_config_with_env(&DynamicValue::null(), env_from(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }

    #[test]
    fn empty_block_token_is_not_a_credential() {
        let err = ProviderConfig::from_config_with_env(
            &block(&[("api_token", Dynamic::String(String::new()))]),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials), "{:?}", err);
    }

    #[test]
    fn empty_block_token_does_not_conflict_with_env_key() {
        let config = ProviderConfig::from_config_with_env(
            &block(&[("api_token", Dynamic::String(String::new()))]),
            env_from(&[
                ("CLOUDFLARE_API_KEY", "key"),
                ("CLOUDFLARE_EMAIL", "user@example.com"),
            ]),
        )
        .unwrap();
        assert_eq!(
            config.credentials,
            Credentials::ApiKey {
                key: "key".into(),
                email: "user@example.com".into()
            }
        );
    }

    #[test]
    fn empty_block_value_falls_back_to_env_then_default() {
        let config = ProviderConfig::from_config_with_env(
            &block(&[
                ("api_token", token()),
                ("api_hostname", Dynamic::String(String::new())),
                ("api_base_path", Dynamic::String(String::new())),
            ]),
            env_from(&[("CLOUDFLARE_API_HOSTNAME", "env.example.com")]),
        )
        .unwrap();
        assert_eq!(config.api_hostname, "env.example.com");
        assert_eq!(config.api_base_path, "/client/v4");
    }

    #[test]
    fn user_service_key_alone_is_enough() {
        let config = ProviderConfig::from_config_with_env(
            &DynamicValue::null(),
            env_from(&[("CLOUDFLARE_API_USER_SERVICE_KEY", "v1.0-abc")]),
        )
        .unwrap();
        assert_eq!(
            config.credentials,
            Credentials::UserServiceKey("v1.0-abc".into())
        );
        assert_eq!(config.user_service_key.as_deref(), Some("v1.0-abc"));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = ProviderConfig::from_config_with_env(
            &block(&[("api_token", token())]),
            env_from(&[("CLOUDFLARE_RETRIES", "many")]),
        )
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { key: "retries", .. }),
            "{:?}",
            err
        );

        let err = ProviderConfig::from_config_with_env(
            &block(&[("api_token", token()), ("rps", Dynamic::Number(0.0))]),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "rps", .. }));
    }

    #[test]
    fn backoff_bounds_must_be_ordered() {
        let err = ProviderConfig::from_config_with_env(
            &block(&[
                ("api_token", token()),
                ("min_backoff", Dynamic::Number(60.0)),
            ]),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::BackoffRange { min: 60, max: 30 }));
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = ProviderConfig::from_config_with_env(
            &block(&[("api_token", Dynamic::Unknown)]),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Unknown { key: "api_token" }));
    }

    #[test]
    fn hostname_with_scheme_is_used_verbatim() {
        let config = ProviderConfig::from_config_with_env(
            &block(&[
                ("api_token", token()),
                ("api_hostname", Dynamic::String("http://127.0.0.1:8080".into())),
                ("api_base_path", Dynamic::String("/v4".into())),
            ]),
            env_from(&[]),
        )
        .unwrap();
        assert_eq!(config.base_url().unwrap().as_str(), "http://127.0.0.1:8080/v4");
    }

    #[test]
    fn base_path_must_be_absolute() {
        let err = ProviderConfig::from_config_with_env(
            &block(&[
                ("api_token", token()),
                ("api_base_path", Dynamic::String("client/v4".into())),
            ]),
            env_from(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "api_base_path", .. }));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = Credentials::ApiKey {
            key: "super-secret".into(),
            email: "user@example.com".into(),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("user@example.com"));
    }

    #[test]
    fn user_agent_carries_operator_suffix() {
        let config = ProviderConfig::from_config_with_env(
            &block(&[("api_token", token())]),
            env_from(&[("CLOUDFLARE_USER_AGENT_OPERATOR_SUFFIX", "ops-team")]),
        )
        .unwrap();
        assert!(config
            .user_agent()
            .starts_with("terraform-provider-cloudflare/"));
        assert!(config.user_agent().ends_with(" ops-team"));
    }
}
