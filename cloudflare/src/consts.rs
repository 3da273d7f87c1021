//! Provider configuration keys
//!
//! Every provider argument has a schema key (the name in the `provider`
//! block), an environment variable that can stand in for it, and sometimes a
//! default. The schema, configuration resolution and docs all read these
//! constants so the three never drift apart.

pub const EMAIL_SCHEMA_KEY: &str = "email";
pub const EMAIL_ENV_VAR_KEY: &str = "CLOUDFLARE_EMAIL";

pub const API_KEY_SCHEMA_KEY: &str = "api_key";
pub const API_KEY_ENV_VAR_KEY: &str = "CLOUDFLARE_API_KEY";

pub const API_TOKEN_SCHEMA_KEY: &str = "api_token";
pub const API_TOKEN_ENV_VAR_KEY: &str = "CLOUDFLARE_API_TOKEN";

pub const API_USER_SERVICE_KEY_SCHEMA_KEY: &str = "api_user_service_key";
pub const API_USER_SERVICE_KEY_ENV_VAR_KEY: &str = "CLOUDFLARE_API_USER_SERVICE_KEY";

pub const API_HOSTNAME_SCHEMA_KEY: &str = "api_hostname";
pub const API_HOSTNAME_ENV_VAR_KEY: &str = "CLOUDFLARE_API_HOSTNAME";
pub const API_HOSTNAME_DEFAULT: &str = "api.cloudflare.com";

pub const API_BASE_PATH_SCHEMA_KEY: &str = "api_base_path";
pub const API_BASE_PATH_ENV_VAR_KEY: &str = "CLOUDFLARE_API_BASE_PATH";
pub const API_BASE_PATH_DEFAULT: &str = "/client/v4";

pub const RPS_SCHEMA_KEY: &str = "rps";
pub const RPS_ENV_VAR_KEY: &str = "CLOUDFLARE_RPS";
pub const RPS_DEFAULT: &str = "4";

pub const RETRIES_SCHEMA_KEY: &str = "retries";
pub const RETRIES_ENV_VAR_KEY: &str = "CLOUDFLARE_RETRIES";
pub const RETRIES_DEFAULT: &str = "4";

pub const MINIMUM_BACKOFF_SCHEMA_KEY: &str = "min_backoff";
pub const MINIMUM_BACKOFF_ENV_VAR_KEY: &str = "CLOUDFLARE_MIN_BACKOFF";
pub const MINIMUM_BACKOFF_DEFAULT: &str = "1";

pub const MAXIMUM_BACKOFF_SCHEMA_KEY: &str = "max_backoff";
pub const MAXIMUM_BACKOFF_ENV_VAR_KEY: &str = "CLOUDFLARE_MAX_BACKOFF";
pub const MAXIMUM_BACKOFF_DEFAULT: &str = "30";

pub const API_CLIENT_LOGGING_SCHEMA_KEY: &str = "api_client_logging";
pub const API_CLIENT_LOGGING_ENV_VAR_KEY: &str = "CLOUDFLARE_API_CLIENT_LOGGING";
pub const API_CLIENT_LOGGING_DEFAULT: &str = "false";

pub const ACCOUNT_ID_SCHEMA_KEY: &str = "account_id";
pub const ACCOUNT_ID_ENV_VAR_KEY: &str = "CLOUDFLARE_ACCOUNT_ID";

pub const ZONE_ID_SCHEMA_KEY: &str = "zone_id";
pub const ZONE_ID_ENV_VAR_KEY: &str = "CLOUDFLARE_ZONE_ID";

pub const USER_AGENT_OPERATOR_SUFFIX_SCHEMA_KEY: &str = "user_agent_operator_suffix";
pub const USER_AGENT_OPERATOR_SUFFIX_ENV_VAR_KEY: &str = "CLOUDFLARE_USER_AGENT_OPERATOR_SUFFIX";

/// Filled in order with the provider version, the plugin framework name and
/// the plugin framework version
pub const USER_AGENT_DEFAULT: &str = "terraform-provider-cloudflare/%s terraform-plugin-%s/%s";

/// One provider argument and where its value can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigField {
    pub name: &'static str,
    pub schema_key: &'static str,
    pub env_var_key: &'static str,
    pub default_value: Option<&'static str>,
}

impl ConfigField {
    const fn new(
        name: &'static str,
        schema_key: &'static str,
        env_var_key: &'static str,
        default_value: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            schema_key,
            env_var_key,
            default_value,
        }
    }

    pub fn lookup(schema_key: &str) -> Option<&'static ConfigField> {
        CONFIG_FIELDS.iter().find(|f| f.schema_key == schema_key)
    }

    /// Picks the value for this field: the explicit provider block value,
    /// then a non-empty environment variable, then the default.
    pub fn resolve<F>(&self, explicit: Option<String>, env: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        explicit
            .or_else(|| env(self.env_var_key).filter(|v| !v.is_empty()))
            .or_else(|| self.default_value.map(str::to_string))
    }
}

pub const EMAIL: ConfigField = ConfigField::new("Email", EMAIL_SCHEMA_KEY, EMAIL_ENV_VAR_KEY, None);
pub const API_KEY: ConfigField =
    ConfigField::new("ApiKey", API_KEY_SCHEMA_KEY, API_KEY_ENV_VAR_KEY, None);
pub const API_TOKEN: ConfigField =
    ConfigField::new("ApiToken", API_TOKEN_SCHEMA_KEY, API_TOKEN_ENV_VAR_KEY, None);
pub const API_USER_SERVICE_KEY: ConfigField = ConfigField::new(
    "ApiUserServiceKey",
    API_USER_SERVICE_KEY_SCHEMA_KEY,
    API_USER_SERVICE_KEY_ENV_VAR_KEY,
    None,
);
pub const API_HOSTNAME: ConfigField = ConfigField::new(
    "ApiHostname",
    API_HOSTNAME_SCHEMA_KEY,
    API_HOSTNAME_ENV_VAR_KEY,
    Some(API_HOSTNAME_DEFAULT),
);
pub const API_BASE_PATH: ConfigField = ConfigField::new(
    "ApiBasePath",
    API_BASE_PATH_SCHEMA_KEY,
    API_BASE_PATH_ENV_VAR_KEY,
    Some(API_BASE_PATH_DEFAULT),
);
pub const RPS: ConfigField =
    ConfigField::new("Rps", RPS_SCHEMA_KEY, RPS_ENV_VAR_KEY, Some(RPS_DEFAULT));
pub const RETRIES: ConfigField = ConfigField::new(
    "Retries",
    RETRIES_SCHEMA_KEY,
    RETRIES_ENV_VAR_KEY,
    Some(RETRIES_DEFAULT),
);
pub const MINIMUM_BACKOFF: ConfigField = ConfigField::new(
    "MinimumBackoff",
    MINIMUM_BACKOFF_SCHEMA_KEY,
    MINIMUM_BACKOFF_ENV_VAR_KEY,
    Some(MINIMUM_BACKOFF_DEFAULT),
);
pub const MAXIMUM_BACKOFF: ConfigField = ConfigField::new(
    "MaximumBackoff",
    MAXIMUM_BACKOFF_SCHEMA_KEY,
    MAXIMUM_BACKOFF_ENV_VAR_KEY,
    Some(MAXIMUM_BACKOFF_DEFAULT),
);
pub const API_CLIENT_LOGGING: ConfigField = ConfigField::new(
    "ApiClientLogging",
    API_CLIENT_LOGGING_SCHEMA_KEY,
    API_CLIENT_LOGGING_ENV_VAR_KEY,
    Some(API_CLIENT_LOGGING_DEFAULT),
);
pub const ACCOUNT_ID: ConfigField =
    ConfigField::new("AccountId", ACCOUNT_ID_SCHEMA_KEY, ACCOUNT_ID_ENV_VAR_KEY, None);
pub const ZONE_ID: ConfigField =
    ConfigField::new("ZoneId", ZONE_ID_SCHEMA_KEY, ZONE_ID_ENV_VAR_KEY, None);
pub const USER_AGENT_OPERATOR_SUFFIX: ConfigField = ConfigField::new(
    "UserAgentOperatorSuffix",
    USER_AGENT_OPERATOR_SUFFIX_SCHEMA_KEY,
    USER_AGENT_OPERATOR_SUFFIX_ENV_VAR_KEY,
    None,
);

pub static CONFIG_FIELDS: [ConfigField; 14] = [
    EMAIL,
    API_KEY,
    API_TOKEN,
    API_USER_SERVICE_KEY,
    API_HOSTNAME,
    API_BASE_PATH,
    RPS,
    RETRIES,
    MINIMUM_BACKOFF,
    MAXIMUM_BACKOFF,
    API_CLIENT_LOGGING,
    ACCOUNT_ID,
    ZONE_ID,
    USER_AGENT_OPERATOR_SUFFIX,
];

/// Renders `USER_AGENT_DEFAULT` and appends the operator suffix, if any
pub fn user_agent(provider_version: &str, operator_suffix: Option<&str>) -> String {
    let mut agent = [
        provider_version,
        tfplug::FRAMEWORK_NAME,
        tfplug::FRAMEWORK_VERSION,
    ]
    .iter()
    .fold(USER_AGENT_DEFAULT.to_string(), |agent, arg| {
        agent.replacen("%s", arg, 1)
    });

    if let Some(suffix) = operator_suffix.map(str::trim).filter(|s| !s.is_empty()) {
        agent.push(' ');
        agent.push_str(suffix);
    }
    agent
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn schema_keys_are_unique() {
        let keys: HashSet<_> = CONFIG_FIELDS.iter().map(|f| f.schema_key).collect();
        assert_eq!(keys.len(), CONFIG_FIELDS.len());
    }

    #[test]
    fn env_var_keys_are_unique() {
        let keys: HashSet<_> = CONFIG_FIELDS.iter().map(|f| f.env_var_key).collect();
        assert_eq!(keys.len(), CONFIG_FIELDS.len());
    }

    #[test]
    fn env_var_keys_share_the_provider_prefix() {
        assert!(CONFIG_FIELDS
            .iter()
            .all(|f| f.env_var_key.starts_with("CLOUDFLARE_")));
    }

    #[test]
    fn defaults_are_only_on_optional_tuning_fields() {
        let with_defaults: Vec<_> = CONFIG_FIELDS
            .iter()
            .filter(|f| f.default_value.is_some())
            .map(|f| f.schema_key)
            .collect();
        assert_eq!(
            with_defaults,
            vec![
                "api_hostname",
                "api_base_path",
                "rps",
                "retries",
                "min_backoff",
                "max_backoff",
                "api_client_logging"
            ]
        );
    }

    #[test]
    fn lookup_finds_fields_by_schema_key() {
        assert_eq!(ConfigField::lookup("rps"), Some(&RPS));
        assert_eq!(ConfigField::lookup("CLOUDFLARE_RPS"), None);
    }

    #[test]
    fn resolve_prefers_explicit_then_env_then_default() {
        let env = |key: &str| (key == RPS_ENV_VAR_KEY).then(|| "10".to_string());

        assert_eq!(RPS.resolve(Some("2".into()), env), Some("2".into()));
        assert_eq!(RPS.resolve(None, env), Some("10".into()));
        assert_eq!(RETRIES.resolve(None, env), Some("4".into()));
        assert_eq!(EMAIL.resolve(None, env), None);
    }

    #[test]
    fn resolve_ignores_empty_env_values() {
        let env = |_: &str| Some(String::new());
        assert_eq!(API_HOSTNAME.resolve(None, env), Some("api.cloudflare.com".into()));
        assert_eq!(API_TOKEN.resolve(None, env), None);
    }

    #[test]
    fn user_agent_fills_template() {
        let agent = user_agent("5.0.0", None);
        assert_eq!(
            agent,
            format!(
                "terraform-provider-cloudflare/5.0.0 terraform-plugin-tfplug/{}",
                tfplug::FRAMEWORK_VERSION
            )
        );
        assert!(!agent.contains("%s"));
    }

    #[test]
    fn user_agent_appends_operator_suffix() {
        let agent = user_agent("5.0.0", Some("acme-ops/1.2"));
        assert!(agent.ends_with(" acme-ops/1.2"));
        assert_eq!(user_agent("5.0.0", Some("  ")), user_agent("5.0.0", None));
    }
}
