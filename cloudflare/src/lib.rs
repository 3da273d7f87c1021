pub mod api;
pub mod config;
pub mod consts;
pub mod error;
pub mod provider_data;
pub mod utils;

use async_trait::async_trait;
use tfplug::validator::{NumberRangeValidator, StringLengthValidator, StringPatternValidator};
use tfplug::{
    AttributeBuilder, AttributePath, Config, ConfigureRequest, ConfigureResponse, Diagnostic,
    Diagnostics, Provider, ProviderMetadataRequest, ProviderMetadataResponse, Schema,
    SchemaBuilder,
};

pub use crate::config::{Credentials, ProviderConfig};
pub use crate::error::ConfigError;

use crate::consts::ConfigField;
use crate::provider_data::CloudflareProviderData;

pub const PROVIDER_TYPE_NAME: &str = "cloudflare";

pub struct CloudflareProvider {
    data: Option<CloudflareProviderData>,
}

impl Default for CloudflareProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudflareProvider {
    pub fn new() -> Self {
        Self { data: None }
    }

    /// Client and settings, present once `configure` has succeeded
    pub fn provider_data(&self) -> Option<&CloudflareProviderData> {
        self.data.as_ref()
    }
}

fn env_hint(field: &ConfigField) -> String {
    format!(
        "Alternatively, can be configured using the `{}` environment variable.",
        field.env_var_key
    )
}

fn credential_description(what: &str, field: &ConfigField) -> String {
    format!(
        "{} {} Must provide only one of `api_key`, `api_token`, `api_user_service_key`.",
        what,
        env_hint(field)
    )
}

fn with_pattern(attribute: AttributeBuilder, pattern: &str, description: &str) -> AttributeBuilder {
    match StringPatternValidator::new(pattern, description) {
        Ok(validator) => attribute.validator(validator),
        Err(e) => {
            tracing::error!("Invalid validation pattern {}: {}", pattern, e);
            attribute
        }
    }
}

/// Schema of the `provider "cloudflare"` block
pub fn provider_schema() -> Schema {
    use crate::consts::*;

    SchemaBuilder::new()
        .attribute(
            AttributeBuilder::string(EMAIL_SCHEMA_KEY)
                .optional()
                .description(&format!(
                    "A registered Cloudflare email address. {} Required when using `api_key`. Conflicts with `api_token`.",
                    env_hint(&EMAIL)
                ))
                .build(),
        )
        .attribute(
            with_pattern(
                AttributeBuilder::string(API_KEY_SCHEMA_KEY).optional().sensitive(),
                "[0-9a-f]{37}",
                "API key must be 37 hexadecimal characters",
            )
            .description(&credential_description(
                "The API key for operations.",
                &API_KEY,
            ))
            .build(),
        )
        .attribute(
            with_pattern(
                AttributeBuilder::string(API_TOKEN_SCHEMA_KEY)
                    .optional()
                    .sensitive(),
                "[A-Za-z0-9\\-_]{40}",
                "API tokens must be 40 characters long and only contain characters a-z, A-Z, 0-9, hyphens and underscores",
            )
            .description(&credential_description(
                "The API Token for operations.",
                &API_TOKEN,
            ))
            .build(),
        )
        .attribute(
            AttributeBuilder::string(API_USER_SERVICE_KEY_SCHEMA_KEY)
                .optional()
                .sensitive()
                .description(&credential_description(
                    "A special Cloudflare API key good for a restricted set of endpoints.",
                    &API_USER_SERVICE_KEY,
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::number(RPS_SCHEMA_KEY)
                .optional()
                .validator(NumberRangeValidator::at_least(1.0))
                .description(&format!(
                    "RPS limit to apply when making calls to the API. {} Defaults to `{}`.",
                    env_hint(&RPS),
                    RPS_DEFAULT
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::number(RETRIES_SCHEMA_KEY)
                .optional()
                .validator(NumberRangeValidator::at_least(0.0))
                .description(&format!(
                    "Maximum number of retries to perform when an API request fails. {} Defaults to `{}`.",
                    env_hint(&RETRIES),
                    RETRIES_DEFAULT
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::number(MINIMUM_BACKOFF_SCHEMA_KEY)
                .optional()
                .validator(NumberRangeValidator::at_least(0.0))
                .description(&format!(
                    "Minimum backoff period in seconds after failed API calls. {} Defaults to `{}`.",
                    env_hint(&MINIMUM_BACKOFF),
                    MINIMUM_BACKOFF_DEFAULT
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::number(MAXIMUM_BACKOFF_SCHEMA_KEY)
                .optional()
                .validator(NumberRangeValidator::at_least(0.0))
                .description(&format!(
                    "Maximum backoff period in seconds after failed API calls. {} Defaults to `{}`.",
                    env_hint(&MAXIMUM_BACKOFF),
                    MAXIMUM_BACKOFF_DEFAULT
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::bool(API_CLIENT_LOGGING_SCHEMA_KEY)
                .optional()
                .description(&format!(
                    "Whether to print logs from the API client (using the default log library logger). {} Defaults to `{}`.",
                    env_hint(&API_CLIENT_LOGGING),
                    API_CLIENT_LOGGING_DEFAULT
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::string(API_HOSTNAME_SCHEMA_KEY)
                .optional()
                .description(&format!(
                    "Configure the hostname used by the API client. {} Defaults to `{}`.",
                    env_hint(&API_HOSTNAME),
                    API_HOSTNAME_DEFAULT
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::string(API_BASE_PATH_SCHEMA_KEY)
                .optional()
                .description(&format!(
                    "Configure the base path used by the API client. {} Defaults to `{}`.",
                    env_hint(&API_BASE_PATH),
                    API_BASE_PATH_DEFAULT
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::string(ACCOUNT_ID_SCHEMA_KEY)
                .optional()
                .deprecated()
                .description(&format!(
                    "Configure API client to always use a specific account. {} Use the resource level `account_id` instead.",
                    env_hint(&ACCOUNT_ID)
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::string(ZONE_ID_SCHEMA_KEY)
                .optional()
                .deprecated()
                .description(&format!(
                    "Configure API client to always use a specific zone. {} Use the resource level `zone_id` instead.",
                    env_hint(&ZONE_ID)
                ))
                .build(),
        )
        .attribute(
            AttributeBuilder::string(USER_AGENT_OPERATOR_SUFFIX_SCHEMA_KEY)
                .optional()
                .validator(StringLengthValidator {
                    min: Some(1),
                    max: None,
                })
                .description(&format!(
                    "A value to append to the HTTP User Agent for all API calls. This value is not something most users need to modify however, if you are using a non-standard provider or operator configuration, this is recommended to assist in uniquely identifying your traffic. **Setting this value will remove the Terraform version from the HTTP User Agent string and may have unintended consequences**. {}",
                    env_hint(&USER_AGENT_OPERATOR_SUFFIX)
                ))
                .build(),
        )
        .build()
}

#[async_trait]
impl Provider for CloudflareProvider {
    async fn metadata(&self, _request: ProviderMetadataRequest) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: PROVIDER_TYPE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    async fn schema(&self) -> Schema {
        provider_schema()
    }

    async fn validate_config(&self, config: &Config) -> Diagnostics {
        let mut diags = provider_schema().validate(config);

        let is_set = |key: &str| {
            config
                .get_optional(&AttributePath::new(key))
                .is_some_and(|v| v.as_string().map_or(true, |s| !s.is_empty()))
        };

        if is_set(consts::API_TOKEN_SCHEMA_KEY) {
            for conflicting in [consts::API_KEY_SCHEMA_KEY, consts::EMAIL_SCHEMA_KEY] {
                if is_set(conflicting) {
                    diags.add(
                        Diagnostic::error(
                            "Conflicting configuration arguments",
                            format!(
                                "\"{}\": conflicts with {}",
                                consts::API_TOKEN_SCHEMA_KEY,
                                conflicting
                            ),
                        )
                        .with_attribute(AttributePath::new(conflicting)),
                    );
                }
            }
        }

        let backoff = |key: &str| config.get_number(&AttributePath::new(key)).ok();
        if let (Some(min), Some(max)) = (
            backoff(consts::MINIMUM_BACKOFF_SCHEMA_KEY),
            backoff(consts::MAXIMUM_BACKOFF_SCHEMA_KEY),
        ) {
            if min > max {
                diags.add(
                    Diagnostic::error(
                        "Invalid backoff range",
                        format!("min_backoff ({}) must not exceed max_backoff ({})", min, max),
                    )
                    .with_attribute(AttributePath::new(consts::MINIMUM_BACKOFF_SCHEMA_KEY)),
                );
            }
        }

        diags
    }

    async fn configure(&mut self, request: ConfigureRequest) -> ConfigureResponse {
        let mut diags = Diagnostics::new();

        let config = match ProviderConfig::from_config(&request.config) {
            Ok(config) => config,
            Err(e) => {
                diags.add_error("Invalid provider configuration", Some(e.to_string()));
                return ConfigureResponse { diagnostics: diags };
            }
        };

        if config.account_id.is_some() {
            diags.add_warning(
                "Argument is deprecated",
                Some("account_id on the provider is deprecated; set it on each resource instead"),
            );
        }

        match api::Client::new(&config) {
            Ok(client) => {
                tracing::info!(
                    auth = config.credentials.kind(),
                    base_url = client.base_url(),
                    terraform_version = %request.terraform_version,
                    "Configured Cloudflare provider"
                );
                self.data = Some(CloudflareProviderData::new(client, config));
            }
            Err(e) => {
                diags.add_error(format!("Failed to create API client: {}", e), None::<String>);
            }
        }

        ConfigureResponse { diagnostics: diags }
    }
}
