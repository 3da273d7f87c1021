use crate::context::Context;
use crate::schema::Schema;
use crate::types::{Config, Diagnostics};
use async_trait::async_trait;

/// Identifies the provider to Terraform
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ProviderMetadataResponse {
    /// Prefix of every resource and data source type name, e.g. `cloudflare`
    pub type_name: String,
    pub version: String,
}

#[derive(Clone)]
pub struct ProviderMetadataRequest {
    pub context: Context,
}

#[derive(Clone)]
pub struct ConfigureRequest {
    pub context: Context,
    /// Version of the Terraform CLI driving the provider, when known
    pub terraform_version: String,
    pub config: Config,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigureResponse {
    pub diagnostics: Diagnostics,
}

impl std::fmt::Debug for ProviderMetadataRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderMetadataRequest").finish_non_exhaustive()
    }
}

/// A Terraform provider. The server owns one instance for the lifetime of the
/// plugin process and serialises calls to `configure`.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn metadata(&self, request: ProviderMetadataRequest) -> ProviderMetadataResponse;

    /// Schema of the `provider` configuration block
    async fn schema(&self) -> Schema;

    /// Validates configuration before it is applied. The default
    /// implementation checks the config against `schema()`.
    async fn validate_config(&self, config: &Config) -> Diagnostics {
        self.schema().await.validate(config)
    }

    async fn configure(&mut self, request: ConfigureRequest) -> ConfigureResponse;

    /// Called when Terraform asks the plugin to stop
    async fn stop(&self) -> Diagnostics {
        Diagnostics::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeBuilder, SchemaBuilder};
    use crate::types::{AttributePath, DynamicValue};

    struct Minimal;

    #[async_trait]
    impl Provider for Minimal {
        async fn metadata(&self, _request: ProviderMetadataRequest) -> ProviderMetadataResponse {
            ProviderMetadataResponse {
                type_name: "minimal".to_string(),
                version: "0.0.0".to_string(),
            }
        }

        async fn schema(&self) -> Schema {
            SchemaBuilder::new()
                .attribute(AttributeBuilder::string("name").required().build())
                .build()
        }

        async fn configure(&mut self, _request: ConfigureRequest) -> ConfigureResponse {
            ConfigureResponse::default()
        }
    }

    #[test]
    fn default_validation_uses_schema() {
        let provider = Minimal;

        let diags = tokio_test::block_on(provider.validate_config(&DynamicValue::object()));
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute, Some(AttributePath::new("name")));

        let mut config = DynamicValue::object();
        config
            .set_string(&AttributePath::new("name"), "ok")
            .unwrap();
        assert!(tokio_test::block_on(provider.validate_config(&config)).is_empty());
    }

    #[test]
    fn default_stop_reports_nothing() {
        assert!(tokio_test::block_on(Minimal.stop()).is_empty());
    }
}
