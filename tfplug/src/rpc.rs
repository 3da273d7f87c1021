//! Provider RPC messages and dispatch
//!
//! Requests and responses are JSON objects tagged by `method`, one per line.
//! Method names and payload shapes follow the provider-level calls of the
//! Terraform plugin protocol (`GetMetadata`, `GetProviderSchema`,
//! `ValidateProviderConfig`, `ConfigureProvider`, `StopProvider`).

use crate::context::Context;
use crate::error::{Result, TfplugError};
use crate::provider::{ConfigureRequest, Provider, ProviderMetadataRequest, ProviderMetadataResponse};
use crate::types::{Diagnostics, Dynamic, DynamicValue};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Encoded value, either msgpack bytes or inline JSON, like the protocol's
/// DynamicValue message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgpack: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
}

impl WireValue {
    pub fn from_json(value: &DynamicValue) -> Result<Self> {
        let json = serde_json::to_value(&value.value)
            .map_err(|e| TfplugError::EncodingError(format!("json encoding failed: {}", e)))?;
        Ok(Self {
            msgpack: None,
            json: Some(json),
        })
    }

    pub fn from_msgpack(value: &DynamicValue) -> Result<Self> {
        Ok(Self {
            msgpack: Some(value.encode_msgpack()?),
            json: None,
        })
    }

    /// Msgpack wins when both encodings are present. An empty value decodes
    /// to null.
    pub fn decode(&self) -> Result<DynamicValue> {
        if let Some(bytes) = &self.msgpack {
            return DynamicValue::decode_msgpack(bytes);
        }
        match &self.json {
            Some(json) => {
                let value = serde_json::from_value::<Dynamic>(json.clone())?;
                Ok(DynamicValue::new(value))
            }
            None => Ok(DynamicValue::null()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Request {
    GetMetadata,
    GetProviderSchema,
    ValidateProviderConfig {
        config: WireValue,
    },
    ConfigureProvider {
        #[serde(default)]
        terraform_version: String,
        config: WireValue,
    },
    StopProvider,
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Request::GetMetadata => "GetMetadata",
            Request::GetProviderSchema => "GetProviderSchema",
            Request::ValidateProviderConfig { .. } => "ValidateProviderConfig",
            Request::ConfigureProvider { .. } => "ConfigureProvider",
            Request::StopProvider => "StopProvider",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "result")]
pub enum Response {
    GetMetadata(ProviderMetadataResponse),
    GetProviderSchema {
        provider: serde_json::Value,
        diagnostics: Diagnostics,
    },
    ValidateProviderConfig {
        diagnostics: Diagnostics,
    },
    ConfigureProvider {
        diagnostics: Diagnostics,
    },
    StopProvider {
        error: String,
    },
    Error {
        message: String,
    },
}

impl Response {
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Response::GetProviderSchema { diagnostics, .. }
            | Response::ValidateProviderConfig { diagnostics }
            | Response::ConfigureProvider { diagnostics } => Some(diagnostics),
            _ => None,
        }
    }
}

/// Routes requests to a shared provider instance
pub struct ProviderHandler<P: Provider> {
    provider: Arc<RwLock<P>>,
    context: Context,
}

impl<P: Provider> Clone for ProviderHandler<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            context: self.context.clone(),
        }
    }
}

impl<P: Provider + 'static> ProviderHandler<P> {
    pub fn new(provider: P, context: Context) -> Self {
        Self {
            provider: Arc::new(RwLock::new(provider)),
            context,
        }
    }

    /// Root context; cancelled when the provider is stopped
    pub fn context(&self) -> &Context {
        &self.context
    }

    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                tracing::warn!("Rejecting malformed request: {}", e);
                Response::Error {
                    message: format!("malformed request: {}", e),
                }
            }
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        tracing::debug!(method = request.method(), "Handling provider request");

        match request {
            Request::GetMetadata => {
                let provider = self.provider.read().await;
                let metadata = provider
                    .metadata(ProviderMetadataRequest {
                        context: self.context.clone(),
                    })
                    .await;
                Response::GetMetadata(metadata)
            }
            Request::GetProviderSchema => {
                let schema = self.provider.read().await.schema().await;
                let mut diagnostics = Diagnostics::new();
                let provider = serde_json::to_value(&schema).unwrap_or_else(|e| {
                    diagnostics.add_error("Failed to encode provider schema", Some(e.to_string()));
                    serde_json::Value::Null
                });
                Response::GetProviderSchema {
                    provider,
                    diagnostics,
                }
            }
            Request::ValidateProviderConfig { config } => {
                let diagnostics = match config.decode() {
                    Ok(config) => self.provider.read().await.validate_config(&config).await,
                    Err(e) => decode_failure(e),
                };
                Response::ValidateProviderConfig { diagnostics }
            }
            Request::ConfigureProvider {
                terraform_version,
                config,
            } => {
                let diagnostics = match config.decode() {
                    Ok(config) => {
                        let mut provider = self.provider.write().await;
                        provider
                            .configure(ConfigureRequest {
                                context: self.context.clone(),
                                terraform_version,
                                config,
                            })
                            .await
                            .diagnostics
                    }
                    Err(e) => decode_failure(e),
                };
                if diagnostics.has_errors() {
                    tracing::warn!(
                        errors = diagnostics.errors.len(),
                        "Provider configuration failed"
                    );
                }
                Response::ConfigureProvider { diagnostics }
            }
            Request::StopProvider => {
                let diagnostics = self.provider.read().await.stop().await;
                self.context.cancel();
                let error = diagnostics
                    .errors
                    .iter()
                    .map(|d| d.summary.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                Response::StopProvider { error }
            }
        }
    }
}

fn decode_failure(e: TfplugError) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    diagnostics.add_error("Failed to decode configuration", Some(e.to_string()));
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttributePath;

    #[test]
    fn unit_requests_parse_without_params() {
        let request: Request = serde_json::from_str(r#"{"method":"GetProviderSchema"}"#).unwrap();
        assert!(matches!(request, Request::GetProviderSchema));
    }

    #[test]
    fn configure_request_parses_json_config() {
        let request: Request = serde_json::from_str(
            r#"{"method":"ConfigureProvider","params":{"terraform_version":"1.9.0","config":{"json":{"rps":4}}}}"#,
        )
        .unwrap();
        let Request::ConfigureProvider {
            terraform_version,
            config,
        } = request
        else {
            panic!("expected ConfigureProvider");
        };
        assert_eq!(terraform_version, "1.9.0");
        let decoded = config.decode().unwrap();
        assert_eq!(decoded.get_number(&AttributePath::new("rps")).unwrap(), 4.0);
    }

    #[test]
    fn wire_value_prefers_msgpack() {
        let mut value = DynamicValue::object();
        value
            .set_string(&AttributePath::new("email"), "user@example.com")
            .unwrap();

        let mut wire = WireValue::from_msgpack(&value).unwrap();
        wire.json = Some(serde_json::json!({"email": "other@example.com"}));

        assert_eq!(wire.decode().unwrap(), value);
    }

    #[test]
    fn empty_wire_value_is_null() {
        assert!(WireValue::default().decode().unwrap().is_null());
    }

    #[test]
    fn response_is_tagged_by_method() {
        let response = Response::StopProvider {
            error: String::new(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["method"], "StopProvider");
        assert_eq!(json["result"]["error"], "");
    }
}
