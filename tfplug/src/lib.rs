//! tfplug - Terraform Plugin Framework for Rust
//!
//! A framework for building Terraform providers in Rust: the value and type
//! system, provider schemas, and the plugin server that Terraform launches.

// Core modules
pub mod attribute_type;
pub mod context;
pub mod error;
pub mod schema;
pub mod types;
pub mod value;

// Provider API modules
pub mod provider;
pub mod validator;

// Framework implementation modules
pub mod rpc;
pub mod server;

// Re-exports for convenience
pub use attribute_type::AttributeType;
pub use context::Context;
pub use error::{Result, TfplugError};
pub use provider::{
    ConfigureRequest, ConfigureResponse, Provider, ProviderMetadataRequest,
    ProviderMetadataResponse,
};
pub use schema::{AttributeBuilder, Schema, SchemaBuilder};
pub use server::{serve, serve_listener, LogLevel, ServerConfig};
pub use types::{AttributePath, Config, Diagnostic, Diagnostics, Dynamic, DynamicValue};
pub use value::{ElementType, ListValue, SetValue};

/// Name reported in user agents of providers built on this framework
pub const FRAMEWORK_NAME: &str = "tfplug";
pub const FRAMEWORK_VERSION: &str = env!("CARGO_PKG_VERSION");

