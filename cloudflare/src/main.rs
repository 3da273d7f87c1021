//! Cloudflare provider plugin binary
//!
//! Speaks the JSON-lines transport of `tfplug::server`, not Terraform's gRPC
//! plugin protocol, so `terraform init` cannot load it as a provider.

use cloudflare::CloudflareProvider;
use tfplug::ServerConfig;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ServerConfig::new();

    // stdout carries the handshake, so logs go to stderr where Terraform collects them
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level.into()).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        framework = tfplug::FRAMEWORK_NAME,
        "Starting Cloudflare provider"
    );

    tfplug::serve(CloudflareProvider::new, config).await?;

    Ok(())
}
