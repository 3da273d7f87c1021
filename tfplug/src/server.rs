//! Server module for running Terraform providers
//!
//! `serve` performs the go-plugin handshake (magic cookie check, handshake
//! line on stdout), then answers provider requests until the provider is
//! stopped or the process is interrupted.
//!
//! Requests travel as newline-delimited JSON and the handshake announces the
//! `jsonl` transport. Terraform's plugin loader only speaks gRPC, so a binary
//! built on this server cannot be loaded by `terraform` itself. It is driven
//! by JSON-lines clients such as the tests in this workspace.

use crate::context::Context;
use crate::error::{Result, TfplugError};
use crate::provider::Provider;
use crate::rpc::{ProviderHandler, Response};
use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;

/// Environment variable Terraform sets when launching a plugin
pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

pub const CORE_PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_VERSION: u32 = 6;
/// Transport announced in the handshake line
pub const TRANSPORT_PROTOCOL: &str = "jsonl";

/// Log level for the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parses Terraform's `TF_LOG` values. `JSON` means trace in JSON form,
    /// which we treat as plain trace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "JSON" => Some(LogLevel::Trace),
            "DEBUG" => Some(LogLevel::Debug),
            "INFO" => Some(LogLevel::Info),
            "WARN" => Some(LogLevel::Warn),
            "ERROR" => Some(LogLevel::Error),
            _ => None,
        }
    }

    /// Reads `TF_LOG_PROVIDER`, then `TF_LOG`
    pub fn from_env() -> Option<Self> {
        ["TF_LOG_PROVIDER", "TF_LOG"]
            .iter()
            .filter_map(|key| std::env::var(key).ok())
            .find_map(|value| Self::parse(&value))
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Server configuration for running a Terraform provider
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub magic_cookie_key: String,
    pub magic_cookie_value: String,
    /// Address to listen on; port 0 picks a free port
    pub bind_address: SocketAddr,
    /// Maximum message size in bytes
    pub max_message_size: usize,
    pub log_level: LogLevel,
    /// Timeout for graceful shutdown
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            magic_cookie_key: MAGIC_COOKIE_KEY.to_string(),
            magic_cookie_value: MAGIC_COOKIE_VALUE.to_string(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 0)),
            max_message_size: 256 << 20, // 256MB
            log_level: LogLevel::from_env().unwrap_or(LogLevel::Info),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bind_address(mut self, address: SocketAddr) -> Self {
        self.bind_address = address;
        self
    }

    pub fn with_magic_cookie(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.magic_cookie_key = key.into();
        self.magic_cookie_value = value.into();
        self
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Line printed on stdout once the listener is up
    pub fn handshake_line(&self, address: SocketAddr) -> String {
        format!(
            "{}|{}|tcp|{}|{}",
            CORE_PROTOCOL_VERSION, PROTOCOL_VERSION, address, TRANSPORT_PROTOCOL
        )
    }

    fn check_magic_cookie(&self) -> Result<()> {
        match std::env::var(&self.magic_cookie_key) {
            Ok(value) if value == self.magic_cookie_value => Ok(()),
            _ => Err(TfplugError::HandshakeError(
                "This binary is a plugin. These are not meant to be executed directly. \
                 Please execute the program that consumes these plugins, which will \
                 load any plugins automatically"
                    .to_string(),
            )),
        }
    }
}

/// Main entry point for running a provider
///
/// `factory` builds the provider once the handshake checks pass.
pub async fn serve<P, F>(factory: F, config: ServerConfig) -> Result<()>
where
    P: Provider + 'static,
    F: FnOnce() -> P,
{
    config.check_magic_cookie()?;

    let listener = TcpListener::bind(config.bind_address).await?;
    let address = listener.local_addr()?;

    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", config.handshake_line(address))?;
    stdout.flush()?;

    tracing::info!(%address, "Provider server listening");

    let handler = ProviderHandler::new(factory(), Context::new());
    serve_listener(listener, handler, &config).await
}

/// Accepts connections on an already bound listener until the handler's
/// context is cancelled or Ctrl-C arrives, then waits up to the shutdown
/// timeout for open connections to finish.
pub async fn serve_listener<P: Provider + 'static>(
    listener: TcpListener,
    handler: ProviderHandler<P>,
    config: &ServerConfig,
) -> Result<()> {
    let context = handler.context().clone();
    let mut incoming = TcpListenerStream::new(listener);
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            _ = context.cancelled() => {
                tracing::info!("Provider stop requested, shutting down");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                context.cancel();
                break;
            }
            connection = incoming.next() => match connection {
                Some(Ok(stream)) => {
                    let handler = handler.clone();
                    let max_message_size = config.max_message_size;
                    connections.spawn(async move {
                        if let Err(e) = handle_connection(stream, handler, max_message_size).await {
                            tracing::warn!("Connection closed with error: {}", e);
                        }
                    });
                }
                Some(Err(e)) => tracing::warn!("Failed to accept connection: {}", e),
                None => break,
            },
            Some(finished) = connections.join_next() => {
                if let Err(e) = finished {
                    tracing::warn!("Connection task failed: {}", e);
                }
            }
        }
    }

    let drained = tokio::time::timeout(config.shutdown_timeout, async {
        while connections.join_next().await.is_some() {}
    })
    .await
    .is_ok();
    if !drained {
        tracing::warn!(
            "Connections still open after {:?}, aborting",
            config.shutdown_timeout
        );
        connections.abort_all();
    }

    Ok(())
}

async fn handle_connection<P: Provider + 'static>(
    stream: TcpStream,
    handler: ProviderHandler<P>,
    max_message_size: usize,
) -> Result<()> {
    let peer = stream.peer_addr().ok();
    tracing::debug!(?peer, "Accepted connection");

    let context = handler.context().clone();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let limit = max_message_size as u64 + 1;

    loop {
        let mut line = Vec::new();
        let mut limited = (&mut reader).take(limit);
        let read = tokio::select! {
            read = limited.read_until(b'\n', &mut line) => read?,
            _ = context.cancelled() => break,
        };

        if read == 0 {
            break;
        }

        let oversized = !line.ends_with(b"\n") && read as u64 >= limit;
        let response = if oversized {
            skip_line(&mut reader, limit).await?;
            Response::Error {
                message: format!("message exceeds {} bytes", max_message_size),
            }
        } else {
            match std::str::from_utf8(&line) {
                Err(e) => Response::Error {
                    message: format!("message is not valid UTF-8: {}", e),
                },
                Ok(text) if text.trim().is_empty() => continue,
                Ok(text) => handler.handle_line(text.trim_end()).await,
            }
        };

        let mut payload = serde_json::to_vec(&response)
            .map_err(|e| TfplugError::EncodingError(format!("response encoding failed: {}", e)))?;
        payload.push(b'\n');
        writer.write_all(&payload).await?;
        writer.flush().await?;

        if matches!(response, Response::StopProvider { .. }) {
            break;
        }
    }

    tracing::debug!(?peer, "Connection closed");
    Ok(())
}

/// Discards input up to and including the next newline, in bounded chunks
async fn skip_line<R>(reader: &mut R, chunk: u64) -> Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut discarded = Vec::new();
    loop {
        discarded.clear();
        let read = (&mut *reader).take(chunk).read_until(b'\n', &mut discarded).await?;
        if read == 0 || discarded.ends_with(b"\n") {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_line_announces_protocol_versions() {
        let config = ServerConfig::default();
        let line = config.handshake_line("127.0.0.1:4242".parse().unwrap());
        assert_eq!(line, "1|6|tcp|127.0.0.1:4242|jsonl");
    }

    #[test]
    fn log_level_parses_terraform_values() {
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("JSON"), Some(LogLevel::Trace));
        assert_eq!(LogLevel::parse("off"), None);
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ServerConfig::new()
            .with_max_message_size(1024)
            .with_shutdown_timeout(Duration::from_secs(1))
            .with_log_level(LogLevel::Error);
        assert_eq!(config.max_message_size, 1024);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.magic_cookie_key, MAGIC_COOKIE_KEY);
    }

    #[test]
    fn missing_magic_cookie_is_rejected() {
        let config = ServerConfig::new().with_magic_cookie("TFPLUG_TEST_COOKIE_UNSET", "x");
        let err = config.check_magic_cookie().unwrap_err();
        assert!(matches!(err, TfplugError::HandshakeError(_)));
    }
}
