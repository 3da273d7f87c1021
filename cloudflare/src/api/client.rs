use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::error::ApiError;
use super::rate_limit::RateLimiter;
use super::response::{extract_error, extract_result};
use crate::config::{Credentials, ProviderConfig};

const AUTH_EMAIL_HEADER: &str = "X-Auth-Email";
const AUTH_KEY_HEADER: &str = "X-Auth-Key";
const AUTH_USER_SERVICE_KEY_HEADER: &str = "X-Auth-User-Service-Key";

/// Cloudflare v4 API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    retry_config: RetryConfig,
    rate_limiter: RateLimiter,
    logging: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            min_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based): doubles from
    /// `min_backoff` and never leaves `[min_backoff, max_backoff]`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.min_backoff
            .saturating_mul(factor)
            .clamp(self.min_backoff, self.max_backoff.max(self.min_backoff))
    }
}

impl Client {
    /// Builds a client from resolved provider settings
    pub fn new(config: &ProviderConfig) -> Result<Self, ApiError> {
        let retry_config = RetryConfig {
            max_retries: config.retries,
            min_backoff: config.min_backoff,
            max_backoff: config.max_backoff,
            ..Default::default()
        };
        Self::with_retry_config(config, retry_config)
    }

    pub fn with_retry_config(
        config: &ProviderConfig,
        retry_config: RetryConfig,
    ) -> Result<Self, ApiError> {
        let base_url = config
            .base_url()
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?
            .as_str()
            .trim_end_matches('/')
            .to_string();

        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .default_headers(auth_headers(
                &config.credentials,
                config.user_service_key.as_deref(),
            )?)
            .timeout(retry_config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                retry_config,
                rate_limiter: RateLimiter::new(config.rps),
                logging: config.api_client_logging,
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.inner.retry_config
    }

    /// Execute a GET request with retry logic
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute::<T, ()>(Method::GET, path, None).await
    }

    /// Execute a POST request with retry logic
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::POST, path, Some(body)).await
    }

    /// Execute a PUT request with retry logic
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::PUT, path, Some(body)).await
    }

    /// Execute a PATCH request with retry logic
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(Method::PATCH, path, Some(body)).await
    }

    /// Execute a DELETE request with retry logic
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute::<T, ()>(Method::DELETE, path, None).await
    }

    async fn execute<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.inner.base_url, path);
        let retry_config = &self.inner.retry_config;
        let mut attempt = 0;
        let mut last_error = None;
        let mut retry_after = None;

        while attempt <= retry_config.max_retries {
            if attempt > 0 {
                let backoff = retry_after
                    .take()
                    .map(|wait: Duration| wait.min(retry_config.max_backoff))
                    .unwrap_or_else(|| retry_config.backoff(attempt));
                tracing::debug!(
                    "Retrying {} {} after {}ms (attempt {})",
                    method,
                    path,
                    backoff.as_millis(),
                    attempt
                );
                tokio::time::sleep(backoff).await;
            }

            self.inner.rate_limiter.acquire().await;

            let mut request = self.inner.http_client.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }
            if self.inner.logging {
                tracing::debug!(method = %method, url = %url, attempt, "API request");
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    let wait = parse_retry_after(response.headers());
                    let text = response.text().await?;
                    if self.inner.logging {
                        tracing::debug!(status = status.as_u16(), body = %text, "API response");
                    }

                    if status.is_success() {
                        return extract_result(status.as_u16(), &text);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        retry_after = wait;
                        last_error = Some(ApiError::RateLimited);
                    } else if status.is_server_error() {
                        last_error = Some(ApiError::ServiceUnavailable(status.as_u16()));
                    } else {
                        return Err(extract_error(status.as_u16(), &text));
                    }
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(ApiError::Timeout(retry_config.timeout.as_secs()));
                    } else if e.is_connect() {
                        last_error = Some(ApiError::RequestError(e));
                    } else {
                        return Err(ApiError::RequestError(e));
                    }
                }
            }

            attempt += 1;
        }

        let error = last_error.unwrap_or(ApiError::ServiceUnavailable(503));
        tracing::warn!("{} {} failed after {} attempts: {}", method, path, attempt, error);
        Err(error)
    }
}

fn auth_headers(
    credentials: &Credentials,
    user_service_key: Option<&str>,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    match credentials {
        Credentials::ApiToken(token) => {
            headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {}", token))?);
        }
        Credentials::ApiKey { key, email } => {
            headers.insert(AUTH_KEY_HEADER, sensitive(key)?);
            headers.insert(AUTH_EMAIL_HEADER, sensitive(email)?);
        }
        Credentials::UserServiceKey(service_key) => {
            headers.insert(AUTH_USER_SERVICE_KEY_HEADER, sensitive(service_key)?);
        }
    }
    if let Some(service_key) = user_service_key {
        headers.insert(AUTH_USER_SERVICE_KEY_HEADER, sensitive(service_key)?);
    }
    Ok(headers)
}

fn sensitive(value: &str) -> Result<HeaderValue, ApiError> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| ApiError::AuthError("credentials contain invalid header characters".into()))?;
    header.set_sensitive(true);
    Ok(header)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
