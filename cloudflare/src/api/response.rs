//! Cloudflare v4 response envelope

use super::ApiError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Every v4 endpoint wraps its payload as
/// `{"success":..,"errors":[..],"messages":[..],"result":..}`
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ResponseInfo>,
    #[serde(default)]
    pub messages: Vec<ResponseInfo>,
    pub result: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub code: i64,
    pub message: String,
}

impl std::fmt::Display for ResponseInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Unwraps a 2xx body
pub fn extract_result<T: DeserializeOwned>(status: u16, text: &str) -> Result<T, ApiError> {
    let envelope: ApiResponse<T> = serde_json::from_str(text).map_err(|e| {
        tracing::error!("Failed to parse response: {}, body: {}", e, text);
        ApiError::ParseError(format!("Failed to parse response: {}", e))
    })?;

    for message in &envelope.messages {
        tracing::debug!(code = message.code, "API message: {}", message.message);
    }

    if !envelope.success {
        return Err(ApiError::ApiError {
            status,
            errors: envelope.errors,
        });
    }

    match envelope.result {
        Some(result) => Ok(result),
        // Endpoints like DELETE may answer with a null result
        None => serde_json::from_value(serde_json::Value::Null)
            .map_err(|_| ApiError::ParseError("response has no result".to_string())),
    }
}

/// Builds the error for a non-2xx body, falling back to the raw text
pub fn extract_error(status: u16, text: &str) -> ApiError {
    let errors = match serde_json::from_str::<ApiResponse<serde_json::Value>>(text) {
        Ok(envelope) if !envelope.errors.is_empty() => envelope.errors,
        _ => vec![ResponseInfo {
            code: i64::from(status),
            message: if text.is_empty() {
                "Unknown error".to_string()
            } else {
                text.to_string()
            },
        }],
    };

    if status == 401 || status == 403 {
        return ApiError::AuthError(
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        );
    }

    ApiError::ApiError { status, errors }
}
