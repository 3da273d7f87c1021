use serde::{Deserialize, Serialize};

/// Result of `GET /user/tokens/verify`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenStatus {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub not_before: Option<String>,
    #[serde(default)]
    pub expires_on: Option<String>,
}

impl TokenStatus {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDetails {
    pub id: String,
    pub email: String,
}

impl super::Client {
    pub async fn verify_token(&self) -> Result<TokenStatus, super::ApiError> {
        self.get("/user/tokens/verify").await
    }

    pub async fn user_details(&self) -> Result<UserDetails, super::ApiError> {
        self.get("/user").await
    }
}
