//! State shared with everything that talks to the API once the provider is configured

use crate::api::Client;
use crate::config::ProviderConfig;
use std::sync::Arc;

#[derive(Clone)]
pub struct CloudflareProviderData {
    pub client: Arc<Client>,
    pub config: Arc<ProviderConfig>,
}

impl CloudflareProviderData {
    pub fn new(client: Client, config: ProviderConfig) -> Self {
        Self {
            client: Arc::new(client),
            config: Arc::new(config),
        }
    }

    /// Account used when a resource does not name one
    pub fn default_account_id(&self) -> Option<&str> {
        self.config.account_id.as_deref()
    }

    /// Zone used when a resource does not name one
    pub fn default_zone_id(&self) -> Option<&str> {
        self.config.zone_id.as_deref()
    }
}
