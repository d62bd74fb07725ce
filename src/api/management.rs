//! Azure Resource Manager subscription endpoints

use super::ApiClient;
use crate::error::ApiError;
use crate::models::Subscription;

/// Management API scoped to subscription listing.
pub struct ManagementApi {
    client: ApiClient,
    api_version: String,
}

impl ManagementApi {
    pub fn new(client: ApiClient, api_version: impl Into<String>) -> Self {
        Self {
            client,
            api_version: api_version.into(),
        }
    }

    /// Get all subscriptions visible to the credential
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        let endpoint = format!("subscriptions?api-version={}", self.api_version);
        self.client.get_all(&endpoint).await
    }
}
