//! Microsoft Graph group membership endpoints

use super::ApiClient;
use crate::error::ApiError;
use crate::models::GroupMember;

/// Graph API scoped to group membership.
pub struct DirectoryApi {
    client: ApiClient,
}

impl DirectoryApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Get every member of a group
    pub async fn list_group_members(&self, group_id: &str) -> Result<Vec<GroupMember>, ApiError> {
        let endpoint = format!("groups/{}/members", group_id);
        self.client.get_all(&endpoint).await
    }

    /// Remove a member from a group by reference. Returns the response status.
    pub async fn remove_group_member(
        &self,
        group_id: &str,
        member_id: &str,
    ) -> Result<u16, ApiError> {
        let endpoint = format!("groups/{}/members/{}/$ref", group_id, member_id);
        self.client.delete(&endpoint).await
    }
}
