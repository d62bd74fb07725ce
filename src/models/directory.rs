//! Directory group member model

use serde::Deserialize;

/// A member of a directory group, as listed by Graph.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub id: String,

    pub display_name: Option<String>,

    pub user_principal_name: Option<String>,
}

impl GroupMember {
    /// Best available label for log lines.
    pub fn label(&self) -> &str {
        self.user_principal_name
            .as_deref()
            .or(self.display_name.as_deref())
            .unwrap_or(&self.id)
    }
}
