//! Token endpoint response

use serde::Deserialize;

/// JSON body returned by both the v1 and v2.0 token endpoints.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,

    pub token_type: Option<String>,

    /// v1 returns this as a string, v2.0 as a number.
    #[serde(default)]
    pub expires_in: Option<serde_json::Value>,
}
