//! OAuth2 client-credentials grant against the Microsoft identity platform

use crate::error::AuthError;
use crate::models::TokenResponse;
use reqwest::Client;
use std::fmt;
use tracing::debug;

/// The API a token is issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAudience {
    /// Azure Resource Manager, via `/oauth2/token` with a `resource`.
    Management,
    /// Microsoft Graph, via `/oauth2/v2.0/token` with a `scope`.
    Graph,
}

impl TokenAudience {
    fn token_path(self, tenant_id: &str) -> String {
        match self {
            Self::Management => format!("/{}/oauth2/token", tenant_id),
            Self::Graph => format!("/{}/oauth2/v2.0/token", tenant_id),
        }
    }

    /// Form field naming the audience.
    fn audience_param(self) -> (&'static str, &'static str) {
        match self {
            Self::Management => ("resource", "https://management.azure.com"),
            Self::Graph => ("scope", "https://graph.microsoft.com/.default"),
        }
    }
}

impl fmt::Display for TokenAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Management => f.write_str("management"),
            Self::Graph => f.write_str("graph"),
        }
    }
}

/// App registration id and secret.
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// An access token scoped to one audience. Held in memory for one run only.
#[derive(Clone)]
pub struct BearerToken {
    audience: TokenAudience,
    secret: String,
}

impl BearerToken {
    pub fn new(audience: TokenAudience, secret: impl Into<String>) -> Self {
        Self {
            audience,
            secret: secret.into(),
        }
    }

    pub fn audience(&self) -> TokenAudience {
        self.audience
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("audience", &self.audience)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Exchanges client credentials for bearer tokens in one tenant.
pub struct ClientCredentialsAuthenticator {
    http_client: Client,
    authority: String,
    tenant_id: String,
}

impl ClientCredentialsAuthenticator {
    /// Create a new authenticator
    ///
    /// # Arguments
    /// * `http_client` - Shared HTTP client
    /// * `authority` - Identity provider base URL (e.g., "https://login.microsoftonline.com")
    /// * `tenant_id` - Directory (tenant) id
    pub fn new(
        http_client: Client,
        authority: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Self {
        let authority = authority.into();
        let authority = authority.trim_end_matches('/').to_string();

        Self {
            http_client,
            authority,
            tenant_id: tenant_id.into(),
        }
    }

    /// Request a token for `audience`. No retry: any failure is returned as is.
    pub async fn acquire(
        &self,
        audience: TokenAudience,
        credentials: &ClientCredentials,
    ) -> Result<BearerToken, AuthError> {
        let url = format!("{}{}", self.authority, audience.token_path(&self.tenant_id));
        let (audience_key, audience_value) = audience.audience_param();

        debug!("Requesting {} token from {}", audience, url);

        let params = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            (audience_key, audience_value),
        ];

        let response = self.http_client.post(&url).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::TokenEndpoint {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ParseFailed(e.to_string()))?;

        debug!(
            "Received {} token (type {}, expires in {})",
            audience,
            token.token_type.as_deref().unwrap_or("unknown"),
            token
                .expires_in
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_string())
        );

        match token.access_token {
            Some(secret) if !secret.is_empty() => Ok(BearerToken::new(audience, secret)),
            _ => Err(AuthError::MissingAccessToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, ClientCredentialsAuthenticator) {
        let server = MockServer::start().await;
        let authenticator =
            ClientCredentialsAuthenticator::new(Client::new(), server.uri(), "tenant-1");
        (server, authenticator)
    }

    fn credentials() -> ClientCredentials {
        ClientCredentials::new("app-id", "app-secret")
    }

    #[tokio::test]
    async fn test_graph_token_uses_v2_scope() {
        let (server, authenticator) = setup().await;

        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=app-id"))
            .and(body_string_contains("scope=https%3A%2F%2Fgraph.microsoft.com%2F.default"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "graph-token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = authenticator
            .acquire(TokenAudience::Graph, &credentials())
            .await
            .unwrap();
        assert_eq!(token.secret(), "graph-token");
        assert_eq!(token.audience(), TokenAudience::Graph);
    }

    #[tokio::test]
    async fn test_management_token_uses_legacy_resource() {
        let (server, authenticator) = setup().await;

        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/token"))
            .and(body_string_contains("resource=https%3A%2F%2Fmanagement.azure.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer",
                "expires_in": "3599",
                "resource": "https://management.azure.com",
                "access_token": "arm-token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = authenticator
            .acquire(TokenAudience::Management, &credentials())
            .await
            .unwrap();
        assert_eq!(token.secret(), "arm-token");
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (server, authenticator) = setup().await;

        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let err = authenticator
            .acquire(TokenAudience::Graph, &credentials())
            .await
            .unwrap_err();
        match err {
            AuthError::TokenEndpoint { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid_client");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_access_token() {
        let (server, authenticator) = setup().await;

        Mock::given(method("POST"))
            .and(path("/tenant-1/oauth2/v2.0/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "Bearer"
            })))
            .mount(&server)
            .await;

        let err = authenticator
            .acquire(TokenAudience::Graph, &credentials())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingAccessToken));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let token = BearerToken::new(TokenAudience::Graph, "super-secret");
        assert!(!format!("{token:?}").contains("super-secret"));
        assert!(!format!("{:?}", credentials()).contains("app-secret"));
    }
}
