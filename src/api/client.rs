//! Authenticated JSON client shared by the Graph and management APIs

use crate::auth::BearerToken;
use crate::error::ApiError;
use crate::models::ODataPage;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

/// HTTP request timeout.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
/// HTTP connection timeout.
pub const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound on pages fetched by one listing.
pub const MAX_PAGES: usize = 1000;

/// Build the reqwest client used for every call in a run.
pub fn build_http_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("azurerbac/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .build()
}

/// HTTP client bound to one base URL and one bearer token
pub struct ApiClient {
    http_client: Client,
    base_url: String,
    token: BearerToken,
}

impl ApiClient {
    pub fn new(http_client: Client, base_url: impl Into<String>, token: BearerToken) -> Self {
        let base_url = base_url.into();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        }
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), body))
    }

    /// Make an authenticated GET request and deserialize the JSON response
    pub async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        debug!("GET {} ({} token)", url, self.token.audience());

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.token.secret())
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::check(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::ParseFailed(e.to_string()))
    }

    /// Whether `link` points at the same scheme, host and port as the base URL.
    fn same_origin(&self, link: &str) -> bool {
        match (Url::parse(&self.base_url), Url::parse(link)) {
            (Ok(base), Ok(link)) => base.origin() == link.origin(),
            _ => false,
        }
    }

    /// GET every page of a list, following next links until none remain
    ///
    /// Stops with [`ApiError::Paging`] on a repeated link, a link to another
    /// origin, or more than [`MAX_PAGES`] pages.
    pub async fn get_all<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut visited = HashSet::new();
        let mut next = Some(endpoint.to_string());

        while let Some(endpoint) = next {
            if visited.len() >= MAX_PAGES {
                return Err(ApiError::Paging(format!("more than {} pages", MAX_PAGES)));
            }
            if !visited.insert(endpoint.clone()) {
                return Err(ApiError::Paging(format!("next link repeats {}", endpoint)));
            }

            let page: ODataPage<T> = self.get_json(&endpoint).await?;
            items.extend(page.value);

            next = match page.next_link {
                Some(link) if !self.same_origin(&link) => {
                    return Err(ApiError::Paging(format!(
                        "next link {} is outside {}",
                        link, self.base_url
                    )));
                }
                link => link,
            };
        }

        Ok(items)
    }

    /// Make an authenticated DELETE request
    pub async fn delete(&self, endpoint: &str) -> Result<u16, ApiError> {
        let url = self.url(endpoint);
        debug!("DELETE {} ({} token)", url, self.token.audience());

        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(self.token.secret())
            .send()
            .await?;

        let response = Self::check(response).await?;
        Ok(response.status().as_u16())
    }
}
