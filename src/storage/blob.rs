//! Append-blob client

use super::account::StorageAccount;
use super::shared_key::{SignedRequest, authorization};
use crate::error::BlobError;
use chrono::Utc;
use reqwest::{Client, Url};
use tracing::debug;

/// Blob service API version sent with every request.
pub const STORAGE_API_VERSION: &str = "2021-08-06";

/// Client for a single blob at a fixed container/name.
pub struct BlobClient {
    http_client: Client,
    account: StorageAccount,
    url: Url,
}

impl BlobClient {
    pub fn new(
        http_client: Client,
        account: StorageAccount,
        container: &str,
        blob: &str,
    ) -> Result<Self, BlobError> {
        let raw = format!(
            "{}/{}/{}",
            account.blob_endpoint,
            urlencoding::encode(container),
            urlencoding::encode(blob)
        );
        let url = Url::parse(&raw).map_err(|e| BlobError::InvalidUrl(format!("{}: {}", raw, e)))?;

        Ok(Self {
            http_client,
            account,
            url,
        })
    }

    /// Create an empty append blob, replacing any existing blob at this path.
    pub async fn create_append_blob(&self) -> Result<(), BlobError> {
        self.put("create append blob", self.url.clone(), Some("AppendBlob"), Vec::new())
            .await
    }

    /// Append one block to the end of the blob.
    pub async fn append_block(&self, data: impl Into<Vec<u8>>) -> Result<(), BlobError> {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair("comp", "appendblock");
        self.put("append block", url, None, data.into()).await
    }

    async fn put(
        &self,
        operation: &'static str,
        url: Url,
        blob_type: Option<&str>,
        body: Vec<u8>,
    ) -> Result<(), BlobError> {
        let mut ms_headers = vec![
            ("x-ms-date", Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
            ("x-ms-version", STORAGE_API_VERSION.to_string()),
        ];
        if let Some(blob_type) = blob_type {
            ms_headers.push(("x-ms-blob-type", blob_type.to_string()));
        }

        let auth = authorization(
            &self.account.name,
            &self.account.key,
            &SignedRequest {
                method: "PUT",
                url: &url,
                content_length: body.len(),
                ms_headers: &ms_headers,
            },
        );

        debug!("PUT {} ({})", url, operation);

        let mut request = self
            .http_client
            .put(url)
            .header("Authorization", auth);
        for (name, value) in &ms_headers {
            request = request.header(*name, value);
        }

        let response = request.body(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlobError::RequestFailed {
                operation,
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
