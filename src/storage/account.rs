//! Storage account credentials from a connection string

use crate::connection_string::ConnectionString;
use crate::error::ConnectionStringError;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::fmt;

/// Account name, decoded key and blob service endpoint.
#[derive(Clone)]
pub struct StorageAccount {
    pub name: String,
    pub key: Vec<u8>,
    pub blob_endpoint: String,
}

impl StorageAccount {
    /// Accepts either an explicit `BlobEndpoint` or the
    /// `DefaultEndpointsProtocol` + `EndpointSuffix` form.
    pub fn from_connection_string(input: &str) -> Result<Self, ConnectionStringError> {
        let cs = ConnectionString::parse(input)?;

        let name = cs.require("AccountName")?.to_string();
        let key = BASE64
            .decode(cs.require("AccountKey")?)
            .map_err(|e| ConnectionStringError::InvalidValue {
                key: "AccountKey",
                reason: e.to_string(),
            })?;

        let blob_endpoint = match cs.get("BlobEndpoint") {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => {
                let protocol = cs.get("DefaultEndpointsProtocol").unwrap_or("https");
                let suffix = cs.get("EndpointSuffix").unwrap_or("core.windows.net");
                format!("{}://{}.blob.{}", protocol, name, suffix)
            }
        };

        Ok(Self {
            name,
            key,
            blob_endpoint,
        })
    }
}

impl fmt::Debug for StorageAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageAccount")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let account = StorageAccount::from_connection_string(
            "DefaultEndpointsProtocol=https;AccountName=rbacstore;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net",
        )
        .unwrap();
        assert_eq!(account.name, "rbacstore");
        assert_eq!(account.key, b"secret");
        assert_eq!(account.blob_endpoint, "https://rbacstore.blob.core.windows.net");
    }

    #[test]
    fn test_explicit_blob_endpoint() {
        let account = StorageAccount::from_connection_string(
            "AccountName=devstoreaccount1;AccountKey=c2VjcmV0;BlobEndpoint=http://127.0.0.1:10000/devstoreaccount1/",
        )
        .unwrap();
        assert_eq!(account.blob_endpoint, "http://127.0.0.1:10000/devstoreaccount1");
    }

    #[test]
    fn test_invalid_key() {
        let err = StorageAccount::from_connection_string("AccountName=a;AccountKey=not*base64")
            .unwrap_err();
        assert!(matches!(
            err,
            ConnectionStringError::InvalidValue { key: "AccountKey", .. }
        ));
    }
}
