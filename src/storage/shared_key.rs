//! Shared Key authorization for the Blob service

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The parts of a request covered by the signature.
pub struct SignedRequest<'a> {
    pub method: &'a str,
    pub url: &'a Url,
    pub content_length: usize,
    /// `x-ms-*` headers sent with the request.
    pub ms_headers: &'a [(&'a str, String)],
}

pub fn string_to_sign(account: &str, request: &SignedRequest<'_>) -> String {
    // Content-Length is empty when zero.
    let content_length = match request.content_length {
        0 => String::new(),
        n => n.to_string(),
    };

    let mut headers: Vec<(String, &str)> = request
        .ms_headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim()))
        .collect();
    headers.sort();
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();

    let mut canonical_resource = format!("/{}{}", account, request.url.path());
    let mut params: Vec<(String, String)> = request
        .url
        .query_pairs()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.into_owned()))
        .collect();
    params.sort();
    for (name, value) in params {
        canonical_resource.push_str(&format!("\n{}:{}", name, value));
    }

    format!(
        "{}\n\n\n{}\n\n\n\n\n\n\n\n\n{}{}",
        request.method, content_length, canonical_headers, canonical_resource
    )
}

/// `Authorization` header value for a request.
pub fn authorization(account: &str, key: &[u8], request: &SignedRequest<'_>) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(string_to_sign(account, request).as_bytes());
    format!(
        "SharedKey {}:{}",
        account,
        BASE64.encode(mac.finalize().into_bytes())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "Fri, 16 Oct 2026 08:00:00 GMT";

    #[test]
    fn test_create_append_blob_string() {
        let url =
            Url::parse("https://acct.blob.core.windows.net/rbacreport/rbac_report.csv").unwrap();
        let headers = [
            ("x-ms-version", "2021-08-06".to_string()),
            ("x-ms-date", DATE.to_string()),
            ("x-ms-blob-type", "AppendBlob".to_string()),
        ];
        let request = SignedRequest {
            method: "PUT",
            url: &url,
            content_length: 0,
            ms_headers: &headers,
        };

        assert_eq!(
            string_to_sign("acct", &request),
            "PUT\n\n\n\n\n\n\n\n\n\n\n\n\
             x-ms-blob-type:AppendBlob\n\
             x-ms-date:Fri, 16 Oct 2026 08:00:00 GMT\n\
             x-ms-version:2021-08-06\n\
             /acct/rbacreport/rbac_report.csv"
        );
    }

    #[test]
    fn test_append_block_string_includes_query_and_length() {
        let url = Url::parse("http://127.0.0.1:10000/devstoreaccount1/c/b.csv?comp=appendblock")
            .unwrap();
        let headers = [("x-ms-date", DATE.to_string())];
        let request = SignedRequest {
            method: "PUT",
            url: &url,
            content_length: 11,
            ms_headers: &headers,
        };

        assert_eq!(
            string_to_sign("devstoreaccount1", &request),
            "PUT\n\n\n11\n\n\n\n\n\n\n\n\n\
             x-ms-date:Fri, 16 Oct 2026 08:00:00 GMT\n\
             /devstoreaccount1/devstoreaccount1/c/b.csv\ncomp:appendblock"
        );
    }

    #[test]
    fn test_authorization_verifies() {
        let url = Url::parse("https://acct.blob.core.windows.net/c/b").unwrap();
        let request = SignedRequest {
            method: "PUT",
            url: &url,
            content_length: 0,
            ms_headers: &[],
        };
        let header = authorization("acct", b"key", &request);
        let signature = header.strip_prefix("SharedKey acct:").unwrap();

        let mut mac = <HmacSha256 as Mac>::new_from_slice(b"key").unwrap();
        mac.update(string_to_sign("acct", &request).as_bytes());
        mac.verify_slice(&BASE64.decode(signature).unwrap()).unwrap();
    }
}
