//! Shared Access Signature tokens for Service Bus

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a generated token, in seconds.
pub const TOKEN_LIFETIME_SECS: i64 = 3600;

/// Build the `Authorization` header value for `resource_uri`, valid until `expiry` (unix seconds).
///
/// The key is used as its UTF-8 bytes, not base64-decoded.
pub fn sas_token(resource_uri: &str, key_name: &str, key: &str, expiry: i64) -> String {
    let encoded_uri = urlencoding::encode(resource_uri);
    let string_to_sign = format!("{}\n{}", encoded_uri, expiry);

    let mut mac = <HmacSha256 as Mac>::new_from_slice(key.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(string_to_sign.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    format!(
        "SharedAccessSignature sr={}&sig={}&se={}&skn={}",
        encoded_uri,
        urlencoding::encode(&signature),
        expiry,
        key_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field<'a>(token: &'a str, name: &str) -> &'a str {
        token
            .trim_start_matches("SharedAccessSignature ")
            .split('&')
            .find_map(|pair| pair.strip_prefix(&format!("{name}=")))
            .unwrap()
    }

    #[test]
    fn test_token_fields() {
        let uri = "https://ns.servicebus.windows.net/subs";
        let token = sas_token(uri, "send", "secret", 1_700_000_000);
        assert!(token.starts_with("SharedAccessSignature "));
        assert_eq!(field(&token, "sr"), "https%3A%2F%2Fns.servicebus.windows.net%2Fsubs");
        assert_eq!(field(&token, "se"), "1700000000");
        assert_eq!(field(&token, "skn"), "send");
    }

    #[test]
    fn test_signature_verifies() {
        let uri = "https://ns.servicebus.windows.net/subs";
        let token = sas_token(uri, "send", "secret", 42);

        let sig = urlencoding::decode(field(&token, "sig")).unwrap();
        let raw = BASE64.decode(sig.as_bytes()).unwrap();

        let mut mac = <HmacSha256 as Mac>::new_from_slice(b"secret").unwrap();
        mac.update(format!("{}\n42", urlencoding::encode(uri)).as_bytes());
        mac.verify_slice(&raw).unwrap();
    }

    #[test]
    fn test_signature_depends_on_expiry() {
        let uri = "https://ns.servicebus.windows.net/subs";
        assert_ne!(sas_token(uri, "send", "secret", 1), sas_token(uri, "send", "secret", 2));
    }
}
