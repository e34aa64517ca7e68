use hmac::{Hmac, Mac};
use sha2::{Digest, Sha512};
use std::fmt;

use crate::error::RemoteError;

type HmacSha512 = Hmac<Sha512>;

/// API key pair issued by the exchange
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub api_key: String,
    pub secret: String,
}

// Keep the secret out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
        }
    }

    /// Authentication headers for one request
    ///
    /// `url` must be the full URL including query string, and `body` the exact
    /// bytes sent (empty for GET/DELETE).
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        body: &str,
        timestamp_ms: i64,
    ) -> Result<Vec<(&'static str, String)>, RemoteError> {
        let timestamp = timestamp_ms.to_string();
        let content_hash = hash_content(body);
        let signature = sign_request(&self.secret, method, url, &timestamp, &content_hash)?;

        Ok(vec![
            ("Api-Key", self.api_key.clone()),
            ("Api-Timestamp", timestamp),
            ("Api-Content-Hash", content_hash),
            ("Api-Signature", signature),
        ])
    }
}

/// Hex-encoded SHA-512 of the request body
pub fn hash_content(body: &str) -> String {
    hex::encode(Sha512::digest(body.as_bytes()))
}

/// Hex-encoded HMAC-SHA512 over timestamp + url + method + content hash
pub fn sign_request(
    secret: &str,
    method: &str,
    url: &str,
    timestamp: &str,
    content_hash: &str,
) -> Result<String, RemoteError> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|e| RemoteError::Request(format!("invalid API secret: {}", e)))?;
    mac.update(timestamp.as_bytes());
    mac.update(url.as_bytes());
    mac.update(method.as_bytes());
    mac.update(content_hash.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}
