//! Gateway request authentication.
//!
//! Every gateway call carries five `OK-ACCESS-*` headers. The signature is
//! `base64(HMAC-SHA256(secret, timestamp + method + path + payload))` where the
//! payload is the query string (with its leading `?`) for GET and the JSON
//! body for POST. Signing is pure: the caller supplies the timestamp.

use crate::{Error, Result};
use ::auth::ApiCredentials;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

pub const HEADER_KEY: &str = "OK-ACCESS-KEY";
pub const HEADER_SIGN: &str = "OK-ACCESS-SIGN";
pub const HEADER_TIMESTAMP: &str = "OK-ACCESS-TIMESTAMP";
pub const HEADER_PASSPHRASE: &str = "OK-ACCESS-PASSPHRASE";
pub const HEADER_PROJECT: &str = "OK-ACCESS-PROJECT";

/// Format a timestamp the way the gateway expects: ISO-8601, second
/// resolution, `Z` suffix.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Builds authentication headers from a complete credential set.
#[derive(Clone)]
pub struct AuthSigner {
    api_key: String,
    secret_key: String,
    passphrase: String,
    project_id: String,
}

impl AuthSigner {
    /// Fails with a configuration error naming every missing credential.
    #[allow(clippy::result_large_err)]
    pub fn new(credentials: &ApiCredentials) -> Result<Self> {
        credentials.ensure_complete()?;
        let field = |v: &Option<String>| v.clone().unwrap_or_default();
        Ok(Self {
            api_key: field(&credentials.api_key),
            secret_key: field(&credentials.secret_key),
            passphrase: field(&credentials.passphrase),
            project_id: field(&credentials.project_id),
        })
    }

    /// Signature over `timestamp + method + path + query_or_body`.
    #[allow(clippy::result_large_err)]
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        query_or_body: &str,
    ) -> Result<String> {
        let message = format!("{}{}{}{}", timestamp, method, path, query_or_body);

        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.secret_key.as_bytes()).map_err(|e| {
                Error::signing(format!("Failed to create HMAC: {}", e))
            })?;
        mac.update(message.as_bytes());

        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// The full header set for one request, `Content-Type` included.
    #[allow(clippy::result_large_err)]
    pub fn headers(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        query_or_body: &str,
    ) -> Result<Vec<(&'static str, String)>> {
        let signature = self.sign(timestamp, method, path, query_or_body)?;
        Ok(vec![
            ("Content-Type", "application/json".to_string()),
            (HEADER_KEY, self.api_key.clone()),
            (HEADER_SIGN, signature),
            (HEADER_TIMESTAMP, timestamp.to_string()),
            (HEADER_PASSPHRASE, self.passphrase.clone()),
            (HEADER_PROJECT, self.project_id.clone()),
        ])
    }
}

impl std::fmt::Debug for AuthSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSigner")
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
