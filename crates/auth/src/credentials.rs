//! Gateway API credentials.
//!
//! The aggregator gateway authenticates every request with four values issued
//! together from its developer portal. They are loaded once at startup and
//! handed to the request signer; nothing in the swap pipeline reads the
//! environment directly.

use serde::Deserialize;
use thiserror::Error;

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OKX_API_KEY";
/// Environment variable holding the HMAC secret.
pub const SECRET_KEY_VAR: &str = "OKX_SECRET_KEY";
/// Environment variable holding the API passphrase.
pub const PASSPHRASE_VAR: &str = "OKX_API_PASSPHRASE";
/// Environment variable holding the project id.
pub const PROJECT_ID_VAR: &str = "OKX_PROJECT_ID";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("missing API credentials: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// API credentials for authenticated gateway requests.
///
/// Every field is optional so an incomplete set can still be loaded and
/// reported; [`ApiCredentials::ensure_complete`] is the gate.
#[derive(Clone, Default, Deserialize)]
pub struct ApiCredentials {
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub passphrase: Option<String>,
    pub project_id: Option<String>,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(v: &Option<String>) -> &'static str {
            if v.is_some() {
                "[REDACTED]"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("ApiCredentials")
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("passphrase", &redact(&self.passphrase))
            .field("project_id", &redact(&self.project_id))
            .finish()
    }
}

impl ApiCredentials {
    /// Create a complete credential set.
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: Some(api_key.into()),
            secret_key: Some(secret_key.into()),
            passphrase: Some(passphrase.into()),
            project_id: Some(project_id.into()),
        }
    }

    /// Load from the `OKX_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: lookup(API_KEY_VAR),
            secret_key: lookup(SECRET_KEY_VAR),
            passphrase: lookup(PASSPHRASE_VAR),
            project_id: lookup(PROJECT_ID_VAR),
        }
    }

    /// Names of the variables that are absent or blank.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (API_KEY_VAR, &self.api_key),
            (SECRET_KEY_VAR, &self.secret_key),
            (PASSPHRASE_VAR, &self.passphrase),
            (PROJECT_ID_VAR, &self.project_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }

    /// Fail unless all four values are present.
    pub fn ensure_complete(&self) -> Result<(), CredentialsError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CredentialsError::Missing(missing))
        }
    }
}
