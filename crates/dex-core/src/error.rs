//! Error types for the swap pipeline's gateway and chain clients.

use thiserror::Error;

/// Gateway error code for "insufficient liquidity" on the requested pair.
pub const INSUFFICIENT_LIQUIDITY_CODE: &str = "82000";

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {message}")]
    Network { message: String, status: Option<u16> },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API error [{code}]: {message}")]
    Api { code: String, message: String },

    #[error("RPC error [{code}]: {message}")]
    Rpc { code: i64, message: String },

    #[error("Simulation failed: {reason}")]
    Simulation { reason: String },

    #[error("Broadcast failed: {message}")]
    Broadcast { message: String },

    #[error("Signing error: {message}")]
    Signing { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },
}

impl Error {
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Transport-level failure: the request may not have reached the gateway
    /// or its answer was unreadable. Retrying is the caller's decision.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Network { .. })
    }

    /// Gateway response code, for API rejections.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The pair cannot be routed at this size; adjust parameters rather than retry.
    pub fn is_insufficient_liquidity(&self) -> bool {
        self.api_code() == Some(INSUFFICIENT_LIQUIDITY_CODE)
    }
}

impl From<auth::CredentialsError> for Error {
    fn from(e: auth::CredentialsError) -> Self {
        Self::Config {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
