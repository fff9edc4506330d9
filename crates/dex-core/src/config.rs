//! Configuration management for the swap pipeline.
//!
//! A [`Config`] is built once at startup (from the environment or a TOML file
//! layered under environment overrides) and passed into every component
//! constructor.

use crate::{Error, Result};
use auth::ApiCredentials;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default gateway host.
pub const DEFAULT_BASE_URL: &str = "https://web3.okx.com";

/// Aggregator API version.
///
/// The versions disagree on a few query parameter names; every endpoint
/// builder asks the version instead of hard-coding one spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V5,
    #[default]
    V6,
}

impl ApiVersion {
    /// Request path prefix, e.g. `/api/v6/`.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            Self::V5 => "/api/v5/",
            Self::V6 => "/api/v6/",
        }
    }

    /// Name of the slippage parameter on the swap endpoint.
    pub fn slippage_param(&self) -> &'static str {
        match self {
            Self::V5 => "slippage",
            Self::V6 => "slippagePercent",
        }
    }

    /// Name of the chain parameter on the aggregator endpoints.
    pub fn aggregator_chain_param(&self) -> &'static str {
        match self {
            Self::V5 => "chainId",
            Self::V6 => "chainIndex",
        }
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "v5" | "5" => Ok(Self::V5),
            "v6" | "6" => Ok(Self::V6),
            other => Err(Error::Config {
                message: format!("Unsupported API version: {}", other),
            }),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub credentials: ApiCredentials,
    pub chain: ChainConfig,
    pub tracking: TrackingConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_version: ApiVersion,
    /// Optional HTTP(S) proxy for all outbound requests.
    pub proxy_url: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: ApiVersion::default(),
            proxy_url: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Gateway chain identifier. Equal to the EVM chain id for EVM chains.
    pub chain_index: String,
    pub rpc_url: String,
    /// Wallet address, cross-checked against the signing key when set.
    pub wallet_address: Option<String>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_index: "1".to_string(),
            rpc_url: String::new(),
            wallet_address: None,
        }
    }
}

impl ChainConfig {
    /// Numeric EVM chain id used for transaction signing.
    pub fn chain_id(&self) -> Result<u64> {
        self.chain_index.trim().parse().map_err(|_| Error::Config {
            message: format!("Chain index {} is not an EVM chain id", self.chain_index),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            timeout_ms: 300_000,
        }
    }
}

impl TrackingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Submit directly to the chain node when the gateway rejects a broadcast.
    pub rpc_fallback: bool,
    /// Run the gateway simulation before estimating gas and signing.
    pub simulate_before_broadcast: bool,
    /// Send an ERC-20 approval when the router allowance is too low.
    pub approve_tokens: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            rpc_fallback: true,
            simulate_before_broadcast: false,
            approve_tokens: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    #[allow(clippy::result_large_err)]
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    #[allow(clippy::result_large_err)]
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| {
            lookup(name)
                .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(default)
        };
        let number = |name: &str, default: u64| {
            lookup(name)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        };

        let api_version = match lookup("OKX_API_VERSION") {
            Some(v) => v.parse()?,
            None => defaults.gateway.api_version,
        };

        let config = Self {
            gateway: GatewayConfig {
                base_url: lookup("OKX_BASE_URL").unwrap_or(defaults.gateway.base_url),
                api_version,
                proxy_url: lookup("HTTP_PROXY_URL").filter(|s| !s.trim().is_empty()),
                request_timeout_secs: number(
                    "HTTP_TIMEOUT_SECS",
                    defaults.gateway.request_timeout_secs,
                ),
                connect_timeout_secs: defaults.gateway.connect_timeout_secs,
            },
            credentials: ApiCredentials::from_lookup(&lookup),
            chain: ChainConfig {
                chain_index: lookup("OKX_CHAIN_INDEX").unwrap_or(defaults.chain.chain_index),
                rpc_url: lookup("EVM_RPC_URL").ok_or_else(|| Error::Config {
                    message: "EVM_RPC_URL environment variable not set".to_string(),
                })?,
                wallet_address: lookup("EVM_WALLET_ADDRESS").filter(|s| !s.trim().is_empty()),
            },
            tracking: TrackingConfig {
                interval_ms: number("TRACK_INTERVAL_MS", defaults.tracking.interval_ms),
                timeout_ms: number("TRACK_TIMEOUT_MS", defaults.tracking.timeout_ms),
            },
            execution: ExecutionConfig {
                rpc_fallback: flag("RPC_FALLBACK_ENABLED", defaults.execution.rpc_fallback),
                simulate_before_broadcast: flag(
                    "SIMULATE_BEFORE_BROADCAST",
                    defaults.execution.simulate_before_broadcast,
                ),
                approve_tokens: flag("APPROVE_TOKENS", defaults.execution.approve_tokens),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file layered under `DEX_SWAP__SECTION__KEY` environment
    /// overrides. Credentials absent from the file fall back to `OKX_*`.
    #[allow(clippy::result_large_err)]
    pub fn load(path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("DEX_SWAP").separator("__"))
            .build()?;

        let mut config: Config = settings.try_deserialize()?;

        let env_credentials = ApiCredentials::from_env();
        let creds = &mut config.credentials;
        creds.api_key = creds.api_key.take().or(env_credentials.api_key);
        creds.secret_key = creds.secret_key.take().or(env_credentials.secret_key);
        creds.passphrase = creds.passphrase.take().or(env_credentials.passphrase);
        creds.project_id = creds.project_id.take().or(env_credentials.project_id);

        config.validate()?;
        Ok(config)
    }

    /// Structural checks that do not need the network.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_url.trim().is_empty() {
            return Err(Error::Config {
                message: "chain RPC URL is not configured".to_string(),
            });
        }
        self.chain.chain_id()?;
        if self.tracking.interval_ms == 0 || self.tracking.timeout_ms == 0 {
            return Err(Error::Config {
                message: "tracking interval and timeout must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Configuration for tests (no network endpoints are contacted).
    pub fn test_config() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            credentials: ApiCredentials::new("test-key", "test-secret", "test-pass", "test-project"),
            chain: ChainConfig {
                chain_index: "1".to_string(),
                rpc_url: "http://127.0.0.1:8545".to_string(),
                wallet_address: None,
            },
            tracking: TrackingConfig::default(),
            execution: ExecutionConfig::default(),
        }
    }
}
