//! HTTP transport seam for gateway requests.

use crate::config::GatewayConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A fully prepared gateway request: the path already carries the version
/// prefix, the query string its leading `?`, and the headers are signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub body: Option<String>,
    pub headers: Vec<(&'static str, String)>,
}

impl GatewayRequest {
    /// Path plus query, as sent on the wire.
    pub fn path_and_query(&self) -> String {
        format!("{}{}", self.path, self.query)
    }
}

/// Issues a prepared request and returns the raw response body.
///
/// Implementations return `Ok` for any response that carries a gateway
/// envelope, whatever its HTTP status, so that API error codes reach the
/// caller intact.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: GatewayRequest) -> Result<String>;
}

/// [`Transport`] over `reqwest`, with optional proxy.
pub struct HttpTransport {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| Error::Config {
                message: format!("Invalid proxy URL {}: {}", proxy_url, e),
            })?;
            builder = builder.proxy(proxy);
        }

        let http_client = builder.build().map_err(|e| Error::Config {
            message: format!("Failed to build HTTP client: {}", e),
        })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: GatewayRequest) -> Result<String> {
        let url = format!("{}{}", self.base_url, request.path_and_query());
        debug!(method = request.method.as_str(), url = %url, "Gateway request");

        let mut builder = match request.method {
            Method::Get => self.http_client.get(&url),
            Method::Post => self.http_client.post(&url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() || looks_like_envelope(&body) {
            Ok(body)
        } else {
            Err(Error::Network {
                message: format!("Gateway returned HTTP {}: {}", status, truncate(&body, 200)),
                status: Some(status.as_u16()),
            })
        }
    }
}

fn looks_like_envelope(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .map(|v| v.get("code").is_some())
        .unwrap_or(false)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
