//! Authenticated gateway client and response envelope handling.

use super::auth::{iso_timestamp, AuthSigner};
use super::transport::{GatewayRequest, HttpTransport, Method, Transport};
use crate::config::{ApiVersion, Config};
use crate::types::lenient;
use crate::{Error, Result};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Gateway success code.
pub const SUCCESS_CODE: &str = "0";

/// `{code, msg, data}` wrapper around every gateway response.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(deserialize_with = "lenient::string")]
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl Envelope {
    #[allow(clippy::result_large_err)]
    fn into_data(self) -> Result<Vec<serde_json::Value>> {
        if self.code != SUCCESS_CODE {
            return Err(Error::Api {
                code: self.code,
                message: self.msg,
            });
        }
        Ok(match self.data {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Null => Vec::new(),
            other => vec![other],
        })
    }
}

/// Build `?k=v&...` with form encoding, or an empty string for no params.
pub fn build_query(params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let mut serializer = url::form_urlencoded::Serializer::for_suffix(String::from("?"), 1);
    serializer.extend_pairs(params);
    serializer.finish()
}

/// Signs, sends, and unwraps gateway calls. Shared by every service.
#[derive(Clone)]
pub struct GatewayClient {
    transport: Arc<dyn Transport>,
    signer: AuthSigner,
    api_version: ApiVersion,
}

impl GatewayClient {
    pub fn new(transport: Arc<dyn Transport>, signer: AuthSigner, api_version: ApiVersion) -> Self {
        Self {
            transport,
            signer,
            api_version,
        }
    }

    /// Client over HTTP built from configuration. Fails when credentials are
    /// incomplete or the proxy is invalid.
    #[allow(clippy::result_large_err)]
    pub fn from_config(config: &Config) -> Result<Self> {
        let signer = AuthSigner::new(&config.credentials)?;
        let transport = HttpTransport::new(&config.gateway)?;
        Ok(Self::new(
            Arc::new(transport),
            signer,
            config.gateway.api_version,
        ))
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    fn path(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_version.path_prefix(), endpoint)
    }

    /// GET an endpoint and return its `data` items.
    pub async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<serde_json::Value>> {
        let path = self.path(endpoint);
        let query = build_query(params);
        let timestamp = iso_timestamp(Utc::now());
        let headers = self.signer.headers(&timestamp, "GET", &path, &query)?;

        self.send(GatewayRequest {
            method: Method::Get,
            path,
            query,
            body: None,
            headers,
        })
        .await
    }

    /// POST a JSON body to an endpoint and return its `data` items.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Vec<serde_json::Value>> {
        let path = self.path(endpoint);
        let body = serde_json::to_string(body)?;
        let timestamp = iso_timestamp(Utc::now());
        let headers = self.signer.headers(&timestamp, "POST", &path, &body)?;

        self.send(GatewayRequest {
            method: Method::Post,
            path,
            query: String::new(),
            body: Some(body),
            headers,
        })
        .await
    }

    /// GET and decode the first `data` item. An empty result is an API error.
    pub async fn get_first<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let items = self.get(endpoint, params).await?;
        first_item(endpoint, items)
    }

    /// POST and decode the first `data` item. An empty result is an API error.
    pub async fn post_first<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T> {
        let items = self.post(endpoint, body).await?;
        first_item(endpoint, items)
    }

    async fn send(&self, request: GatewayRequest) -> Result<Vec<serde_json::Value>> {
        let path = request.path.clone();
        let raw = self.transport.execute(request).await?;

        let envelope: Envelope = serde_json::from_str(&raw).map_err(|e| Error::Network {
            message: format!("Unreadable gateway response from {}: {}", path, e),
            status: None,
        })?;

        match envelope.into_data() {
            Ok(data) => {
                debug!(path = %path, items = data.len(), "Gateway call succeeded");
                Ok(data)
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Gateway rejected request");
                Err(e)
            }
        }
    }
}

#[allow(clippy::result_large_err)]
fn first_item<T: DeserializeOwned>(endpoint: &str, items: Vec<serde_json::Value>) -> Result<T> {
    let first = items.into_iter().next().ok_or_else(|| Error::Api {
        code: SUCCESS_CODE.to_string(),
        message: format!("Empty data in response from {}", endpoint),
    })?;
    Ok(serde_json::from_value(first)?)
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::api::transport::MockTransport;
    use ::auth::ApiCredentials;

    pub(crate) fn client_with(transport: MockTransport, version: ApiVersion) -> GatewayClient {
        let signer =
            AuthSigner::new(&ApiCredentials::new("key", "secret", "pass", "project")).unwrap();
        GatewayClient::new(Arc::new(transport), signer, version)
    }

    pub(crate) fn envelope(code: &str, msg: &str, data: serde_json::Value) -> String {
        serde_json::json!({"code": code, "msg": msg, "data": data}).to_string()
    }
}
