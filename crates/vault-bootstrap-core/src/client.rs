//! HTTP access to the vault's `sys` endpoints.
//!
//! [`VaultApi`] is the seam between the bootstrap components and the network.
//! [`VaultClient`] is the `reqwest` implementation used in production.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{BootstrapError, Result};
use crate::types::{InitRequest, InitResult, UnsealRequest, UnsealResponse, VaultStatus};

/// The three vault operations the bootstrap sequence needs.
#[async_trait]
pub trait VaultApi: Send + Sync {
    /// `GET /v1/sys/seal-status`.
    async fn seal_status(&self) -> Result<VaultStatus>;

    /// `PUT /v1/sys/init`.
    async fn init(&self, request: InitRequest) -> Result<InitResult>;

    /// `PUT /v1/sys/unseal` with a single key share.
    async fn submit_unseal_key(&self, key: &str) -> Result<UnsealResponse>;
}

/// `reqwest`-backed vault client.
pub struct VaultClient {
    http: reqwest::Client,
    /// Base address without a trailing slash.
    addr: String,
}

impl VaultClient {
    /// Create a client for the vault at `addr` (e.g. `http://127.0.0.1:8200`).
    pub fn new(addr: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("vault-bootstrap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            addr: addr.trim_end_matches('/').to_string(),
        })
    }

    /// The base address requests are sent to.
    pub fn address(&self) -> &str {
        &self.addr
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/sys/{path}", self.addr)
    }

    async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(url = %url, "PUT");
        let response = self.http.put(&url).json(body).send().await?;
        decode(response).await
    }
}

#[async_trait]
impl VaultApi for VaultClient {
    async fn seal_status(&self) -> Result<VaultStatus> {
        let url = self.endpoint("seal-status");
        debug!(url = %url, "GET");
        let response = self.http.get(&url).send().await?;
        decode(response).await
    }

    async fn init(&self, request: InitRequest) -> Result<InitResult> {
        self.put("init", &request).await
    }

    async fn submit_unseal_key(&self, key: &str) -> Result<UnsealResponse> {
        let request = UnsealRequest {
            key: key.to_string(),
        };
        self.put("unseal", &request).await
    }
}

/// Turn a response into `T`, mapping non-2xx statuses to [`BootstrapError::Api`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(BootstrapError::Api {
            status: status.as_u16(),
            message: api_error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
        });
    }

    Ok(serde_json::from_slice(&body)?)
}

/// Extract a readable message from a vault error body.
///
/// Vault reports failures as `{"errors": ["..."]}`; anything else is returned
/// verbatim (trimmed).
fn api_error_message(body: &[u8]) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        errors: Vec<String>,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if !parsed.errors.is_empty() {
            return Some(parsed.errors.join("; "));
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
