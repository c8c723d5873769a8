//! Init result stored inside a namespaced key-value secret.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::info;

use super::SecretStore;
use crate::error::{BootstrapError, Result};
use crate::types::InitResult;

/// Field of the secret that holds the serialized init result.
pub const RECORD_FIELD: &str = "value";

/// Minimal get/create interface to a remote secret store.
#[async_trait]
pub trait SecretBackend: Send + Sync {
    /// Fetch the fields of `namespace/name`, or `None` if it does not exist.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<BTreeMap<String, Vec<u8>>>>;

    /// Create `namespace/name` with `data`.
    ///
    /// Must fail with [`BootstrapError::RecordAlreadyExists`] if the secret
    /// already exists; never replaces it.
    async fn create(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Result<()>;
}

/// [`SecretStore`] over a [`SecretBackend`], using a single secret field.
pub struct RemoteStore<B> {
    backend: B,
    namespace: String,
    name: String,
}

impl<B: SecretBackend> RemoteStore<B> {
    pub fn new(backend: B, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn location(&self) -> String {
        format!("secret {}/{}", self.namespace, self.name)
    }
}

#[async_trait]
impl<B: SecretBackend> SecretStore for RemoteStore<B> {
    async fn save(&self, result: &InitResult) -> Result<()> {
        let value = serde_json::to_vec(result)?;
        let data = BTreeMap::from([(RECORD_FIELD.to_string(), value)]);

        self.backend.create(&self.namespace, &self.name, data).await?;

        info!(namespace = %self.namespace, name = %self.name, "saved init result to secret");
        Ok(())
    }

    async fn load(&self) -> Result<InitResult> {
        let data = self
            .backend
            .get(&self.namespace, &self.name)
            .await?
            .ok_or_else(|| BootstrapError::RecordNotFound {
                location: self.location(),
            })?;

        let value = data
            .get(RECORD_FIELD)
            .ok_or_else(|| BootstrapError::MalformedRecord {
                location: self.location(),
                reason: format!("missing `{RECORD_FIELD}` field"),
            })?;

        let result =
            serde_json::from_slice(value).map_err(|e| BootstrapError::MalformedRecord {
                location: self.location(),
                reason: e.to_string(),
            })?;

        info!(namespace = %self.namespace, name = %self.name, "loaded init result from secret");
        Ok(result)
    }

    fn describe(&self) -> String {
        self.location()
    }
}
