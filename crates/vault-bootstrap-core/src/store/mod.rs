//! Durable storage for the init result.
//!
//! The key shares and root token only exist once, in the response to
//! `PUT /v1/sys/init`.  A [`SecretStore`] keeps them so a later run can
//! unseal the vault again.  Two variants exist:
//!
//! - [`FileStore`]: a JSON file on local disk with mode `0640`.
//! - [`RemoteStore`]: a single field of a namespaced key-value secret, backed
//!   in production by a Kubernetes `Secret` ([`KubeSecrets`]).
//!
//! Both are create-only: saving over an existing record fails instead of
//! replacing previously issued shares.

pub mod file;
pub mod kubernetes;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::PersistenceConfig;
use crate::error::Result;
use crate::types::InitResult;

pub use file::FileStore;
pub use kubernetes::KubeSecrets;
pub use remote::{RemoteStore, SecretBackend};

/// Save/load capability for the init result.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Persist a fresh init result.
    ///
    /// Returns [`BootstrapError::RecordAlreadyExists`] if a record is already
    /// present.
    ///
    /// [`BootstrapError::RecordAlreadyExists`]: crate::error::BootstrapError::RecordAlreadyExists
    async fn save(&self, result: &InitResult) -> Result<()>;

    /// Read back a persisted init result.
    ///
    /// Returns [`BootstrapError::RecordNotFound`] if nothing was saved.
    ///
    /// [`BootstrapError::RecordNotFound`]: crate::error::BootstrapError::RecordNotFound
    async fn load(&self) -> Result<InitResult>;

    /// Human-readable location of the record, for logging.
    fn describe(&self) -> String;
}

/// Construct the store selected by `config`.
///
/// For the Kubernetes variant this builds the API client, which can fail
/// when no credentials are available.
pub async fn open(config: &PersistenceConfig) -> Result<Arc<dyn SecretStore>> {
    let store: Arc<dyn SecretStore> = match config {
        PersistenceConfig::File { output, input } => {
            Arc::new(FileStore::new(output.clone(), input.clone()))
        }
        PersistenceConfig::KubeSecret {
            namespace,
            name,
            credentials,
        } => {
            let backend = KubeSecrets::connect(credentials).await?;
            Arc::new(RemoteStore::new(backend, namespace.clone(), name.clone()))
        }
    };

    tracing::info!(store = %store.describe(), "persistence configured");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_config_opens_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault-init.json");
        let config = PersistenceConfig::File {
            output: path.clone(),
            input: path.clone(),
        };

        let store = open(&config).await.unwrap();
        assert_eq!(store.describe(), format!("file {}", path.display()));

        let result = InitResult {
            keys: vec!["a".into(), "b".into()],
            root_token: "s.root".into(),
        };
        store.save(&result).await.unwrap();
        assert_eq!(store.load().await.unwrap(), result);
    }

    #[tokio::test]
    async fn unreadable_kubeconfig_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let config = PersistenceConfig::KubeSecret {
            namespace: "default".into(),
            name: "vault-unseal".into(),
            credentials: crate::config::KubeCredentials::Kubeconfig(Some(
                dir.path().join("missing-kubeconfig"),
            )),
        };

        let err = open(&config).await.err().unwrap();
        assert!(matches!(err, crate::error::BootstrapError::KubeConfig { .. }));
    }
}
