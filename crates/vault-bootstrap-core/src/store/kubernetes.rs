//! Kubernetes `Secret` backend for [`RemoteStore`](super::RemoteStore).

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ObjectMeta, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::{debug, info};

use super::remote::SecretBackend;
use crate::config::KubeCredentials;
use crate::error::{BootstrapError, Result};

/// Value of the `app.kubernetes.io/managed-by` label on created secrets.
const MANAGED_BY: &str = "vault-bootstrap";

/// Secrets accessed through the Kubernetes API.
#[derive(Clone)]
pub struct KubeSecrets {
    client: Client,
}

impl KubeSecrets {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the given credential source.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::KubeConfig`] if the service account or
    /// kubeconfig cannot be loaded.
    pub async fn connect(credentials: &KubeCredentials) -> Result<Self> {
        let config = match credentials {
            KubeCredentials::InCluster => {
                info!("using in-cluster kubernetes credentials");
                Config::incluster().map_err(|e| BootstrapError::KubeConfig {
                    reason: format!("failed to load in-cluster config: {e}"),
                })?
            }
            KubeCredentials::Kubeconfig(Some(path)) => {
                info!(path = %path.display(), "using kubeconfig");
                from_kubeconfig_file(path).await?
            }
            KubeCredentials::Kubeconfig(None) => {
                info!("using default kubeconfig");
                Config::from_kubeconfig(&KubeConfigOptions::default())
                    .await
                    .map_err(|e| BootstrapError::KubeConfig {
                        reason: format!("failed to load kubeconfig: {e}"),
                    })?
            }
        };

        let client = Client::try_from(config).map_err(|e| BootstrapError::KubeConfig {
            reason: format!("failed to create client: {e}"),
        })?;

        Ok(Self::new(client))
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

async fn from_kubeconfig_file(path: &Path) -> Result<Config> {
    let kubeconfig = Kubeconfig::read_from(path).map_err(|e| BootstrapError::KubeConfig {
        reason: format!("failed to read kubeconfig {}: {e}", path.display()),
    })?;

    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
        .await
        .map_err(|e| BootstrapError::KubeConfig {
            reason: format!("failed to load kubeconfig {}: {e}", path.display()),
        })
}

#[async_trait]
impl SecretBackend for KubeSecrets {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<BTreeMap<String, Vec<u8>>>> {
        debug!(namespace, name, "fetching secret");

        let secret = match self.api(namespace).get(name).await {
            Ok(secret) => secret,
            Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(secret_fields(secret)))
    }

    async fn create(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Result<()> {
        let secret = build_secret(namespace, name, data);

        match self.api(namespace).create(&PostParams::default(), &secret).await {
            Ok(_) => {
                info!(namespace, name, "created secret");
                Ok(())
            }
            Err(kube::Error::Api(ae)) if ae.code == 409 => Err(BootstrapError::RecordAlreadyExists {
                location: format!("secret {namespace}/{name}"),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn build_secret(namespace: &str, name: &str, data: BTreeMap<String, Vec<u8>>) -> Secret {
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(
                [(
                    "app.kubernetes.io/managed-by".to_string(),
                    MANAGED_BY.to_string(),
                )]
                .into(),
            ),
            ..Default::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(
            data.into_iter()
                .map(|(field, bytes)| (field, ByteString(bytes)))
                .collect(),
        ),
        ..Default::default()
    }
}

/// Flatten `data` and `stringData` into raw bytes, `data` taking precedence.
fn secret_fields(secret: Secret) -> BTreeMap<String, Vec<u8>> {
    let mut fields: BTreeMap<String, Vec<u8>> = secret
        .string_data
        .unwrap_or_default()
        .into_iter()
        .map(|(field, text)| (field, text.into_bytes()))
        .collect();

    fields.extend(
        secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(field, bytes)| (field, bytes.0)),
    );
    fields
}
