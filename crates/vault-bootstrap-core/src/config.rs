//! Bootstrap configuration.
//!
//! A [`BootstrapConfig`] is built once at startup and handed to the
//! orchestrator; nothing below it reads flags or the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{BootstrapError, Result};
use crate::status::READINESS_RETRY_INTERVAL;

/// Vault address used when `VAULT_ADDR` is unset.
pub const DEFAULT_VAULT_ADDR: &str = "http://localhost:8200";

/// Default location of the init result file.
pub const DEFAULT_RECORD_PATH: &str = "/tmp/vault-init.json";

/// Immutable settings for one bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    /// Vault base address, without a trailing slash.
    pub vault_addr: String,
    /// Number of key shares to request at initialization.
    pub shares: u32,
    /// Number of shares required to unseal.
    pub threshold: u32,
    /// Delay between readiness attempts.
    pub retry_interval: Duration,
    /// Where the init result is persisted.
    pub persistence: PersistenceConfig,
}

/// Which [`SecretStore`](crate::store::SecretStore) variant to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceConfig {
    /// JSON file on local disk.
    File { output: PathBuf, input: PathBuf },
    /// Field of a Kubernetes secret.
    KubeSecret {
        namespace: String,
        name: String,
        credentials: KubeCredentials,
    },
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self::File {
            output: PathBuf::from(DEFAULT_RECORD_PATH),
            input: PathBuf::from(DEFAULT_RECORD_PATH),
        }
    }
}

/// How to authenticate against the Kubernetes API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KubeCredentials {
    /// Service account token mounted into the pod.
    InCluster,
    /// A kubeconfig file; `None` uses `KUBECONFIG` or `~/.kube/config`.
    Kubeconfig(Option<PathBuf>),
}

impl BootstrapConfig {
    /// Build a configuration, validating and normalizing `vault_addr`.
    ///
    /// The shares/threshold pair is deliberately left to the vault to
    /// validate.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::InvalidAddress`] if `vault_addr` is not an
    /// `http` or `https` URL.
    pub fn new(
        vault_addr: &str,
        shares: u32,
        threshold: u32,
        persistence: PersistenceConfig,
    ) -> Result<Self> {
        Ok(Self {
            vault_addr: normalize_addr(vault_addr)?,
            shares,
            threshold,
            retry_interval: READINESS_RETRY_INTERVAL,
            persistence,
        })
    }

    /// Override the readiness retry interval.
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }
}

fn normalize_addr(addr: &str) -> Result<String> {
    let trimmed = addr.trim().trim_end_matches('/');
    let invalid = |reason: String| BootstrapError::InvalidAddress {
        address: addr.to_string(),
        reason,
    };

    let parsed = url::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme `{other}`"))),
    }
    if parsed.host_str().is_none() {
        return Err(invalid("missing host".into()));
    }

    Ok(trimmed.to_string())
}
