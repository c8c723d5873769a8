//! CLI argument definitions for vault-bootstrap.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! wiring the run together.

use std::path::PathBuf;

use clap::Parser;
use vault_bootstrap_core::config::{
    BootstrapConfig, DEFAULT_RECORD_PATH, KubeCredentials, PersistenceConfig,
};

/// vault-bootstrap -- initialize and unseal a Vault server.
#[derive(Debug, Parser)]
#[command(
    name = "vault-bootstrap",
    version,
    about = "Initialize and unseal a Vault server",
    long_about = "Waits for the Vault server at $VAULT_ADDR to answer, initializes it if needed, \
                  stores the key shares and root token, then unseals it with the stored shares."
)]
pub struct Cli {
    /// Number of key shares to generate.
    #[arg(long, default_value_t = 5)]
    pub secret_shares: u32,

    /// Number of key shares required to unseal the vault.
    #[arg(long, default_value_t = 3)]
    pub secret_threshold: u32,

    /// File the key shares and root token are written to.
    #[arg(long, default_value = DEFAULT_RECORD_PATH)]
    pub output: PathBuf,

    /// File the key shares are read from when unsealing.
    #[arg(long, default_value = DEFAULT_RECORD_PATH)]
    pub input: PathBuf,

    /// Store the key shares in a Kubernetes secret instead of a file.
    #[arg(long = "k8s-secret")]
    pub k8s_secret: bool,

    /// Use the pod's service account instead of a kubeconfig.
    #[arg(long = "k8s-in-cluster")]
    pub k8s_in_cluster: bool,

    /// Namespace of the Kubernetes secret.
    #[arg(long = "k8s-ns", default_value = "default")]
    pub k8s_namespace: String,

    /// Name of the Kubernetes secret.
    #[arg(long = "k8s-secret-name", default_value = "vault-unseal")]
    pub k8s_secret_name: String,

    /// Kubeconfig to use outside the cluster (defaults to $KUBECONFIG or ~/.kube/config).
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,
}

impl Cli {
    /// Which persistence variant the flags select.
    pub fn persistence(&self) -> PersistenceConfig {
        if !self.k8s_secret {
            return PersistenceConfig::File {
                output: self.output.clone(),
                input: self.input.clone(),
            };
        }

        let credentials = if self.k8s_in_cluster {
            KubeCredentials::InCluster
        } else {
            KubeCredentials::Kubeconfig(self.kubeconfig.clone())
        };

        PersistenceConfig::KubeSecret {
            namespace: self.k8s_namespace.clone(),
            name: self.k8s_secret_name.clone(),
            credentials,
        }
    }

    /// Combine the flags with the vault address into a run configuration.
    pub fn to_config(&self, vault_addr: &str) -> vault_bootstrap_core::Result<BootstrapConfig> {
        BootstrapConfig::new(
            vault_addr,
            self.secret_shares,
            self.secret_threshold,
            self.persistence(),
        )
    }
}
