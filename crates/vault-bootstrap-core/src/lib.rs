//! Vault initialization and unseal orchestration.
//!
//! This crate drives a Vault server from "uninitialized/sealed" to
//! "initialized and unsealed" in a single pass, persisting the generated key
//! shares and root token so a later run can unseal the vault again after a
//! restart.
//!
//! # Modules
//!
//! - [`client`]: `reqwest` client for the `sys/seal-status`, `sys/init` and
//!   `sys/unseal` endpoints behind the [`VaultApi`] trait.
//! - [`status`]: blocking readiness wait.
//! - [`init`]: one-shot initialization.
//! - [`store`]: durable storage of the init result (file or Kubernetes secret).
//! - [`unseal`]: sequential key share submission.
//! - [`orchestrator`]: the state machine tying them together.
//! - [`config`]: immutable run configuration.
//! - [`error`]: unified error type.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use vault_bootstrap_core::config::{BootstrapConfig, PersistenceConfig};
//! use vault_bootstrap_core::store::FileStore;
//! use vault_bootstrap_core::{Bootstrapper, VaultClient};
//!
//! # async fn example() -> vault_bootstrap_core::Result<()> {
//! let config = BootstrapConfig::new("http://127.0.0.1:8200", 5, 3, PersistenceConfig::default())?;
//! let client = VaultClient::new(&config.vault_addr)?;
//! let store = FileStore::at("/tmp/vault-init.json");
//!
//! let outcome = Bootstrapper::new(config, Arc::new(client), Arc::new(store))
//!     .run()
//!     .await?;
//! println!("vault {outcome}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod init;
pub mod orchestrator;
pub mod status;
pub mod store;
pub mod types;
pub mod unseal;

#[cfg(test)]
mod testing;

pub use client::{VaultApi, VaultClient};
pub use config::{BootstrapConfig, KubeCredentials, PersistenceConfig};
pub use error::{BootstrapError, Result};
pub use orchestrator::{Bootstrapper, Outcome};
pub use store::SecretStore;
pub use types::{InitResult, VaultStatus};
