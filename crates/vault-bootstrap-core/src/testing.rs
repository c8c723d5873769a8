//! In-memory doubles for the vault API and the secret backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use crate::client::VaultApi;
use crate::error::{BootstrapError, Result};
use crate::store::remote::SecretBackend;
use crate::types::{InitRequest, InitResult, UnsealResponse, VaultStatus};

/// Simulated vault that accumulates key shares toward its threshold.
pub(crate) struct ScriptedVault {
    state: Mutex<VaultState>,
}

#[derive(Default)]
struct VaultState {
    initialized: bool,
    sealed: bool,
    threshold: u32,
    shares: u32,
    keys: Vec<String>,
    accepted: Vec<String>,
    status_failures: u32,
    status_attempts: Vec<Instant>,
    init_calls: u32,
    submitted: Vec<String>,
    fail_unseal_after: Option<usize>,
    issued_keys: Option<u32>,
}

impl ScriptedVault {
    /// A vault that has never been initialized.
    pub(crate) fn fresh() -> Self {
        Self::with_state(VaultState {
            sealed: true,
            ..Default::default()
        })
    }

    /// An initialized, sealed vault that accepts `keys` toward `threshold`.
    pub(crate) fn sealed(threshold: u32, keys: &[&str]) -> Self {
        Self::with_state(VaultState {
            initialized: true,
            sealed: true,
            threshold,
            shares: keys.len() as u32,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        })
    }

    /// An initialized vault that is already unsealed.
    pub(crate) fn unsealed() -> Self {
        Self::with_state(VaultState {
            initialized: true,
            sealed: false,
            threshold: 3,
            shares: 5,
            ..Default::default()
        })
    }

    fn with_state(state: VaultState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Fail the next `count` status requests.
    pub(crate) fn failing_status(self, count: u32) -> Self {
        self.state.lock().unwrap().status_failures = count;
        self
    }

    /// Fail every unseal submission after `count` successful ones.
    pub(crate) fn failing_unseal_after(self, count: usize) -> Self {
        self.state.lock().unwrap().fail_unseal_after = Some(count);
        self
    }

    /// Hand back `count` key shares from init, whatever was requested.
    pub(crate) fn issuing_keys(self, count: u32) -> Self {
        self.state.lock().unwrap().issued_keys = Some(count);
        self
    }

    pub(crate) fn status_attempts(&self) -> Vec<Instant> {
        self.state.lock().unwrap().status_attempts.clone()
    }

    pub(crate) fn init_calls(&self) -> u32 {
        self.state.lock().unwrap().init_calls
    }

    pub(crate) fn submitted(&self) -> Vec<String> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.state.lock().unwrap().sealed
    }

    /// Seal the vault again, dropping accepted shares (simulates a restart).
    pub(crate) fn restart(&self) {
        let mut state = self.state.lock().unwrap();
        state.sealed = true;
        state.accepted.clear();
    }
}

#[async_trait]
impl VaultApi for ScriptedVault {
    async fn seal_status(&self) -> Result<VaultStatus> {
        let mut state = self.state.lock().unwrap();
        state.status_attempts.push(Instant::now());

        if state.status_failures > 0 {
            state.status_failures -= 1;
            return Err(BootstrapError::Api {
                status: 503,
                message: "Vault is sealed".into(),
            });
        }

        Ok(VaultStatus {
            initialized: state.initialized,
            sealed: state.sealed,
            threshold: state.threshold,
            shares: state.shares,
            progress: state.accepted.len() as u32,
            cluster_name: state.initialized.then(|| "vault-cluster-test".to_string()),
            version: "1.15.2".into(),
            cluster_id: None,
        })
    }

    async fn init(&self, request: InitRequest) -> Result<InitResult> {
        let mut state = self.state.lock().unwrap();
        state.init_calls += 1;

        if state.initialized {
            return Err(BootstrapError::Api {
                status: 400,
                message: "Vault is already initialized".into(),
            });
        }
        if request.secret_threshold == 0 || request.secret_threshold > request.secret_shares {
            return Err(BootstrapError::Api {
                status: 400,
                message: "invalid seal configuration: threshold must be between 1 and shares"
                    .into(),
            });
        }

        state.initialized = true;
        state.sealed = true;
        state.threshold = request.secret_threshold;
        state.shares = request.secret_shares;
        let issued = state.issued_keys.unwrap_or(request.secret_shares);
        state.keys = (0..issued)
            .map(|i| format!("share-{i}"))
            .collect();

        Ok(InitResult {
            keys: state.keys.clone(),
            root_token: "s.root-token".into(),
        })
    }

    async fn submit_unseal_key(&self, key: &str) -> Result<UnsealResponse> {
        let mut state = self.state.lock().unwrap();

        if let Some(limit) = state.fail_unseal_after {
            if state.submitted.len() >= limit {
                return Err(BootstrapError::Api {
                    status: 500,
                    message: "storage backend unavailable".into(),
                });
            }
        }
        state.submitted.push(key.to_string());

        if !state.keys.iter().any(|k| k == key) {
            return Err(BootstrapError::Api {
                status: 400,
                message: "invalid key".into(),
            });
        }
        if state.sealed && !state.accepted.iter().any(|k| k == key) {
            state.accepted.push(key.to_string());
        }
        if state.accepted.len() as u32 >= state.threshold {
            state.sealed = false;
            state.accepted.clear();
        }

        Ok(UnsealResponse {
            sealed: state.sealed,
            threshold: state.threshold,
            progress: state.accepted.len() as u32,
        })
    }
}

/// Secret backend holding records in a map, with create-only semantics.
///
/// Clones share the same records, like two clients of one cluster.
#[derive(Clone, Default)]
pub(crate) struct MemoryBackend {
    records: Arc<Mutex<HashMap<(String, String), BTreeMap<String, Vec<u8>>>>>,
}

impl MemoryBackend {
    pub(crate) fn insert(&self, namespace: &str, name: &str, data: BTreeMap<String, Vec<u8>>) {
        self.records
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()), data);
    }

    pub(crate) fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl SecretBackend for MemoryBackend {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<BTreeMap<String, Vec<u8>>>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create(
        &self,
        namespace: &str,
        name: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        let key = (namespace.to_string(), name.to_string());
        if records.contains_key(&key) {
            return Err(BootstrapError::RecordAlreadyExists {
                location: format!("secret {namespace}/{name}"),
            });
        }
        records.insert(key, data);
        Ok(())
    }
}
