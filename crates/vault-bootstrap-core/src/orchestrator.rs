//! The bootstrap state machine.
//!
//! ```text
//! WaitingReady -> CheckInit -> [Initializing -> Persisting] -> CheckSeal -> [Unsealing] -> Done
//! ```
//!
//! Any error returned from a phase ends the run.  Nothing is rolled back: if
//! the vault was initialized but its shares could not be persisted, the
//! operator has to recover by hand.  An init result with the wrong number of
//! key shares is still saved before the run fails on it.

use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::client::VaultApi;
use crate::config::BootstrapConfig;
use crate::error::Result;
use crate::init::{check_key_count, initialize};
use crate::status::wait_until_ready;
use crate::store::SecretStore;
use crate::types::{InitResult, VaultStatus};
use crate::unseal::unseal;

/// How a run that did not hit a fatal error ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The vault was sealed and the persisted shares unsealed it.
    Unsealed,
    /// The vault was already unsealed when first observed.
    AlreadyUnsealed,
    /// Every persisted share was submitted and the vault is still sealed.
    StillSealed,
}

impl Outcome {
    /// Whether the process should exit successfully.
    pub fn is_success(self) -> bool {
        !matches!(self, Self::StillSealed)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsealed => write!(f, "unsealed"),
            Self::AlreadyUnsealed => write!(f, "already unsealed"),
            Self::StillSealed => write!(f, "still sealed"),
        }
    }
}

/// States of a run before it is done.  Each carries what the next phase
/// needs.
enum Phase {
    WaitingReady,
    CheckInit(VaultStatus),
    Initializing(VaultStatus),
    Persisting {
        status: VaultStatus,
        result: InitResult,
    },
    CheckSeal(VaultStatus),
    Unsealing,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Self::WaitingReady => "waiting_ready",
            Self::CheckInit(_) => "check_init",
            Self::Initializing(_) => "initializing",
            Self::Persisting { .. } => "persisting",
            Self::CheckSeal(_) => "check_seal",
            Self::Unsealing => "unsealing",
        }
    }
}

/// Drives a vault from uninitialized/sealed to initialized and unsealed.
pub struct Bootstrapper {
    config: BootstrapConfig,
    api: Arc<dyn VaultApi>,
    store: Arc<dyn SecretStore>,
}

impl Bootstrapper {
    pub fn new(config: BootstrapConfig, api: Arc<dyn VaultApi>, store: Arc<dyn SecretStore>) -> Self {
        Self { config, api, store }
    }

    /// Run the whole sequence once.
    ///
    /// Blocks until the vault answers its status endpoint, then initializes
    /// and/or unseals it as needed.
    ///
    /// # Errors
    ///
    /// Initialization, persistence and unseal transport failures are fatal
    /// and returned as-is.  A vault that stays sealed after every share was
    /// submitted is not an error; it is reported as [`Outcome::StillSealed`].
    pub async fn run(&self) -> Result<Outcome> {
        let mut phase = Phase::WaitingReady;

        loop {
            debug!(phase = phase.name(), "entering phase");
            phase = match self.step(phase).await? {
                ControlFlow::Continue(next) => next,
                ControlFlow::Break(outcome) => return Ok(outcome),
            };
        }
    }

    async fn step(&self, phase: Phase) -> Result<ControlFlow<Outcome, Phase>> {
        let next = match phase {
            Phase::WaitingReady => {
                info!(addr = %self.config.vault_addr, "waiting for vault to be ready");
                let status = wait_until_ready(self.api.as_ref(), self.config.retry_interval).await;
                info!(
                    sealed = status.sealed,
                    initialized = status.initialized,
                    "observed vault status"
                );
                Phase::CheckInit(status)
            }

            Phase::CheckInit(status) => {
                if status.initialized {
                    info!("vault is already initialized");
                    Phase::CheckSeal(status)
                } else {
                    Phase::Initializing(status)
                }
            }

            Phase::Initializing(status) => {
                let result = initialize(self.api.as_ref(), self.config.shares, self.config.threshold)
                    .await
                    .inspect_err(|e| error!(error = %e, "could not initialize vault"))?;
                Phase::Persisting { status, result }
            }

            Phase::Persisting { status, result } => {
                self.store.save(&result).await.inspect_err(|e| {
                    error!(
                        error = %e,
                        store = %self.store.describe(),
                        "vault is initialized but its key shares could not be saved"
                    )
                })?;
                check_key_count(&result, self.config.shares).inspect_err(|e| {
                    error!(error = %e, "vault issued an unexpected number of key shares")
                })?;
                Phase::CheckSeal(status)
            }

            // Uses the snapshot taken before initialization; a freshly
            // initialized vault is assumed to be sealed.
            Phase::CheckSeal(status) => {
                if status.sealed {
                    Phase::Unsealing
                } else {
                    info!("vault is already unsealed");
                    return Ok(ControlFlow::Break(Outcome::AlreadyUnsealed));
                }
            }

            // Always reload, even right after a save in the same run.
            Phase::Unsealing => {
                info!(store = %self.store.describe(), "unsealing vault");
                let result = self
                    .store
                    .load()
                    .await
                    .inspect_err(|e| error!(error = %e, "could not load init result"))?;

                let unsealed = unseal(self.api.as_ref(), &result.keys)
                    .await
                    .inspect_err(|e| error!(error = %e, "could not unseal vault"))?;

                let outcome = if unsealed {
                    Outcome::Unsealed
                } else {
                    Outcome::StillSealed
                };
                return Ok(ControlFlow::Break(outcome));
            }
        };

        Ok(ControlFlow::Continue(next))
    }
}
