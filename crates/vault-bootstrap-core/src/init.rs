//! One-shot vault initialization.

use tracing::info;

use crate::client::VaultApi;
use crate::error::{BootstrapError, Result};
use crate::types::{InitRequest, InitResult};

/// Initialize the vault with `shares` key shares and an unseal `threshold`.
///
/// Only call this when the last observed status reported the vault as not
/// initialized.  The shares/threshold pair is not checked here; the vault
/// rejects invalid combinations.  Two racing callers both reach the vault and
/// only one of them succeeds.
///
/// The result is returned as issued.  Once this succeeds the shares exist
/// nowhere else, so callers persist them before calling [`check_key_count`].
///
/// # Errors
///
/// Returns the client error for transport or API failures.
pub async fn initialize(api: &dyn VaultApi, shares: u32, threshold: u32) -> Result<InitResult> {
    info!(shares, threshold, "initializing vault");

    let result = api
        .init(InitRequest {
            secret_shares: shares,
            secret_threshold: threshold,
        })
        .await?;

    info!(keys = result.keys.len(), "vault initialized");
    Ok(result)
}

/// Reject an init result that does not carry exactly `shares` key shares.
pub fn check_key_count(result: &InitResult, shares: u32) -> Result<()> {
    if result.keys.len() != shares as usize {
        return Err(BootstrapError::UnexpectedKeyCount {
            expected: shares as usize,
            actual: result.keys.len(),
        });
    }
    Ok(())
}
