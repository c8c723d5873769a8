//! Sequential submission of key shares to `PUT /v1/sys/unseal`.
//!
//! The vault accumulates valid shares toward its threshold on its own side,
//! so the caller simply feeds keys in order until the vault reports
//! `sealed == false`.  A call that fails midway is not resumed; the next call
//! starts over from the first key and relies on the vault accepting shares it
//! has already seen.

use tracing::{debug, info, warn};

use crate::client::VaultApi;
use crate::error::Result;

/// Submit `keys` one at a time until the vault unseals.
///
/// Returns `Ok(true)` as soon as the vault reports it is unsealed, without
/// submitting the remaining keys.  Returns `Ok(false)` if every key was
/// submitted and the vault is still sealed, or if `keys` is empty.
///
/// # Errors
///
/// Any transport, API or decoding error aborts the whole call.
pub async fn unseal(api: &dyn VaultApi, keys: &[String]) -> Result<bool> {
    if keys.is_empty() {
        warn!("no key shares available to unseal the vault");
        return Ok(false);
    }

    for (index, key) in keys.iter().enumerate() {
        let response = api.submit_unseal_key(key).await?;
        debug!(
            share = index + 1,
            progress = response.progress,
            threshold = response.threshold,
            sealed = response.sealed,
            "submitted key share"
        );

        if !response.sealed {
            info!(shares_used = index + 1, "vault unsealed");
            return Ok(true);
        }
    }

    warn!(shares_submitted = keys.len(), "vault still sealed after all key shares");
    Ok(false)
}
