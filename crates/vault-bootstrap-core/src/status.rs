//! Readiness wait on `GET /v1/sys/seal-status`.

use std::time::Duration;

use tracing::{info, warn};

use crate::client::VaultApi;
use crate::types::VaultStatus;

/// Interval between readiness attempts.
pub const READINESS_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Poll the vault until it returns a status document.
///
/// Every failure (unreachable, non-2xx, unparseable body) is logged and
/// retried after `retry_interval`, forever.  This is a precondition wait, not
/// a fallible operation: the only way out without a status is dropping the
/// future.
pub async fn wait_until_ready(api: &dyn VaultApi, retry_interval: Duration) -> VaultStatus {
    let mut attempt: u64 = 0;

    loop {
        attempt += 1;
        match api.seal_status().await {
            Ok(status) => {
                info!(
                    attempt,
                    initialized = status.initialized,
                    sealed = status.sealed,
                    version = %status.version,
                    cluster_name = status.cluster_name.as_deref().unwrap_or("-"),
                    "vault is reachable"
                );
                return status;
            }
            Err(e) => {
                warn!(attempt, error = %e, "vault is not ready yet");
                tokio::time::sleep(retry_interval).await;
            }
        }
    }
}
