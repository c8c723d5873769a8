//! Vault wire types shared by the client, the components and the stores.

use serde::{Deserialize, Serialize};

/// Snapshot of `GET /v1/sys/seal-status`.
///
/// Only `initialized` and `sealed` are required; a body without them is
/// treated as malformed and retried by the readiness wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultStatus {
    pub initialized: bool,
    pub sealed: bool,
    /// Number of shares required to unseal.
    #[serde(rename = "t", default)]
    pub threshold: u32,
    /// Total number of shares issued at initialization.
    #[serde(rename = "n", default)]
    pub shares: u32,
    /// Shares accepted so far toward the threshold.
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub cluster_id: Option<String>,
}

/// Body of `PUT /v1/sys/init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    pub secret_shares: u32,
    pub secret_threshold: u32,
}

/// Key shares and root token produced by a successful initialization.
///
/// This is the only value that gets persisted.  The serialized form is
/// `{"keys": [...], "root_token": "..."}`; unknown fields returned by the
/// vault (`keys_base64`, ...) are dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResult {
    /// Unseal key shares, in the order the vault returned them.
    pub keys: Vec<String>,
    pub root_token: String,
}

impl std::fmt::Debug for InitResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitResult")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field("root_token", &"<redacted>")
            .finish()
    }
}

/// Body of `PUT /v1/sys/unseal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsealRequest {
    pub key: String,
}

/// Response of `PUT /v1/sys/unseal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsealResponse {
    pub sealed: bool,
    #[serde(rename = "t", default)]
    pub threshold: u32,
    #[serde(default)]
    pub progress: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_vault_document() {
        let body = r#"{
            "type": "shamir",
            "initialized": true,
            "sealed": true,
            "t": 3,
            "n": 5,
            "progress": 1,
            "nonce": "",
            "version": "1.15.2",
            "migration": false,
            "cluster_name": "vault-cluster-1",
            "cluster_id": "2b1e7c3a",
            "recovery_seal": false,
            "storage_type": "raft"
        }"#;

        let status: VaultStatus = serde_json::from_str(body).unwrap();
        assert!(status.initialized);
        assert!(status.sealed);
        assert_eq!(status.threshold, 3);
        assert_eq!(status.shares, 5);
        assert_eq!(status.progress, 1);
        assert_eq!(status.cluster_name.as_deref(), Some("vault-cluster-1"));
        assert_eq!(status.version, "1.15.2");
    }

    #[test]
    fn uninitialized_status_without_metadata_parses() {
        let status: VaultStatus =
            serde_json::from_str(r#"{"initialized": false, "sealed": true}"#).unwrap();
        assert!(!status.initialized);
        assert_eq!(status.threshold, 0);
        assert!(status.cluster_id.is_none());
    }

    #[test]
    fn status_without_flags_is_rejected() {
        assert!(serde_json::from_str::<VaultStatus>("{}").is_err());
        assert!(serde_json::from_str::<VaultStatus>("<html>bad gateway</html>").is_err());
    }

    #[test]
    fn init_result_drops_extra_fields() {
        let body = r#"{"keys": ["a", "b"], "keys_base64": ["YQ==", "Yg=="], "root_token": "s.root"}"#;
        let result: InitResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.keys, vec!["a", "b"]);

        let persisted = serde_json::to_value(&result).unwrap();
        assert_eq!(
            persisted,
            serde_json::json!({ "keys": ["a", "b"], "root_token": "s.root" })
        );
    }

    #[test]
    fn init_result_debug_redacts_secrets() {
        let result = InitResult {
            keys: vec!["share-one".into(), "share-two".into()],
            root_token: "s.supersecret".into(),
        };
        let rendered = format!("{result:?}");
        assert!(!rendered.contains("share-one"));
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("2 redacted"));
    }
}
