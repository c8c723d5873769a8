//! Bootstrap error types.
//!
//! Every fallible operation in this crate surfaces errors through
//! [`BootstrapError`].  The readiness wait swallows these and retries; every
//! other caller treats them as fatal.

/// Unified error type for vault bootstrap operations.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    // -- Vault API errors ---------------------------------------------------
    /// The request never produced a response (connection refused, TLS, etc.)
    /// or the response body could not be read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The vault answered with a non-success status code.
    #[error("vault returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The vault returned a different number of key shares than requested.
    #[error("vault returned {actual} key shares, expected {expected}")]
    UnexpectedKeyCount { expected: usize, actual: usize },

    // -- Configuration errors -----------------------------------------------
    /// The vault address is not a usable http(s) URL.
    #[error("invalid vault address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Kubernetes client configuration could not be loaded.
    #[error("kubernetes configuration error: {reason}")]
    KubeConfig { reason: String },

    // -- Persistence errors -------------------------------------------------
    /// No persisted init result exists at the given location.
    #[error("init result not found: {location}")]
    RecordNotFound { location: String },

    /// An init result is already persisted at the given location.
    #[error("init result already exists: {location}")]
    RecordAlreadyExists { location: String },

    /// The persisted record exists but does not hold a usable init result.
    #[error("malformed init result at {location}: {reason}")]
    MalformedRecord { location: String, reason: String },

    // -- Underlying errors --------------------------------------------------
    /// Kubernetes API error from `kube`.
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error from the filesystem.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the bootstrap crate.
pub type Result<T> = std::result::Result<T, BootstrapError>;
