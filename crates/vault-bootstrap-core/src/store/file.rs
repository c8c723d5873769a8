//! Local file storage for the init result.
//!
//! The record is written as JSON to the output path and read back from the
//! input path.  The two default to the same file but can differ, e.g. when a
//! sidecar mounts the output of an earlier job read-only at another location.
//!
//! The file holds every key share and the root token, so it is created with
//! mode `0640` on Unix (owner read/write, group read).  It is written to a
//! hidden staging file in the same directory and hard-linked into place, so a
//! failed or interrupted save never leaves a partial record behind.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::SecretStore;
use crate::error::{BootstrapError, Result};
use crate::types::InitResult;

/// Unix permission bits applied to the record file.
#[cfg(unix)]
const RECORD_FILE_MODE: u32 = 0o640;

/// Init result stored as a JSON file.
pub struct FileStore {
    /// Where [`save`](SecretStore::save) writes.
    output: PathBuf,
    /// Where [`load`](SecretStore::load) reads.
    input: PathBuf,
}

impl FileStore {
    /// Store that writes to `output` and reads from `input`.
    pub fn new(output: impl Into<PathBuf>, input: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            input: input.into(),
        }
    }

    /// Store that writes and reads the same file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(path.clone(), path)
    }

    /// Sibling file the record is written to before it is linked into place.
    fn staging_path(&self) -> PathBuf {
        let mut name = OsString::from(".");
        name.push(self.output.file_name().unwrap_or_default());
        name.push(format!(".{}.tmp", std::process::id()));
        self.output.with_file_name(name)
    }
}

/// Write `data` to `path` with the record mode and flush it to disk.
async fn write_staged(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(RECORD_FILE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;

    // The process umask may have stripped bits from the requested mode.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(RECORD_FILE_MODE);
        tokio::fs::set_permissions(path, perms).await?;
    }

    Ok(())
}

#[async_trait]
impl SecretStore for FileStore {
    async fn save(&self, result: &InitResult) -> Result<()> {
        let data = serde_json::to_vec(result)?;

        if let Some(parent) = self.output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        // The record only appears under its final name once fully written,
        // and linking fails if a record is already there.
        let staging = self.staging_path();
        let linked = match write_staged(&staging, &data).await {
            Ok(()) => tokio::fs::hard_link(&staging, &self.output)
                .await
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::AlreadyExists {
                        BootstrapError::RecordAlreadyExists {
                            location: self.output.display().to_string(),
                        }
                    } else {
                        BootstrapError::Io(e)
                    }
                }),
            Err(e) => Err(e),
        };

        if let Err(e) = tokio::fs::remove_file(&staging).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %staging.display(), error = %e, "could not remove staging file");
            }
        }
        linked?;

        info!(path = %self.output.display(), "saved init result to file");
        Ok(())
    }

    async fn load(&self) -> Result<InitResult> {
        let data = match tokio::fs::read(&self.input).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BootstrapError::RecordNotFound {
                    location: self.input.display().to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let result = serde_json::from_slice(&data).map_err(|e| BootstrapError::MalformedRecord {
            location: self.input.display().to_string(),
            reason: e.to_string(),
        })?;

        info!(path = %self.input.display(), "loaded init result from file");
        Ok(result)
    }

    fn describe(&self) -> String {
        if self.output == self.input {
            format!("file {}", self.output.display())
        } else {
            format!(
                "file {} (reading from {})",
                self.output.display(),
                self.input.display()
            )
        }
    }
}
