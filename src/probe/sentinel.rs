//! Sentinel marker files
//!
//! Zero-byte files whose existence tells an external watcher that a phase
//! has completed. Stale markers from a previous run are removed at startup.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::SentinelPaths;

/// Errors that can occur while managing sentinel files
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("failed to remove sentinel file {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create sentinel file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Remove every configured marker. A marker that does not exist is fine.
pub async fn reset(paths: &SentinelPaths) -> Result<(), SentinelError> {
    for path in paths.all() {
        match tokio::fs::remove_file(path).await {
            Ok(()) => info!(path = %path.display(), "Removed stale sentinel file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SentinelError::Remove {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
    Ok(())
}

/// Create (or truncate) a zero-byte marker
pub async fn signal(path: &Path) -> Result<(), SentinelError> {
    tokio::fs::File::create(path)
        .await
        .map_err(|source| SentinelError::Create {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), "Created sentinel file");
    Ok(())
}
