//! Cross-process exclusion for one store directory.
//!
//! [`PathLocks`](crate::PathLocks) only serializes callers inside one process.
//! A [`DirLease`] is a marker file created with `create_new`, so a second
//! process (the daemon and the `mts` CLI, or two CLI runs) fails fast instead
//! of racing on the same auth files. The marker is removed when the lease is
//! dropped; a crashed holder leaves it behind and it has to be deleted by hand.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

/// Marker file name inside the store root.
pub const LEASE_FILE: &str = ".mts.lock";

#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("{path} is held by '{holder}'; stop that process or remove the file if it is stale")]
    Held { path: PathBuf, holder: String },

    #[error("cannot create lease {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct DirLease {
    path: PathBuf,
}

impl DirLease {
    /// Take the lease on `root`, recording `holder` and this process id.
    pub fn acquire(root: &Path, holder: &str) -> Result<Self, LeaseError> {
        let path = root.join(LEASE_FILE);
        let io = |source: std::io::Error| LeaseError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(root).map_err(io)?;
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                let holder = fs::read_to_string(&path)
                    .map(|s| s.trim().to_string())
                    .unwrap_or_default();
                return Err(LeaseError::Held { path, holder });
            }
            Err(e) => return Err(io(e)),
        };
        writeln!(file, "{holder} pid={}", std::process::id()).map_err(io)?;
        debug!(path = %path.display(), holder, "lease acquired");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLease {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to release lease");
        }
    }
}
