//! Ordered multi-file commit with compensating rollback.
//!
//! The caster's three auth files have no shared commit point. A commit writes
//! them one by one; if write N fails, writes 0..N are undone in reverse order
//! by restoring each file's previous content (or removing it if it did not
//! exist). The failure is always reported, whether or not rollback succeeded.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{RemoteTextStore, TransferError};

/// One file replacement, computed in full before any write begins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedWrite {
    pub path: String,
    /// Content fetched at the start of the cycle; `None` if the file was absent.
    pub previous: Option<String>,
    pub next: String,
}

impl StagedWrite {
    pub fn new(path: impl Into<String>, previous: Option<String>, next: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            previous,
            next: next.into(),
        }
    }

    /// Nothing to write: same text, or an absent file that would stay empty.
    pub fn is_unchanged(&self) -> bool {
        match &self.previous {
            Some(prev) => *prev == self.next,
            None => self.next.is_empty(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("write to {path} failed ({source}); {rolled_back} earlier write(s) rolled back")]
    RolledBack {
        path: String,
        rolled_back: usize,
        #[source]
        source: TransferError,
    },

    #[error("write to {path} failed ({source}); rollback also failed for {failed_rollbacks:?}")]
    RollbackFailed {
        path: String,
        #[source]
        source: TransferError,
        failed_rollbacks: Vec<String>,
    },
}

impl CommitError {
    /// The write failure that aborted the commit.
    pub fn transfer_error(&self) -> &TransferError {
        match self {
            CommitError::RolledBack { source, .. } | CommitError::RollbackFailed { source, .. } => {
                source
            }
        }
    }
}

async fn restore(store: &dyn RemoteTextStore, w: &StagedWrite) -> Result<(), TransferError> {
    match &w.previous {
        Some(prev) => store.store(&w.path, prev).await,
        None => store.remove(&w.path).await,
    }
}

/// Apply `writes` in order, rolling back on the first failure.
pub async fn commit_staged(
    store: &dyn RemoteTextStore,
    writes: &[StagedWrite],
) -> Result<CommitReport, CommitError> {
    let mut report = CommitReport::default();
    let mut applied: Vec<&StagedWrite> = Vec::new();

    for w in writes {
        if w.is_unchanged() {
            report.skipped.push(w.path.clone());
            continue;
        }

        if let Err(source) = store.store(&w.path, &w.next).await {
            error!(path = %w.path, error = %source, "staged write failed; rolling back");

            let mut failed_rollbacks = Vec::new();
            for done in applied.iter().rev() {
                if let Err(e) = restore(store, done).await {
                    warn!(path = %done.path, error = %e, "rollback write failed");
                    failed_rollbacks.push(done.path.clone());
                }
            }

            return Err(if failed_rollbacks.is_empty() {
                CommitError::RolledBack {
                    path: w.path.clone(),
                    rolled_back: applied.len(),
                    source,
                }
            } else {
                CommitError::RollbackFailed {
                    path: w.path.clone(),
                    source,
                    failed_rollbacks,
                }
            });
        }

        applied.push(w);
        report.written.push(w.path.clone());
    }

    info!(written = ?report.written, skipped = ?report.skipped, store = %store.describe(), "commit complete");
    Ok(report)
}
