//! mts-store
//!
//! Remote text store contract and the plumbing around one
//! fetch → transform → store cycle:
//!
//! - [`RemoteTextStore`]: whole-file `fetch` / `store` / `remove` by path
//! - [`MemoryTextStore`], [`DirTextStore`]: the two concrete stores
//! - [`PathLocks`]: per-path async mutual exclusion with a bounded wait
//! - [`DirLease`]: marker-file exclusion between processes sharing a directory
//! - [`commit_staged`]: ordered multi-file write with compensating rollback
//!
//! The store never sees partial content: callers compute every replacement
//! text before the first write begins.

mod commit;
mod dir;
mod error;
mod lease;
mod lock;
mod memory;

pub use commit::{commit_staged, CommitError, CommitReport, StagedWrite};
pub use dir::DirTextStore;
pub use error::TransferError;
pub use lease::{DirLease, LeaseError, LEASE_FILE};
pub use lock::{LockError, PathGuard, PathLocks};
pub use memory::MemoryTextStore;

/// Whole-file text storage addressed by path.
#[async_trait::async_trait]
pub trait RemoteTextStore: Send + Sync {
    /// Short label for logs, e.g. `dir:/home/tmp`.
    fn describe(&self) -> String;

    /// Full content of `path`, or [`TransferError::NotFound`].
    async fn fetch(&self, path: &str) -> Result<String, TransferError>;

    /// Replace the full content of `path`.
    async fn store(&self, path: &str, text: &str) -> Result<(), TransferError>;

    /// Delete `path`. Removing an absent path succeeds.
    async fn remove(&self, path: &str) -> Result<(), TransferError>;
}

/// Fetch `path`, mapping `NotFound` to `None` (empty baseline).
pub async fn fetch_baseline(
    store: &dyn RemoteTextStore,
    path: &str,
) -> Result<Option<String>, TransferError> {
    match store.fetch(path).await {
        Ok(text) => Ok(Some(text)),
        Err(TransferError::NotFound { .. }) => {
            tracing::debug!(path, "no existing file; using empty baseline");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
