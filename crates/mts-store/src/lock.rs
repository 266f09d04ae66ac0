//! Per-path mutual exclusion around fetch → transform → store cycles.
//!
//! One async mutex per store path, created on first use and kept for the
//! process lifetime. Multi-path acquisitions lock in sorted order so two
//! callers asking for overlapping sets can never deadlock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("timed out after {waited_ms}ms waiting for lock on {paths:?}")]
    Timeout { paths: Vec<String>, waited_ms: u64 },
}

/// Registry of named locks keyed by store path.
#[derive(Clone, Default)]
pub struct PathLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Holds every requested path lock; dropping it releases them all.
pub struct PathGuard {
    paths: Vec<String>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl PathGuard {
    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

impl std::fmt::Debug for PathGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathGuard").field("paths", &self.paths).finish()
    }
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self, paths: &[String]) -> Vec<Arc<AsyncMutex<()>>> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        paths
            .iter()
            .map(|p| Arc::clone(map.entry(p.clone()).or_default()))
            .collect()
    }

    /// Lock every path in `paths`, waiting at most `timeout` in total.
    pub async fn acquire(&self, paths: &[&str], timeout: Duration) -> Result<PathGuard, LockError> {
        let mut sorted: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        sorted.sort();
        sorted.dedup();

        let handles = self.handles(&sorted);
        let started = Instant::now();
        let lock_all = async move {
            let mut guards = Vec::with_capacity(handles.len());
            for h in handles {
                guards.push(h.lock_owned().await);
            }
            guards
        };

        match tokio::time::timeout(timeout, lock_all).await {
            Ok(guards) => {
                let waited_ms = started.elapsed().as_millis() as u64;
                debug!(paths = ?sorted, waited_ms, "path locks acquired");
                Ok(PathGuard {
                    paths: sorted,
                    _guards: guards,
                })
            }
            Err(_) => {
                let waited_ms = started.elapsed().as_millis() as u64;
                warn!(paths = ?sorted, waited_ms, "path lock wait timed out");
                Err(LockError::Timeout {
                    paths: sorted,
                    waited_ms,
                })
            }
        }
    }
}
