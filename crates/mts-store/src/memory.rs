use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use crate::{RemoteTextStore, TransferError};

/// In-process store. Used by tests and by `--dry-run` style callers.
///
/// Writes to paths registered with [`MemoryTextStore::fail_writes_to`] fail
/// with [`TransferError::Unavailable`], which lets callers exercise their
/// rollback paths.
#[derive(Debug, Default)]
pub struct MemoryTextStore {
    files: Mutex<BTreeMap<String, String>>,
    failing: Mutex<BTreeSet<String>>,
}

impl MemoryTextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with initial files.
    pub fn with_files<I, P, T>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.files.lock().unwrap_or_else(|e| e.into_inner());
            for (p, t) in files {
                map.insert(p.into(), t.into());
            }
        }
        store
    }

    /// Make every later write to `path` fail.
    pub fn fail_writes_to(&self, path: impl Into<String>) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.into());
    }

    /// Current content of `path` without going through the async trait.
    pub fn get(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
    }

    fn check_writable(&self, path: &str) -> Result<(), TransferError> {
        let failing = self.failing.lock().unwrap_or_else(|e| e.into_inner());
        if failing.contains(path) {
            return Err(TransferError::Unavailable {
                path: path.to_string(),
                message: "injected write failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RemoteTextStore for MemoryTextStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn fetch(&self, path: &str) -> Result<String, TransferError> {
        self.get(path).ok_or_else(|| TransferError::NotFound {
            path: path.to_string(),
        })
    }

    async fn store(&self, path: &str, text: &str) -> Result<(), TransferError> {
        self.check_writable(path)?;
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), TransferError> {
        self.check_writable(path)?;
        self.files
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_missing_is_not_found() {
        let s = MemoryTextStore::new();
        assert!(matches!(
            s.fetch("USERS.aut").await,
            Err(TransferError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn injected_failure_blocks_store_only_for_that_path() {
        let s = MemoryTextStore::new();
        s.fail_writes_to("a");
        assert!(s.store("a", "x").await.is_err());
        s.store("b", "y").await.unwrap();
        assert_eq!(s.get("b").as_deref(), Some("y"));
        assert_eq!(s.get("a"), None);
    }
}
