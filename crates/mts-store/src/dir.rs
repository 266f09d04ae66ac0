use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::{DirLease, LeaseError, RemoteTextStore, TransferError};

/// Store backed by a directory, e.g. the caster's auth directory mounted on
/// this host.
///
/// Store paths are resolved under `root`; a leading `/` is tolerated, `..`
/// components are rejected. Writes go to a temp file in the same directory
/// followed by a rename, so readers see either the old or the new file.
#[derive(Debug, Clone)]
pub struct DirTextStore {
    root: PathBuf,
}

impl DirTextStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Exclusive use of this directory across processes; see [`DirLease`].
    pub fn lease(&self, holder: &str) -> Result<DirLease, LeaseError> {
        DirLease::acquire(&self.root, holder)
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, TransferError> {
        let rel = Path::new(path.trim_start_matches('/'));
        if rel.as_os_str().is_empty() {
            return Err(TransferError::InvalidPath {
                path: path.to_string(),
                reason: "empty path",
            });
        }
        for c in rel.components() {
            match c {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(TransferError::InvalidPath {
                        path: path.to_string(),
                        reason: "path must stay under the store root",
                    })
                }
            }
        }
        Ok(self.root.join(rel))
    }
}

fn io_err(path: &str, source: std::io::Error) -> TransferError {
    TransferError::Io {
        path: path.to_string(),
        source,
    }
}

#[async_trait::async_trait]
impl RemoteTextStore for DirTextStore {
    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }

    async fn fetch(&self, path: &str) -> Result<String, TransferError> {
        let full = self.resolve(path)?;
        match tokio::fs::read_to_string(&full).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(TransferError::NotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(io_err(path, e)),
        }
    }

    async fn store(&self, path: &str, text: &str) -> Result<(), TransferError> {
        let full = self.resolve(path)?;
        let parent = full.parent().unwrap_or(&self.root).to_path_buf();
        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| io_err(path, e))?;

        let file_name = full
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = parent.join(format!(".{}.tmp-{}", file_name, Uuid::new_v4().as_simple()));

        tokio::fs::write(&tmp, text.as_bytes())
            .await
            .map_err(|e| io_err(path, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &full).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(path, e));
        }
        debug!(path, bytes = text.len(), "stored");
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), TransferError> {
        let full = self.resolve(path)?;
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_escape_and_tolerates_leading_slash() {
        let s = DirTextStore::new("/srv/auth");
        assert_eq!(
            s.resolve("/USERS.aut").unwrap(),
            PathBuf::from("/srv/auth/USERS.aut")
        );
        assert!(s.resolve("../etc/passwd").is_err());
        assert!(s.resolve("a/../../b").is_err());
        assert!(s.resolve("/").is_err());
    }
}
