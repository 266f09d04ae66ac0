//! Shared runtime state for mts-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. Everything here is
//! either immutable after startup or guarded by its own lock.

use std::path::Path;
use std::sync::{Arc, Mutex};

use mts_audit::{AuditWriter, Outcome};
use mts_config::MountSyncConfig;
use mts_store::{PathLocks, RemoteTextStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::credentials::{CredentialGenerator, UuidCredentialGenerator};
use crate::notify::Notifier;

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            service: "mts-daemon",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub config: Arc<MountSyncConfig>,
    /// Hash of the loaded config layers; empty when built from defaults.
    pub config_hash: String,
    pub store: Arc<dyn RemoteTextStore>,
    /// Serializes fetch → transform → store cycles per auth file.
    pub locks: PathLocks,
    pub credentials: Arc<dyn CredentialGenerator>,
    audit: Option<Arc<Mutex<AuditWriter>>>,
    notifier: Option<Notifier>,
}

impl AppState {
    pub fn new(config: MountSyncConfig, store: Arc<dyn RemoteTextStore>) -> Self {
        Self {
            build: BuildInfo::current(),
            config: Arc::new(config),
            config_hash: String::new(),
            store,
            locks: PathLocks::new(),
            credentials: Arc::new(UuidCredentialGenerator),
            audit: None,
            notifier: None,
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = hash.into();
        self
    }

    pub fn with_credentials(mut self, generator: Arc<dyn CredentialGenerator>) -> Self {
        self.credentials = generator;
        self
    }

    pub fn with_audit(mut self, writer: AuditWriter) -> Self {
        self.audit = Some(Arc::new(Mutex::new(writer)));
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Open (or continue) the audit log named by `audit.path`, if any.
    pub fn with_configured_audit(self) -> anyhow::Result<Self> {
        match self.config.audit.path.clone() {
            Some(path) => {
                let writer = AuditWriter::open(Path::new(&path), self.config.audit.hash_chain)?;
                Ok(self.with_audit(writer))
            }
            None => Ok(self),
        }
    }

    pub fn users_path(&self) -> &str {
        &self.config.store.users_file
    }

    pub fn groups_path(&self) -> &str {
        &self.config.store.groups_file
    }

    pub fn mounts_path(&self) -> &str {
        &self.config.store.mounts_file
    }

    /// Append an audit record. Failures are logged and otherwise ignored;
    /// the caster files are the source of truth, not the audit trail.
    pub fn record_audit(&self, request_id: Uuid, operation: &str, outcome: Outcome, payload: Value) {
        let Some(audit) = &self.audit else {
            return;
        };
        let mut writer = audit.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = writer.append(request_id, operation, outcome, payload) {
            warn!(%request_id, operation, ?outcome, error = %err, "audit append failed");
        }
    }

    /// Best-effort operator notification; never fails the request.
    pub async fn notify(&self, level: &str, source: &str, message: String) {
        if let Some(n) = &self.notifier {
            n.send(level, source, &message).await;
        }
    }
}
