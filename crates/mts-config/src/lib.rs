//! mts-config
//!
//! Layered YAML configuration for mountsync.
//!
//! - Documents merge in order: earlier docs are base, later docs override.
//! - Secrets are never config values. YAML stores env var NAMES only; a leaf
//!   that carries a webhook URL, a token, a password embedded in a URL, or a
//!   literal under a secret-named key aborts with `CONFIG_SECRET_DETECTED`.
//! - The merged document is hashed (SHA-256 over canonical JSON) so a running
//!   daemon can report exactly which configuration it was started with.
//! - The typed [`MountSyncConfig`] is built once at process start and passed
//!   by reference; nothing downstream reads ambient process state.

mod layers;
mod secret_guard;
pub mod secrets;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub use layers::{load_layered_yaml, load_layered_yaml_from_strings, LoadedConfig};
pub use secrets::{resolve_secrets, ResolvedSecrets};

// ---------------------------------------------------------------------------
// Typed configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub bind_addr: String,
    /// Prefix every HTTP route is mounted under.
    pub base_path: String,
    /// Browser origins allowed to call the API. Empty disables CORS; the CRM
    /// calls server to server.
    pub cors_origins: Vec<String>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3456".to_string(),
            base_path: "/v1".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding the caster's auth files.
    pub root: String,
    pub users_file: String,
    pub groups_file: String,
    pub mounts_file: String,
    /// Upper bound on waiting for the per-file locks of one operation.
    pub lock_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: "/home/tmp".to_string(),
            users_file: "USERS.aut".to_string(),
            groups_file: "GROUPS.aut".to_string(),
            mounts_file: "clientmounts.aut".to_string(),
            lock_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// JSONL audit log path; `None` disables the audit trail.
    pub path: Option<String>,
    pub hash_chain: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: None,
            hash_chain: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// NAME of the env var holding the notification webhook URL.
    pub webhook_url_env: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MountSyncConfig {
    pub daemon: DaemonConfig,
    pub store: StoreConfig,
    pub audit: AuditConfig,
    pub notify: NotifyConfig,
}

impl MountSyncConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.daemon
            .bind_addr
            .parse()
            .with_context(|| format!("invalid daemon.bind_addr '{}'", self.daemon.bind_addr))
    }

    fn validate(&self) -> Result<()> {
        let s = &self.store;
        for (key, v) in [
            ("store.root", &s.root),
            ("store.users_file", &s.users_file),
            ("store.groups_file", &s.groups_file),
            ("store.mounts_file", &s.mounts_file),
        ] {
            if v.trim().is_empty() {
                bail!("CONFIG_INVALID: {key} must not be empty");
            }
        }
        if s.users_file == s.groups_file
            || s.users_file == s.mounts_file
            || s.groups_file == s.mounts_file
        {
            bail!("CONFIG_INVALID: store users/groups/mounts files must be distinct");
        }
        if s.lock_timeout_ms == 0 {
            bail!("CONFIG_INVALID: store.lock_timeout_ms must be > 0");
        }
        if let Some(bad) = self
            .daemon
            .cors_origins
            .iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        {
            bail!("CONFIG_INVALID: daemon.cors_origins entry '{bad}' must be an http(s) origin");
        }
        if !self.daemon.base_path.starts_with('/') {
            bail!(
                "CONFIG_INVALID: daemon.base_path '{}' must start with '/'",
                self.daemon.base_path
            );
        }
        Ok(())
    }
}
