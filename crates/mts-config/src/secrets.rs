//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"MTS_WEBHOOK_URL"`).
//! - At startup, callers invoke [`resolve_secrets`] once and pass the
//!   returned [`ResolvedSecrets`] into constructors.
//! - `Debug` redacts every value; errors name the variable, never its value.
//!
//! The notification webhook is optional: a configured but unset variable
//! resolves to `None`.

use anyhow::{bail, Result};

use crate::MountSyncConfig;

/// All runtime-resolved secrets for one daemon instance.
#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    /// Notification webhook URL (carries its own auth token in the path).
    pub webhook_url: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve secrets from the process environment.
pub fn resolve_secrets(config: &MountSyncConfig) -> Result<ResolvedSecrets> {
    resolve_secrets_with(config, resolve_env)
}

/// Resolve secrets through an explicit lookup (tests, alternate vaults).
pub fn resolve_secrets_with<F>(config: &MountSyncConfig, lookup: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let webhook_url = match config.notify.webhook_url_env.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(var) => match lookup(var) {
            Some(url) if url.starts_with("https://") || url.starts_with("http://") => {
                Some(url.trim().to_string())
            }
            Some(_) => bail!(
                "SECRETS_INVALID: env var '{}' (notify webhook url) is not an http(s) URL",
                var
            ),
            None => None,
        },
    };

    Ok(ResolvedSecrets { webhook_url })
}
