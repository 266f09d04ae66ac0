use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed,
}

/// One line of the audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// 1-based position in the log; resumes across restarts.
    pub seq: u64,
    pub request_id: Uuid,
    pub ts_utc: DateTime<Utc>,
    /// Workflow name, e.g. `activate`.
    pub operation: String,
    pub outcome: Outcome,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl AuditRecord {
    /// Compact single-line JSON; equal records always render to equal bytes.
    pub(crate) fn to_line(&self) -> Result<String> {
        let v = serde_json::to_value(self).context("serialize audit record failed")?;
        serde_json::to_string(&v).context("render audit record failed")
    }
}

/// SHA-256 (hex) over the canonical line of `rec` with `hash` cleared.
pub fn record_hash(rec: &AuditRecord) -> Result<String> {
    let unsealed = AuditRecord {
        hash: None,
        ..rec.clone()
    };
    let digest = Sha256::digest(unsealed.to_line()?.as_bytes());
    Ok(hex::encode(digest))
}
