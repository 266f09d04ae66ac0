//! Request and response types for all mts-daemon HTTP endpoints.
//!
//! Field names follow the CRM webhook payloads. No business logic lives here.

use mts_reconcile::{DesiredStation, MountChange, StationSpec};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GET {base}/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
    pub config_hash: String,
}

// ---------------------------------------------------------------------------
// Failure body (all routes)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    /// "validation" | "duplicate_login" | "not_found" | "lock_timeout" | "transfer"
    pub kind: String,
}

// ---------------------------------------------------------------------------
// POST {base}/activate: new subscription
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivateRequest {
    /// Receiver serial; recorded with the audit entry.
    pub serial: Option<String>,
    /// Informational only; recorded with the audit entry.
    pub tariff: Option<String>,
    pub stations: Option<Vec<StationSpec>>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateResponse {
    pub success: bool,
    pub login: String,
    pub password: String,
    pub group: String,
    pub changes: Vec<MountChange>,
}

// ---------------------------------------------------------------------------
// POST {base}/deactivate: cancelled subscription
// ---------------------------------------------------------------------------

/// Accepted from the query string and/or the JSON body; query wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeactivateRequest {
    pub login: Option<String>,
    pub group: Option<String>,
}

impl DeactivateRequest {
    pub fn merged_with(self, fallback: DeactivateRequest) -> DeactivateRequest {
        fn pick(a: Option<String>, b: Option<String>) -> Option<String> {
            a.filter(|s| !s.is_empty()).or(b.filter(|s| !s.is_empty()))
        }
        DeactivateRequest {
            login: pick(self.login, fallback.login),
            group: pick(self.group, fallback.group),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeactivateResponse {
    pub success: bool,
    pub login: String,
    pub group: String,
    pub memberships_removed: usize,
    pub changes: Vec<MountChange>,
}

// ---------------------------------------------------------------------------
// POST {base}/stations/sync: station created or edited
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncRequest {
    pub group: Option<String>,
    pub stations: Option<Vec<DesiredStation>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    pub group: String,
    pub changes: Vec<MountChange>,
}
