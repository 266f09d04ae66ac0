use mts_authfiles::{AuthFileError, FormatKey, StationPrune, UpsertOutcome};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grant input: one station and the raw format names to attach the group to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationSpec {
    pub name: String,
    pub formats: Vec<String>,
}

impl StationSpec {
    pub fn new<I, S>(name: impl Into<String>, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            formats: formats.into_iter().map(Into::into).collect(),
        }
    }
}

/// FullSync input: one station of the complete desired snapshot.
///
/// `code` is the station's `#NAME` form as held by the CRM; a bare name is
/// accepted too.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredStation {
    #[serde(alias = "station_code", alias = "stationCode")]
    pub code: String,
    #[serde(default)]
    pub formats: Vec<String>,
}

impl DesiredStation {
    pub fn new<I, S>(code: impl Into<String>, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            code: code.into(),
            formats: formats.into_iter().map(Into::into).collect(),
        }
    }

    /// Station name with the leading `#` removed.
    pub fn station_name(&self) -> &str {
        self.code.trim().trim_start_matches('#').trim()
    }
}

/// Which reconciliation produced a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOp {
    Grant,
    Revoke,
    FullSync,
}

impl ReconcileOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileOp::Grant => "grant",
            ReconcileOp::Revoke => "revoke",
            ReconcileOp::FullSync => "full_sync",
        }
    }
}

/// One observable change to the mount table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MountChange {
    StationCreated { station: String },
    GroupAdded { station: String, format: FormatKey },
    GroupRemoved { station: String, format: FormatKey },
    FormatDropped { station: String, format: FormatKey },
    StationDropped { station: String },
}

/// Full report for one operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub op: ReconcileOp,
    pub group: String,
    pub changes: Vec<MountChange>,
}

impl ReconcileReport {
    pub fn new(op: ReconcileOp, group: impl Into<String>) -> Self {
        Self {
            op,
            group: group.into(),
            changes: Vec::new(),
        }
    }

    /// True when the table was left exactly as it was.
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn count(&self, pred: impl Fn(&MountChange) -> bool) -> usize {
        self.changes.iter().filter(|c| pred(c)).count()
    }

    pub(crate) fn record_upsert(&mut self, station: &str, o: UpsertOutcome) {
        if o.station_created {
            self.changes.push(MountChange::StationCreated {
                station: station.to_string(),
            });
        }
        if o.group_added {
            self.changes.push(MountChange::GroupAdded {
                station: station.to_string(),
                format: o.key,
            });
        }
    }

    pub(crate) fn record_prune(&mut self, p: StationPrune) {
        for format in p.removed_from {
            self.changes.push(MountChange::GroupRemoved {
                station: p.station.clone(),
                format,
            });
        }
        for format in p.dropped_formats {
            self.changes.push(MountChange::FormatDropped {
                station: p.station.clone(),
                format,
            });
        }
        if p.station_dropped {
            self.changes.push(MountChange::StationDropped { station: p.station });
        }
    }
}

/// Reconciliation input rejected before the table was touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("invalid station spec: {0}")]
    InvalidStationSpec(String),

    #[error(transparent)]
    InvalidIdentifier(#[from] AuthFileError),
}
