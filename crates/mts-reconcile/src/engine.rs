use mts_authfiles::{validate_group, validate_station_name, FormatKey, MountTable};

use crate::{DesiredStation, ReconcileError, ReconcileOp, ReconcileReport, StationSpec};

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

struct ValidatedStation {
    name: String,
    formats: Vec<FormatKey>,
}

fn push_format_once(formats: &mut Vec<FormatKey>, key: FormatKey) {
    if !formats.contains(&key) {
        formats.push(key);
    }
}

fn validate_grant_input(
    stations: &[StationSpec],
    group: &str,
) -> Result<Vec<ValidatedStation>, ReconcileError> {
    validate_group(group)?;
    if stations.is_empty() {
        return Err(ReconcileError::InvalidStationSpec(
            "at least one station is required".to_string(),
        ));
    }

    let mut out = Vec::with_capacity(stations.len());
    for spec in stations {
        if spec.name.trim().is_empty() || spec.formats.is_empty() {
            return Err(ReconcileError::InvalidStationSpec(format!(
                "station '{}': name and a non-empty formats list are required",
                spec.name
            )));
        }
        validate_station_name(&spec.name)?;

        let mut formats = Vec::with_capacity(spec.formats.len());
        for raw in &spec.formats {
            push_format_once(&mut formats, FormatKey::normalize(raw)?);
        }
        out.push(ValidatedStation {
            name: spec.name.trim().to_string(),
            formats,
        });
    }
    Ok(out)
}

/// True for raw format strings that carry no name at all (`""`, `"/"`, `":"`).
fn is_blank_format(raw: &str) -> bool {
    raw.trim()
        .trim_matches(|c: char| c == '/' || c == ':')
        .trim()
        .is_empty()
}

/// Merge repeated station codes (formats unioned into the first occurrence)
/// and drop blank format strings.
fn validate_desired(
    desired: &[DesiredStation],
    group: &str,
) -> Result<Vec<ValidatedStation>, ReconcileError> {
    validate_group(group)?;

    let mut merged: Vec<ValidatedStation> = Vec::new();
    for d in desired {
        let name = d.station_name();
        if name.is_empty() {
            return Err(ReconcileError::InvalidStationSpec(format!(
                "station code '{}' has no name",
                d.code
            )));
        }
        validate_station_name(name)?;

        let idx = match merged.iter().position(|v| v.name == name) {
            Some(i) => i,
            None => {
                merged.push(ValidatedStation {
                    name: name.to_string(),
                    formats: Vec::new(),
                });
                merged.len() - 1
            }
        };
        for raw in d.formats.iter().filter(|f| !is_blank_format(f)) {
            push_format_once(&mut merged[idx].formats, FormatKey::normalize(raw)?);
        }
    }
    Ok(merged)
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Attach `group` to every listed station/format pair, creating stations and
/// formats as needed.
///
/// Purely additive and idempotent: no existing membership is ever removed and
/// a second identical call reports no changes.
pub fn grant(
    table: &mut MountTable,
    stations: &[StationSpec],
    group: &str,
) -> Result<ReconcileReport, ReconcileError> {
    let validated = validate_grant_input(stations, group)?;

    let mut report = ReconcileReport::new(ReconcileOp::Grant, group);
    for st in &validated {
        for key in &st.formats {
            let outcome = table.upsert_format_group(&st.name, key.as_str(), group)?;
            report.record_upsert(&st.name, outcome);
        }
    }
    Ok(report)
}

/// Remove `group` from every format of every station, pruning formats and
/// stations left empty. Revoking an absent group is a no-op.
pub fn revoke(table: &mut MountTable, group: &str) -> Result<ReconcileReport, ReconcileError> {
    validate_group(group)?;

    let mut report = ReconcileReport::new(ReconcileOp::Revoke, group);
    for prune in table.remove_group_everywhere(group) {
        report.record_prune(prune);
    }
    Ok(report)
}

/// Converge `group` onto the complete desired station snapshot.
///
/// 1. Every desired station with at least one format gets `group` on each
///    listed format (block and format created if absent). Nothing is removed
///    from desired stations.
/// 2. Every other station in the table loses `group` from all its formats.
///    Other groups' memberships are untouched, so a block survives as long as
///    any other group still uses it.
///
/// A desired station whose format list is empty (after dropping blank
/// entries) counts as absent for step 2.
pub fn full_sync(
    table: &mut MountTable,
    desired: &[DesiredStation],
    group: &str,
) -> Result<ReconcileReport, ReconcileError> {
    let validated = validate_desired(desired, group)?;
    let present: Vec<&ValidatedStation> =
        validated.iter().filter(|v| !v.formats.is_empty()).collect();

    let mut report = ReconcileReport::new(ReconcileOp::FullSync, group);

    // 1) add
    for st in &present {
        for key in &st.formats {
            let outcome = table.upsert_format_group(&st.name, key.as_str(), group)?;
            report.record_upsert(&st.name, outcome);
        }
    }

    // 2) strip the group from stations outside the snapshot
    let absent: Vec<String> = table
        .station_names()
        .filter(|name| !present.iter().any(|p| p.name == *name))
        .map(str::to_string)
        .collect();
    for name in absent {
        if let Some(prune) = table.remove_group_from_station(&name, group) {
            if !prune.is_noop() {
                report.record_prune(prune);
            }
        }
    }

    Ok(report)
}
