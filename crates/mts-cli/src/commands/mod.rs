//! Command handler modules for mts-cli.
//!
//! Shared argument parsing and output helpers live here; the mount-table
//! commands live in [`mounts`].

pub mod mounts;

use anyhow::{bail, Context, Result};
use mts_reconcile::{DesiredStation, ReconcileReport, StationSpec};
use std::fs;

/// Parse `--station NAME:FMT1,FMT2` into a [`StationSpec`].
///
/// Format names are kept raw; normalization happens in the engine.
pub fn parse_station_arg(raw: &str) -> Result<StationSpec, String> {
    let Some((name, formats)) = raw.split_once(':') else {
        return Err(format!("expected NAME:FMT[,FMT...], got '{raw}'"));
    };
    let formats: Vec<&str> = formats
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect();
    if name.trim().is_empty() || formats.is_empty() {
        return Err(format!("expected NAME:FMT[,FMT...], got '{raw}'"));
    }
    Ok(StationSpec::new(name.trim(), formats))
}

/// Load the desired station snapshot for `mounts sync` from a JSON file
/// holding an array of `{ "code": "#NAME", "formats": [...] }`.
pub fn load_desired(path: &str) -> Result<Vec<DesiredStation>> {
    let bytes = fs::read(path).with_context(|| format!("read desired-json failed: {path}"))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    let v: serde_json::Value =
        serde_json::from_slice(bytes).context("desired-json must contain valid JSON")?;
    if !v.is_array() {
        bail!("desired-json must be a JSON array of stations");
    }
    serde_json::from_value(v).context("desired-json station entries are malformed")
}

/// Print a reconcile report as `key=value` lines plus one JSON line per change.
pub fn print_report(report: &ReconcileReport, written: bool) -> Result<()> {
    println!("op={}", report.op.as_str());
    println!("group={}", report.group);
    println!("changes={}", report.changes.len());
    for c in &report.changes {
        println!("change={}", serde_json::to_string(c)?);
    }
    println!("written={written}");
    Ok(())
}
