//! Offline mount-table commands over a caster directory.
//!
//! Each command is one fetch → transform → commit cycle on the mounts file,
//! using the same engine and commit path as the daemon. Writing commands hold
//! the directory lease for the whole cycle, so they refuse to run next to a
//! daemon serving the same directory.

use anyhow::{Context, Result};
use mts_authfiles::MountTable;
use mts_reconcile::{full_sync, grant, revoke, DesiredStation, ReconcileError, ReconcileReport, StationSpec};
use mts_store::{commit_staged, fetch_baseline, DirLease, DirTextStore, StagedWrite};
use tracing::info;

use super::print_report;

/// Where the mounts file lives and whether to write it back.
pub struct MountsTarget {
    pub store: DirTextStore,
    pub mounts_file: String,
    pub dry_run: bool,
}

impl MountsTarget {
    /// `None` under `--dry-run`, which never writes.
    fn lease(&self) -> Result<Option<DirLease>> {
        if self.dry_run {
            return Ok(None);
        }
        Ok(Some(self.store.lease("mts")?))
    }

    async fn load(&self) -> Result<(Option<String>, String)> {
        let prev = fetch_baseline(&self.store, &self.mounts_file)
            .await
            .with_context(|| format!("fetch {} failed", self.mounts_file))?;
        let text = prev.clone().unwrap_or_default();
        Ok((prev, text))
    }

    /// Commit `next` unless unchanged or `--dry-run`; returns whether it wrote.
    async fn save(&self, prev: Option<String>, next: String) -> Result<bool> {
        let write = StagedWrite::new(self.mounts_file.as_str(), prev, next);
        if self.dry_run || write.is_unchanged() {
            return Ok(false);
        }
        commit_staged(&self.store, &[write])
            .await
            .with_context(|| format!("write {} failed", self.mounts_file))?;
        Ok(true)
    }

    async fn reconcile<F>(&self, op: F) -> Result<()>
    where
        F: FnOnce(&mut MountTable) -> Result<ReconcileReport, ReconcileError>,
    {
        let _lease = self.lease()?;
        let (prev, text) = self.load().await?;
        let mut table = MountTable::parse(&text);
        let report = op(&mut table)?;
        let written = self.save(prev, table.serialize()).await?;
        info!(
            op = report.op.as_str(),
            group = %report.group,
            changes = report.changes.len(),
            written,
            "mount table reconciled"
        );
        print_report(&report, written)
    }
}

pub async fn grant_cmd(target: &MountsTarget, stations: &[StationSpec], group: &str) -> Result<()> {
    target.reconcile(|t| grant(t, stations, group)).await
}

pub async fn revoke_cmd(target: &MountsTarget, group: &str) -> Result<()> {
    target.reconcile(|t| revoke(t, group)).await
}

pub async fn sync_cmd(target: &MountsTarget, desired: &[DesiredStation], group: &str) -> Result<()> {
    target.reconcile(|t| full_sync(t, desired, group)).await
}

/// One-time rewrite of legacy format keys (`/CMRP`, `CMRP:`) into bare form,
/// merging lines that collapse onto the same key.
pub async fn normalize_cmd(target: &MountsTarget) -> Result<()> {
    let _lease = target.lease()?;
    let (prev, text) = target.load().await?;
    let (table, stats) = MountTable::parse_with_migration(&text);
    let written = target.save(prev, table.serialize()).await?;

    println!("rewritten_keys={}", stats.rewritten_keys);
    println!("merged_lines={}", stats.merged_lines);
    println!("discarded_lines={}", stats.discarded_lines);
    println!("clean={}", stats.is_clean());
    println!("written={written}");
    Ok(())
}
