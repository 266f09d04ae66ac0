use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::{record_hash, AuditRecord, Outcome};

/// Appends records to one JSONL file, continuing whatever is already there.
#[derive(Debug)]
pub struct AuditWriter {
    path: PathBuf,
    chained: bool,
    next_seq: u64,
    last_hash: Option<String>,
}

impl AuditWriter {
    /// Open `path` for appending, creating parent directories as needed.
    /// An existing log's last record sets the next `seq` and chain link.
    pub fn open(path: impl AsRef<Path>, chained: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {parent:?}"))?;
        }

        let mut writer = Self {
            path,
            chained,
            next_seq: 1,
            last_hash: None,
        };
        if writer.path.exists() {
            let content = fs::read_to_string(&writer.path)
                .with_context(|| format!("read audit log {:?}", writer.path))?;
            if let Some(last) = content.lines().map(str::trim).filter(|l| !l.is_empty()).last() {
                let rec: AuditRecord =
                    serde_json::from_str(last).context("parse last audit record")?;
                writer.next_seq = rec.seq + 1;
                writer.last_hash = rec.hash;
            }
        }
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    pub fn append(
        &mut self,
        request_id: Uuid,
        operation: &str,
        outcome: Outcome,
        payload: Value,
    ) -> Result<AuditRecord> {
        let mut rec = AuditRecord {
            seq: self.next_seq,
            request_id,
            ts_utc: Utc::now(),
            operation: operation.to_string(),
            outcome,
            payload,
            prev_hash: None,
            hash: None,
        };
        if self.chained {
            rec.prev_hash = self.last_hash.clone();
            rec.hash = Some(record_hash(&rec)?);
        }

        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open audit log {:?}", self.path))?;
        writeln!(f, "{}", rec.to_line()?).context("write audit line failed")?;

        // State advances only after the line is on disk.
        self.next_seq += 1;
        if self.chained {
            self.last_hash = rec.hash.clone();
        }
        Ok(rec)
    }
}
