use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::{record_hash, AuditRecord};

/// Why a log failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakKind {
    /// The line is not a well-formed record.
    Unparseable,
    /// `seq` does not follow the previous record's.
    SeqGap { expected: u64, found: u64 },
    /// `prev_hash` does not name the previous record.
    PrevHashMismatch,
    /// The record's own content no longer matches its `hash`.
    HashMismatch,
}

impl std::fmt::Display for BreakKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakKind::Unparseable => f.write_str("unparseable record"),
            BreakKind::SeqGap { expected, found } => {
                write!(f, "seq gap: expected {expected}, found {found}")
            }
            BreakKind::PrevHashMismatch => f.write_str("prev_hash does not match previous record"),
            BreakKind::HashMismatch => f.write_str("hash does not match record content"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    /// `line` is the 1-based file line of the first bad record.
    Broken { line: usize, kind: BreakKind },
}

pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("read audit log {path:?}"))?;
    verify_hash_chain_str(&content)
}

/// Walk every record in order. Unchained records (no `hash`) are checked for
/// `seq` continuity only.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev: Option<AuditRecord> = None;
    let mut records = 0usize;

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let Ok(rec) = serde_json::from_str::<AuditRecord>(raw) else {
            return Ok(VerifyResult::Broken {
                line,
                kind: BreakKind::Unparseable,
            });
        };

        let expected = prev.as_ref().map_or(1, |p| p.seq + 1);
        if rec.seq != expected {
            return Ok(VerifyResult::Broken {
                line,
                kind: BreakKind::SeqGap {
                    expected,
                    found: rec.seq,
                },
            });
        }

        if let Some(claimed) = &rec.hash {
            let prev_hash = prev.as_ref().and_then(|p| p.hash.clone());
            if rec.prev_hash != prev_hash {
                return Ok(VerifyResult::Broken {
                    line,
                    kind: BreakKind::PrevHashMismatch,
                });
            }
            if *claimed != record_hash(&rec)? {
                return Ok(VerifyResult::Broken {
                    line,
                    kind: BreakKind::HashMismatch,
                });
            }
        }

        records += 1;
        prev = Some(rec);
    }

    Ok(VerifyResult::Valid { lines: records })
}
