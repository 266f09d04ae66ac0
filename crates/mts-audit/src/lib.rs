//! mts-audit
//!
//! Append-only JSONL trail of mount-sync requests, one [`AuditRecord`] per
//! line. With chaining on, every record carries the previous record's hash
//! and a SHA-256 over its own canonical JSON, plus a gap-free `seq`, so an
//! edited, dropped, or reordered line is located by [`verify_hash_chain`].

mod record;
mod verify;
mod writer;

pub use record::{record_hash, AuditRecord, Outcome};
pub use verify::{verify_hash_chain, verify_hash_chain_str, BreakKind, VerifyResult};
pub use writer::AuditWriter;
