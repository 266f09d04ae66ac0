//! mts-reconcile
//!
//! Mount-table reconciliation engine.
//!
//! Operations:
//! - `grant`: attach one group to a set of station/format pairs (additive)
//! - `revoke`: strip one group from every format of every station
//! - `full_sync`: converge one group onto a complete desired station snapshot
//!
//! Every operation validates its whole input before touching the table and
//! returns a [`ReconcileReport`] of what changed, in application order.
//!
//! Deterministic, pure logic. No IO.

mod engine;
mod types;

pub use engine::{full_sync, grant, revoke};
pub use types::*;
