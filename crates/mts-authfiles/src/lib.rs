//! mts-authfiles
//!
//! Codecs and in-memory models for the three caster authorization files:
//!
//! - `USERS.aut`: one `login:password` line per subscriber credential
//! - `GROUPS.aut`: one `group:login:1` line per group membership
//! - `clientmounts.aut`: `#STATION` blocks of `FORMAT:group1,group2` lines
//!
//! Deterministic, pure logic. No IO. Every model is built fresh from file text,
//! mutated in memory, and rendered back to a complete replacement text.

mod credentials;
mod error;
mod format_key;
mod groups;
mod ident;
mod mounts;

pub use credentials::{CredentialEntry, CredentialStore};
pub use error::AuthFileError;
pub use format_key::FormatKey;
pub use groups::{GroupMembership, GroupStore, MEMBERSHIP_FLAG};
pub use ident::{validate_group, validate_login, validate_password, validate_station_name};
pub use mounts::{
    FormatEntry, GroupList, MigrationStats, MountTable, StationBlock, StationPrune,
    UpsertOutcome,
};
