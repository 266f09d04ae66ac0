//! mts-daemon library target.
//!
//! Exposes the router, state, and workflows for integration tests.
//! The binary `main.rs` depends on this library target.

pub mod api_types;
pub mod credentials;
pub mod notify;
pub mod routes;
pub mod state;
pub mod workflow;
