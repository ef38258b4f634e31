//! screener-core
//!
//! Pure domain types for the adaptive questionnaire engine and the key
//! conventions used when session snapshots are persisted. No I/O; this is
//! the shared vocabulary of the screener workspace.

pub mod error;
pub mod keys;
pub mod models;
